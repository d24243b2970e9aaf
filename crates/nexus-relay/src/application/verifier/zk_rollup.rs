//! zk-Rollup L2 verifier.
//!
//! Heights are settled batch numbers. Proofs are sparse Merkle paths with a
//! leaf index, encoded as the `bytes32[]` tuple. The verifier proves receipts
//! sent from its own chain and delivers them to the destination mailbox.

use super::{check_entry, prove_and_submit, VerifierOptions};
use crate::algorithms::calculate_storage_slot;
use crate::application::mailbox::MailboxClient;
use crate::application::provider::StorageProofProvider;
use crate::domain::{ChainEntry, ChainKind, Hash, Receipt, RelayError, TransactionOutcome};
use crate::ports::inbound::ChainVerifier;
use crate::ports::outbound::{MailboxContract, ProofRpc};
use async_trait::async_trait;
use std::sync::Arc;

/// Receive arguments for a zk-Rollup L2 verifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZkRollupArgs {
    /// Storage key the caller expects the receipt to occupy.
    pub storage_key: Hash,
    /// App id to deliver to. Resolved from the receipt when `None`.
    pub destination: Option<String>,
}

impl ZkRollupArgs {
    /// Args with the expected storage key and no explicit destination.
    pub fn new(storage_key: Hash) -> Self {
        Self {
            storage_key,
            destination: None,
        }
    }

    /// Deliver to `app_id` instead of resolving it from the receipt.
    pub fn to(mut self, app_id: impl Into<String>) -> Self {
        self.destination = Some(app_id.into());
        self
    }
}

/// zk-Rollup L2 verifier bound to its source chain's registry entry.
pub struct ZkRollupVerifier<R: ProofRpc, M: MailboxContract> {
    entry: ChainEntry,
    provider: StorageProofProvider<R>,
    mailbox: Arc<MailboxClient<M>>,
    options: VerifierOptions,
}

impl<R: ProofRpc, M: MailboxContract> ZkRollupVerifier<R, M> {
    /// Create a verifier for `entry`.
    pub fn new(
        entry: ChainEntry,
        rpc: Arc<R>,
        mailbox: Arc<MailboxClient<M>>,
        options: VerifierOptions,
    ) -> Result<Self, RelayError> {
        check_entry(&entry, ChainKind::ZkRollupL2)?;
        Ok(Self {
            provider: StorageProofProvider::new(
                rpc,
                ChainKind::ZkRollupL2,
                options.block_query_offset,
            ),
            entry,
            mailbox,
            options,
        })
    }

    /// Provider used for proofs.
    pub fn provider(&self) -> &StorageProofProvider<R> {
        &self.provider
    }
}

#[async_trait]
impl<R: ProofRpc, M: MailboxContract> ChainVerifier for ZkRollupVerifier<R, M> {
    type Args = ZkRollupArgs;

    fn kind(&self) -> ChainKind {
        ChainKind::ZkRollupL2
    }

    fn entry(&self) -> &ChainEntry {
        &self.entry
    }

    async fn send_message(
        &self,
        app_ids_to: &[String],
        recipients: &[String],
        nonce: u64,
        data: &[u8],
    ) -> Result<Hash, RelayError> {
        self.mailbox
            .send_message(&self.entry.app_id, app_ids_to, recipients, nonce, data)
            .await
    }

    async fn receive_message(
        &self,
        at_height: u64,
        receipt: &Receipt,
        args: ZkRollupArgs,
    ) -> Result<TransactionOutcome, RelayError> {
        let slot = self.calculate_storage_slot(&receipt.digest(), self.options.mapping_slot);
        let result = if args.storage_key != slot {
            Err(RelayError::StorageKeyMismatch {
                expected: hex::encode(args.storage_key),
                derived: hex::encode(slot),
            })
        } else {
            prove_and_submit(
                &self.entry,
                &self.provider,
                &self.mailbox,
                at_height,
                receipt,
                slot,
                args.destination.as_deref(),
            )
            .await
        };
        if let Err(e) = &result {
            self.mailbox.error_sink().report("receive_message", e);
        }
        result
    }

    fn calculate_storage_slot(&self, receipt_digest: &Hash, mapping_slot_index: u64) -> Hash {
        calculate_storage_slot(receipt_digest, mapping_slot_index)
    }
}
