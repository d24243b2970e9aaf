//! EVM L1 verifier.
//!
//! Heights are block numbers. Proofs are Merkle-Patricia trie nodes, encoded
//! as the `bytes[]` witness tuple with index 0. The verifier proves receipts
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

/// Receive arguments for an EVM L1 verifier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvmL1Args {
    /// Mapping slot override; the configured slot is used when `None`.
    pub mapping_slot: Option<u64>,
    /// Storage key the caller expects the receipt to occupy, if known.
    pub storage_key: Option<Hash>,
    /// App id to deliver to. Resolved from the receipt when `None`.
    pub destination: Option<String>,
}

impl EvmL1Args {
    /// Args checked against an expected storage key.
    pub fn with_storage_key(storage_key: Hash) -> Self {
        Self {
            storage_key: Some(storage_key),
            ..Self::default()
        }
    }

    /// Deliver to `app_id` instead of resolving it from the receipt.
    pub fn to(mut self, app_id: impl Into<String>) -> Self {
        self.destination = Some(app_id.into());
        self
    }
}

/// EVM L1 verifier bound to its source chain's registry entry.
pub struct EvmL1Verifier<R: ProofRpc, M: MailboxContract> {
    entry: ChainEntry,
    provider: StorageProofProvider<R>,
    mailbox: Arc<MailboxClient<M>>,
    options: VerifierOptions,
}

impl<R: ProofRpc, M: MailboxContract> EvmL1Verifier<R, M> {
    /// Create a verifier for `entry`.
    pub fn new(
        entry: ChainEntry,
        rpc: Arc<R>,
        mailbox: Arc<MailboxClient<M>>,
        options: VerifierOptions,
    ) -> Result<Self, RelayError> {
        check_entry(&entry, ChainKind::EvmL1)?;
        Ok(Self {
            provider: StorageProofProvider::new(rpc, ChainKind::EvmL1, options.block_query_offset),
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
impl<R: ProofRpc, M: MailboxContract> ChainVerifier for EvmL1Verifier<R, M> {
    type Args = EvmL1Args;

    fn kind(&self) -> ChainKind {
        ChainKind::EvmL1
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
        args: EvmL1Args,
    ) -> Result<TransactionOutcome, RelayError> {
        let mapping_slot = args.mapping_slot.unwrap_or(self.options.mapping_slot);
        let slot = self.calculate_storage_slot(&receipt.digest(), mapping_slot);
        let result = match args.storage_key {
            Some(expected) if expected != slot => Err(RelayError::StorageKeyMismatch {
                expected: hex::encode(expected),
                derived: hex::encode(slot),
            }),
            _ => {
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
            }
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
