//! # Chain Verifiers
//!
//! One variant per chain kind, all implementing [`ChainVerifier`]. Variants
//! share the receive pipeline below and differ only in height semantics,
//! verification-lag offset and proof layout.
//!
//! ```text
//! Requested -> ProofFetched -> Encoded -> Submitted -> Confirmed | Reverted
//! ```

pub mod evm_l1;
pub mod zk_rollup;

pub use evm_l1::{EvmL1Args, EvmL1Verifier};
pub use zk_rollup::{ZkRollupArgs, ZkRollupVerifier};

use crate::algorithms::{encode_proof, MESSAGES_MAPPING_SLOT};
use crate::application::mailbox::MailboxClient;
use crate::application::provider::StorageProofProvider;
use crate::domain::{
    invariant_entry_routable, invariant_mailbox_present, ChainEntry, ChainKind, Hash, Receipt,
    ReceiveStage, RelayError, TransactionOutcome, TxStatus,
};
use crate::ports::inbound::ChainVerifier;
use crate::ports::outbound::{MailboxContract, ProofRpc};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-verifier tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierOptions {
    /// Height units subtracted from latest when no height is given.
    pub block_query_offset: u64,
    /// Storage slot of the mailbox's messages mapping.
    pub mapping_slot: u64,
}

impl VerifierOptions {
    /// Defaults for a chain kind.
    pub fn for_kind(kind: ChainKind) -> Self {
        Self {
            block_query_offset: kind.default_block_query_offset(),
            mapping_slot: MESSAGES_MAPPING_SLOT,
        }
    }
}

/// Receive arguments for any chain kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProofArgs {
    /// Arguments for an EVM L1 verifier.
    EvmL1(EvmL1Args),
    /// Arguments for a zk-Rollup L2 verifier.
    ZkRollup(ZkRollupArgs),
}

impl ProofArgs {
    /// Chain kind these args belong to.
    pub fn kind(&self) -> ChainKind {
        match self {
            ProofArgs::EvmL1(_) => ChainKind::EvmL1,
            ProofArgs::ZkRollup(_) => ChainKind::ZkRollupL2,
        }
    }
}

/// Check that `entry` is usable by a verifier of `kind`.
fn check_entry(entry: &ChainEntry, kind: ChainKind) -> Result<(), RelayError> {
    if entry.kind != kind {
        return Err(RelayError::InvalidChainEntry {
            app_id: entry.app_id.clone(),
            reason: format!("entry is {}, verifier is {}", entry.kind, kind),
        });
    }
    invariant_entry_routable(entry)
}

/// Shared receive pipeline: prove `slot` in the source mailbox's storage at
/// `at_height`, encode, submit to the destination mailbox.
///
/// `source` is the chain the verifier is bound to; the proof is always read
/// from its mailbox through its provider. The destination is `destination`
/// when given, otherwise the single registered chain the receipt addresses.
pub(crate) async fn prove_and_submit<R: ProofRpc, M: MailboxContract>(
    source: &ChainEntry,
    provider: &StorageProofProvider<R>,
    mailbox: &MailboxClient<M>,
    at_height: u64,
    receipt: &Receipt,
    slot: Hash,
    destination: Option<&str>,
) -> Result<TransactionOutcome, RelayError> {
    let mut stage = ReceiveStage::Requested;
    let account = invariant_mailbox_present(source)?;
    let target = mailbox.resolve_destination(receipt, destination)?;

    let proof = provider
        .get_proof(account, slot, Some(at_height))
        .await
        .map_err(|e| match e {
            RelayError::ProofUnavailable { reason, .. } => RelayError::ProofNotFound {
                app_id: source.app_id.clone(),
                height: at_height,
                reason,
            },
            other => other,
        })?;
    stage = stage.advance(ReceiveStage::ProofFetched)?;
    debug!(
        app_id = %source.app_id,
        height = at_height,
        slot = %hex::encode(slot),
        "[nexus-relay] Proof fetched"
    );

    let encoded = encode_proof(&proof, at_height, provider.layout());
    stage = stage.advance(ReceiveStage::Encoded)?;

    let tx = mailbox
        .submit(&target.app_id, at_height, receipt, &encoded)
        .await?;
    stage = stage.advance(ReceiveStage::Submitted)?;

    match tx.status {
        TxStatus::Confirmed => {
            stage = stage.advance(ReceiveStage::Confirmed)?;
            info!(
                source = %source.app_id,
                app_id = %target.app_id,
                nonce = receipt.nonce(),
                height = at_height,
                tx = %hex::encode(tx.tx_hash),
                "[nexus-relay] Receipt accepted"
            );
            Ok(TransactionOutcome {
                tx_hash: tx.tx_hash,
                app_id: target.app_id,
                at_height,
                storage_slot: slot,
                stage,
            })
        }
        TxStatus::Reverted(reason) => {
            stage.advance(ReceiveStage::Reverted)?;
            warn!(
                source = %source.app_id,
                app_id = %target.app_id,
                nonce = receipt.nonce(),
                height = at_height,
                %reason,
                "[nexus-relay] Receipt reverted"
            );
            Err(RelayError::DestinationRejected(reason))
        }
    }
}

/// Verifier for any registered chain, dispatched on `ChainEntry::kind`.
pub enum Verifier<R: ProofRpc, M: MailboxContract> {
    /// EVM L1 variant.
    EvmL1(EvmL1Verifier<R, M>),
    /// zk-Rollup L2 variant.
    ZkRollup(ZkRollupVerifier<R, M>),
}

impl<R: ProofRpc, M: MailboxContract> Verifier<R, M> {
    /// Build the variant matching `entry.kind`.
    pub fn for_entry(
        entry: ChainEntry,
        rpc: Arc<R>,
        mailbox: Arc<MailboxClient<M>>,
        options: VerifierOptions,
    ) -> Result<Self, RelayError> {
        Ok(match entry.kind {
            ChainKind::EvmL1 => Verifier::EvmL1(EvmL1Verifier::new(entry, rpc, mailbox, options)?),
            ChainKind::ZkRollupL2 => {
                Verifier::ZkRollup(ZkRollupVerifier::new(entry, rpc, mailbox, options)?)
            }
        })
    }
}

#[async_trait]
impl<R: ProofRpc, M: MailboxContract> ChainVerifier for Verifier<R, M> {
    type Args = ProofArgs;

    fn kind(&self) -> ChainKind {
        match self {
            Verifier::EvmL1(v) => v.kind(),
            Verifier::ZkRollup(v) => v.kind(),
        }
    }

    fn entry(&self) -> &ChainEntry {
        match self {
            Verifier::EvmL1(v) => v.entry(),
            Verifier::ZkRollup(v) => v.entry(),
        }
    }

    async fn send_message(
        &self,
        app_ids_to: &[String],
        recipients: &[String],
        nonce: u64,
        data: &[u8],
    ) -> Result<Hash, RelayError> {
        match self {
            Verifier::EvmL1(v) => v.send_message(app_ids_to, recipients, nonce, data).await,
            Verifier::ZkRollup(v) => v.send_message(app_ids_to, recipients, nonce, data).await,
        }
    }

    async fn receive_message(
        &self,
        at_height: u64,
        receipt: &Receipt,
        args: ProofArgs,
    ) -> Result<TransactionOutcome, RelayError> {
        match (self, args) {
            (Verifier::EvmL1(v), ProofArgs::EvmL1(args)) => {
                v.receive_message(at_height, receipt, args).await
            }
            (Verifier::ZkRollup(v), ProofArgs::ZkRollup(args)) => {
                v.receive_message(at_height, receipt, args).await
            }
            (verifier, args) => Err(RelayError::ProofArgsMismatch {
                kind: verifier.kind().to_string(),
                args: args.kind().to_string(),
            }),
        }
    }

    fn calculate_storage_slot(&self, receipt_digest: &Hash, mapping_slot_index: u64) -> Hash {
        match self {
            Verifier::EvmL1(v) => v.calculate_storage_slot(receipt_digest, mapping_slot_index),
            Verifier::ZkRollup(v) => v.calculate_storage_slot(receipt_digest, mapping_slot_index),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::harness;
    use super::*;
    use crate::algorithms::calculate_storage_slot;
    use crate::ports::outbound::{MockMailboxContract, MockProofRpc};

    #[test]
    fn test_options_defaults() {
        assert_eq!(VerifierOptions::for_kind(ChainKind::ZkRollupL2).block_query_offset, 150);
        assert_eq!(VerifierOptions::for_kind(ChainKind::EvmL1).block_query_offset, 64);
        assert_eq!(VerifierOptions::for_kind(ChainKind::EvmL1).mapping_slot, 0);
    }

    #[test]
    fn test_dispatch_by_kind() {
        let h = harness(MockMailboxContract::default(), MockProofRpc::default());
        for (app, kind) in [("a", ChainKind::EvmL1), ("b", ChainKind::ZkRollupL2)] {
            let entry = h.registry.resolve(app).unwrap();
            let verifier =
                Verifier::for_entry(entry, h.rpc.clone(), h.mailbox.clone(), VerifierOptions::for_kind(kind))
                    .unwrap();
            assert_eq!(verifier.kind(), kind);
            assert_eq!(verifier.entry().app_id, app);
        }
    }

    #[tokio::test]
    async fn test_mismatched_args_rejected_before_network() {
        let h = harness(MockMailboxContract::default(), MockProofRpc::default());
        let entry = h.registry.resolve("b").unwrap();
        let verifier = Verifier::for_entry(
            entry,
            h.rpc.clone(),
            h.mailbox.clone(),
            VerifierOptions::for_kind(ChainKind::ZkRollupL2),
        )
        .unwrap();
        let result = verifier
            .receive_message(850, &h.receipt(), ProofArgs::EvmL1(EvmL1Args::default()))
            .await;
        assert!(matches!(result, Err(RelayError::ProofArgsMismatch { .. })));
        assert!(h.rpc.recorded().is_empty());
        assert_eq!(h.contract.call_count(), 0);
    }

    #[test]
    fn test_dispatched_slot_matches_pure_function() {
        let h = harness(MockMailboxContract::default(), MockProofRpc::default());
        let verifier = Verifier::for_entry(
            h.registry.resolve("a").unwrap(),
            h.rpc.clone(),
            h.mailbox.clone(),
            VerifierOptions::for_kind(ChainKind::EvmL1),
        )
        .unwrap();
        let digest = h.receipt().digest();
        assert_eq!(
            verifier.calculate_storage_slot(&digest, 3),
            calculate_storage_slot(&digest, 3)
        );
    }
}
