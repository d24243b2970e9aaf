//! # Inbound Ports
//!
//! Capability every chain verifier variant implements.

use crate::domain::{ChainEntry, ChainKind, Hash, Receipt, RelayError, TransactionOutcome};
use async_trait::async_trait;

/// Chain verifier - inbound port.
///
/// Variants differ only in height semantics, verification-lag offset and the
/// per-proof metadata their destination expects. Each variant carries its own
/// concrete `Args` type.
#[async_trait]
pub trait ChainVerifier: Send + Sync {
    /// Chain-kind-specific receive arguments.
    type Args: Send + Sync + 'static;

    /// Kind tag of the chain this verifier proves.
    fn kind(&self) -> ChainKind;

    /// Registry entry of the source chain the verifier is bound to.
    fn entry(&self) -> &ChainEntry;

    /// Send a message with this chain as source. No proof involved.
    async fn send_message(
        &self,
        app_ids_to: &[String],
        recipients: &[String],
        nonce: u64,
        data: &[u8],
    ) -> Result<Hash, RelayError>;

    /// Prove a receipt sent from this chain at `at_height` and submit it to
    /// the destination chain's mailbox.
    async fn receive_message(
        &self,
        at_height: u64,
        receipt: &Receipt,
        args: Self::Args,
    ) -> Result<TransactionOutcome, RelayError>;

    /// Storage slot a receipt occupies in the mailbox's messages mapping.
    fn calculate_storage_slot(&self, receipt_digest: &Hash, mapping_slot_index: u64) -> Hash;
}
