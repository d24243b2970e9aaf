//! # Domain Value Objects
//!
//! Immutable value types for the relay: chain kinds, proof layouts and the
//! receive pipeline state machine.

use super::errors::{Hash, RelayError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain kind tag. Verifier dispatch is keyed on this, never on runtime type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainKind {
    /// EVM L1: heights are block numbers, proofs are Merkle-Patricia.
    EvmL1,
    /// zk-Rollup L2: heights are settled batch numbers, proofs are sparse Merkle.
    ZkRollupL2,
}

impl ChainKind {
    /// Default verification-lag offset in this kind's height units.
    ///
    /// zk-Rollup: ~30h L1 verification delay at ~12min per batch.
    /// EVM L1: two epochs of slots.
    pub fn default_block_query_offset(&self) -> u64 {
        match self {
            ChainKind::EvmL1 => 64,
            ChainKind::ZkRollupL2 => 150,
        }
    }

    /// Proof layout returned by this kind's nodes.
    pub fn proof_layout(&self) -> ProofLayout {
        match self {
            ChainKind::EvmL1 => ProofLayout::MerklePatricia,
            ChainKind::ZkRollupL2 => ProofLayout::SparseMerkle,
        }
    }

    /// What one height unit means on this chain.
    pub fn height_unit(&self) -> &'static str {
        match self {
            ChainKind::EvmL1 => "block",
            ChainKind::ZkRollupL2 => "batch",
        }
    }
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainKind::EvmL1 => write!(f, "evm-l1"),
            ChainKind::ZkRollupL2 => write!(f, "zk-rollup-l2"),
        }
    }
}

/// Shape of a storage proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProofLayout {
    /// Fixed-width 32-byte siblings plus a leaf index.
    SparseMerkle,
    /// Variable-length trie nodes, no leaf index.
    MerklePatricia,
}

/// Registry re-registration policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationPolicy {
    /// Re-registering an app id fails with `DuplicateAppId`.
    #[default]
    Reject,
    /// Re-registering replaces the existing entry.
    Overwrite,
}

/// Receive pipeline state machine.
///
/// `Requested -> ProofFetched -> Encoded -> Submitted -> {Confirmed | Reverted}`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiveStage {
    /// Call accepted, nothing fetched yet.
    #[default]
    Requested,
    /// Storage proof fetched from the source chain.
    ProofFetched,
    /// Proof packed into the wire tuple.
    Encoded,
    /// Transaction sent to the destination mailbox.
    Submitted,
    /// Destination accepted the proof.
    Confirmed,
    /// Destination reverted.
    Reverted,
}

impl ReceiveStage {
    /// Check if transition is valid.
    pub fn can_transition_to(&self, next: ReceiveStage) -> bool {
        matches!(
            (self, next),
            (Self::Requested, Self::ProofFetched)
                | (Self::ProofFetched, Self::Encoded)
                | (Self::Encoded, Self::Submitted)
                | (Self::Submitted, Self::Confirmed)
                | (Self::Submitted, Self::Reverted)
        )
    }

    /// Move to `next`, failing on an illegal transition.
    pub fn advance(self, next: ReceiveStage) -> Result<ReceiveStage, RelayError> {
        if !self.can_transition_to(next) {
            return Err(RelayError::InvalidStageTransition {
                from: format!("{:?}", self),
                to: format!("{:?}", next),
            });
        }
        Ok(next)
    }

    /// Check if terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Reverted)
    }
}

/// Status reported by a contract collaborator for a sent transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxStatus {
    /// Included and succeeded.
    Confirmed,
    /// Included and reverted, with the revert reason.
    Reverted(String),
}

/// Transaction receipt returned by contract ports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    /// Transaction hash.
    pub tx_hash: Hash,
    /// Inclusion status.
    pub status: TxStatus,
}

impl TxReceipt {
    /// Confirmed receipt.
    pub fn confirmed(tx_hash: Hash) -> Self {
        Self {
            tx_hash,
            status: TxStatus::Confirmed,
        }
    }

    /// Reverted receipt.
    pub fn reverted(tx_hash: Hash, reason: impl Into<String>) -> Self {
        Self {
            tx_hash,
            status: TxStatus::Reverted(reason.into()),
        }
    }

    /// Convert a revert into `DestinationRejected`, passing confirmations through.
    pub fn into_confirmed(self) -> Result<Hash, RelayError> {
        match self.status {
            TxStatus::Confirmed => Ok(self.tx_hash),
            TxStatus::Reverted(reason) => Err(RelayError::DestinationRejected(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_kind_offsets() {
        assert_eq!(ChainKind::ZkRollupL2.default_block_query_offset(), 150);
        assert_eq!(ChainKind::EvmL1.default_block_query_offset(), 64);
    }

    #[test]
    fn test_chain_kind_layout() {
        assert_eq!(ChainKind::EvmL1.proof_layout(), ProofLayout::MerklePatricia);
        assert_eq!(ChainKind::ZkRollupL2.proof_layout(), ProofLayout::SparseMerkle);
    }

    #[test]
    fn test_chain_kind_serde_tag() {
        let kind: ChainKind = serde_json::from_str("\"zk-rollup-l2\"").unwrap();
        assert_eq!(kind, ChainKind::ZkRollupL2);
        assert_eq!(serde_json::to_string(&ChainKind::EvmL1).unwrap(), "\"evm-l1\"");
    }

    #[test]
    fn test_receive_stage_happy_path() {
        let stage = ReceiveStage::Requested
            .advance(ReceiveStage::ProofFetched)
            .and_then(|s| s.advance(ReceiveStage::Encoded))
            .and_then(|s| s.advance(ReceiveStage::Submitted))
            .and_then(|s| s.advance(ReceiveStage::Confirmed))
            .unwrap();
        assert!(stage.is_terminal());
    }

    #[test]
    fn test_receive_stage_cannot_skip_encoding() {
        assert!(!ReceiveStage::ProofFetched.can_transition_to(ReceiveStage::Submitted));
        assert!(matches!(
            ReceiveStage::Requested.advance(ReceiveStage::Submitted),
            Err(RelayError::InvalidStageTransition { .. })
        ));
    }

    #[test]
    fn test_receive_stage_terminal() {
        assert!(ReceiveStage::Reverted.is_terminal());
        assert!(!ReceiveStage::Submitted.is_terminal());
    }

    #[test]
    fn test_reverted_receipt_is_destination_rejected() {
        let receipt = TxReceipt::reverted([1u8; 32], "nonce already used");
        assert!(matches!(
            receipt.into_confirmed(),
            Err(RelayError::DestinationRejected(reason)) if reason == "nonce already used"
        ));
    }
}
