//! # Domain Errors
//!
//! Error types for the cross-chain relay.
//!
//! Registry, encoding and slot-derivation failures are local to the call.
//! Network failures are surfaced un-retried; retry policy belongs to callers.

use thiserror::Error;

/// Hash type (32-byte word: digests, storage keys, padded identifiers).
pub type Hash = [u8; 32];

/// Address type (20-byte EVM account).
pub type Address = [u8; 20];

/// Relay error types.
#[derive(Debug, Error)]
pub enum RelayError {
    /// App id has no registry entry.
    #[error("Unknown app id: {0}")]
    UnknownAppId(String),

    /// App id already registered and the registry rejects re-registration.
    #[error("Duplicate app id: {0}")]
    DuplicateAppId(String),

    /// Resolved entry has no mailbox contract address.
    #[error("Mailbox contract missing for app id: {0}")]
    MailboxContractMissing(String),

    /// Resolved entry has no state-manager contract address.
    #[error("State manager contract missing for app id: {0}")]
    StateManagerContractMissing(String),

    /// Entry cannot be used for verifier calls.
    #[error("Invalid chain entry {app_id}: {reason}")]
    InvalidChainEntry {
        /// App id of the entry
        app_id: String,
        /// What is wrong with it
        reason: String,
    },

    /// Identifier does not fit in 32 bytes after encoding.
    #[error("Identifier too long: {identifier} encodes to {len} bytes (max 32)")]
    IdentifierTooLong {
        /// The identifier as given
        identifier: String,
        /// Encoded byte length
        len: usize,
    },

    /// Identifier is empty or not valid hex.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Upstream node could not produce a proof.
    #[error("Proof unavailable at height {height}: {reason}")]
    ProofUnavailable {
        /// Height the proof was requested at
        height: u64,
        /// Upstream failure
        reason: String,
    },

    /// Upstream proof response did not match the expected schema.
    #[error("Malformed proof response: {0}")]
    MalformedProofResponse(String),

    /// Verifier could not produce a proof for a receipt.
    #[error("Proof not found for {app_id} at height {height}: {reason}")]
    ProofNotFound {
        /// Chain the proof was requested from
        app_id: String,
        /// Requested height
        height: u64,
        /// Underlying cause
        reason: String,
    },

    /// Caller-supplied storage key disagrees with the derived slot.
    #[error("Storage key mismatch: expected {expected}, derived {derived}")]
    StorageKeyMismatch {
        /// Key supplied by the caller
        expected: String,
        /// Slot derived from the receipt
        derived: String,
    },

    /// The chain a receipt should be delivered to could not be determined.
    #[error("Unresolved destination: {0}")]
    UnresolvedDestination(String),

    /// Proof args variant does not match the verifier's chain kind.
    #[error("Proof args for {args} given to {kind} verifier")]
    ProofArgsMismatch {
        /// Verifier chain kind
        kind: String,
        /// Args chain kind
        args: String,
    },

    /// Wire bytes could not be decoded.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Receive pipeline attempted an illegal stage transition.
    #[error("Invalid stage transition: {from} -> {to}")]
    InvalidStageTransition {
        /// Current stage
        from: String,
        /// Attempted stage
        to: String,
    },

    /// Aggregation endpoint could not be reached.
    #[error("Aggregation unreachable: {0}")]
    AggregationUnreachable(String),

    /// Aggregation endpoint returned an unexpected payload.
    #[error("Malformed aggregation response: {0}")]
    MalformedAggregationResponse(String),

    /// Destination contract reverted the transaction.
    #[error("Destination rejected: {0}")]
    DestinationRejected(String),

    /// Contract transport failed before the transaction reached the chain.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl RelayError {
    /// Whether the failure came from the network rather than the input.
    ///
    /// The core never retries; callers may use this to decide whether to.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::ProofUnavailable { .. } | Self::AggregationUnreachable(_) | Self::Transport(_)
        )
    }
}
