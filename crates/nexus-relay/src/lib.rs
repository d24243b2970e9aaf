//! # Nexus Relay
//!
//! Cross-chain message relay: canonical receipts, storage proofs of where a
//! receipt sits in a source mailbox, and the Nexus state those proofs are
//! checked against.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Build receipts with fixed-width 32-byte identifiers
//! - Derive the storage slot a receipt occupies (`keccak256(abi.encode(digest, slot))`)
//! - Fetch a storage proof at a finality-safe height and encode it for the destination
//! - Push Nexus blocks and per-chain account states to a state-manager contract
//!
//! ## Chain Kinds
//!
//! | Kind | Height | Proof | Default offset |
//! |------|--------|-------|----------------|
//! | `evm-l1` | block number | Merkle-Patricia witness | 64 |
//! | `zk-rollup-l2` | settled batch number | sparse Merkle path + index | 150 |
//!
//! ## Module Structure
//!
//! ```text
//! nexus-relay/
//! ├── domain/          # ChainEntry, Receipt, StorageProof, AccountState, errors
//! ├── algorithms/      # ABI codec, slot derivation, identifier padding, proof codec
//! ├── ports/           # ChainVerifier, ProofRpc, MailboxContract, StateManagerContract
//! ├── adapters/        # JSON-RPC, Nexus HTTP, in-memory state manager, tracing sink
//! ├── application/     # ChainRegistry, StorageProofProvider, verifiers, MailboxClient, ProofManager
//! └── config.rs        # TOML config
//! ```
//!
//! The core never retries and imposes no timeouts. Callers sending from the
//! same account on the same chain serialise their own calls.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{
    HttpProofRpc, InMemoryStateManager, JsonRpcClient, NexusStateClient, RpcDialect,
    TracingErrorSink,
};
pub use algorithms::{
    calculate_storage_slot, decode_proof, encode_proof, keccak256, pad_identifier,
    receipt_digest, MESSAGES_MAPPING_SLOT,
};
pub use application::{
    ChainRegistry, EvmL1Args, EvmL1Verifier, MailboxClient, ProofArgs, ProofManager,
    StorageProofProvider, Verifier, VerifierOptions, ZkRollupArgs, ZkRollupVerifier,
};
pub use config::{ChainConfig, ConfigError, RelayConfig};
pub use domain::{
    AccountState, AccountStateResponse, Address, ChainEntry, ChainKind, EncodedProof, Hash,
    NexusBlock, NexusHeader, ProofLayout, Receipt, ReceiveStage, RegistrationPolicy,
    RelayError, StorageProof, TransactionOutcome, TxReceipt, TxStatus,
};
pub use ports::{
    AccountStateSource, ChainVerifier, ErrorSink, MailboxContract, ProofRpc, RpcStorageProof,
    StateManagerContract,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
