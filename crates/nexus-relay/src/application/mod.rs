//! # Application Module
//!
//! Services orchestrating the domain and the outbound ports.

pub mod mailbox;
pub mod proof_manager;
pub mod provider;
pub mod registry;
pub mod verifier;

pub use mailbox::MailboxClient;
pub use proof_manager::{ProofManager, LATEST_HEIGHT};
pub use provider::StorageProofProvider;
pub use registry::ChainRegistry;
pub use verifier::{
    EvmL1Args, EvmL1Verifier, ProofArgs, Verifier, VerifierOptions, ZkRollupArgs,
    ZkRollupVerifier,
};
