//! # Domain Invariants
//!
//! Rules checked before a registry entry or a proof batch is used.

use super::entities::{ChainEntry, StorageProof};
use super::errors::{Address, RelayError};

/// Maximum encoded identifier width on the wire.
pub const IDENTIFIER_WIDTH: usize = 32;

/// Invariant: an entry used in a verifier call has a non-empty endpoint and
/// both contract addresses.
pub fn invariant_entry_routable(entry: &ChainEntry) -> Result<(), RelayError> {
    if entry.app_id.trim().is_empty() {
        return Err(RelayError::InvalidChainEntry {
            app_id: entry.app_id.clone(),
            reason: "empty app id".to_string(),
        });
    }
    if entry.rpc_endpoint.trim().is_empty() {
        return Err(RelayError::InvalidChainEntry {
            app_id: entry.app_id.clone(),
            reason: "empty rpc endpoint".to_string(),
        });
    }
    invariant_mailbox_present(entry)?;
    if entry.state_manager_contract.is_none() {
        return Err(RelayError::StateManagerContractMissing(entry.app_id.clone()));
    }
    Ok(())
}

/// Invariant: the entry has a mailbox contract address.
pub fn invariant_mailbox_present(entry: &ChainEntry) -> Result<Address, RelayError> {
    entry
        .mailbox_contract
        .ok_or_else(|| RelayError::MailboxContractMissing(entry.app_id.clone()))
}

/// Invariant: every proof in a batch was generated at the same height.
pub fn invariant_single_height(proofs: &[StorageProof]) -> bool {
    proofs
        .windows(2)
        .all(|pair| pair[0].at_height == pair[1].at_height)
}
