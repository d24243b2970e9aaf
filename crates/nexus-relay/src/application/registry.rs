//! # Chain Registry
//!
//! Maps app ids to chain connection details. Read-mostly; lookups take a
//! shared lock, registration takes the write lock. Nothing is persisted.

use crate::algorithms::pad_identifier;
use crate::domain::{ChainEntry, Hash, RegistrationPolicy, RelayError};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info};

/// In-memory app id to chain entry map.
#[derive(Debug, Default)]
pub struct ChainRegistry {
    entries: RwLock<HashMap<String, ChainEntry>>,
    policy: RegistrationPolicy,
}

impl ChainRegistry {
    /// Empty registry that rejects re-registration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty registry with an explicit re-registration policy.
    pub fn with_policy(policy: RegistrationPolicy) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            policy,
        }
    }

    /// Re-registration policy in force.
    pub fn policy(&self) -> RegistrationPolicy {
        self.policy
    }

    /// Register `entry` under `app_id`.
    ///
    /// Under `Reject`, an existing `app_id` fails with `DuplicateAppId`; under
    /// `Overwrite`, the entry is replaced.
    pub fn register(&self, app_id: &str, entry: ChainEntry) -> Result<(), RelayError> {
        validate(app_id, &entry)?;

        let mut entries = self.entries.write();
        if entries.contains_key(app_id) && self.policy == RegistrationPolicy::Reject {
            return Err(RelayError::DuplicateAppId(app_id.to_string()));
        }
        info!(
            app_id,
            kind = %entry.kind,
            chain_id = %entry.native_chain_id,
            "[nexus-relay] Registered chain"
        );
        entries.insert(app_id.to_string(), entry);
        Ok(())
    }

    /// Register an entry under its own app id.
    pub fn add_chain(&self, entry: ChainEntry) -> Result<(), RelayError> {
        let app_id = entry.app_id.clone();
        self.register(&app_id, entry)
    }

    /// Replace an existing entry. Fails with `UnknownAppId` if absent.
    pub fn update_chain(&self, entry: ChainEntry) -> Result<(), RelayError> {
        validate(&entry.app_id, &entry)?;

        let mut entries = self.entries.write();
        match entries.get_mut(&entry.app_id) {
            Some(existing) => {
                debug!(app_id = %entry.app_id, "[nexus-relay] Updated chain");
                *existing = entry;
                Ok(())
            }
            None => Err(RelayError::UnknownAppId(entry.app_id)),
        }
    }

    /// Look up an entry. Fails with `UnknownAppId` if absent.
    pub fn resolve(&self, app_id: &str) -> Result<ChainEntry, RelayError> {
        self.entries
            .read()
            .get(app_id)
            .cloned()
            .ok_or_else(|| RelayError::UnknownAppId(app_id.to_string()))
    }

    /// All entries, ordered by app id.
    pub fn list(&self) -> Vec<ChainEntry> {
        let mut entries: Vec<ChainEntry> = self.entries.read().values().cloned().collect();
        entries.sort_by(|a, b| a.app_id.cmp(&b.app_id));
        entries
    }

    /// Whether `app_id` is registered.
    pub fn contains(&self, app_id: &str) -> bool {
        self.entries.read().contains_key(app_id)
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// 32-byte wire id of an app: its native chain id, left-padded.
    pub fn wire_id(&self, app_id: &str) -> Result<Hash, RelayError> {
        let entry = self.resolve(app_id)?;
        pad_identifier(&entry.native_chain_id)
    }

    /// Entries whose wire id is `wire_id`, ordered by app id.
    pub fn find_by_wire_id(&self, wire_id: &Hash) -> Vec<ChainEntry> {
        self.list()
            .into_iter()
            .filter(|entry| pad_identifier(&entry.native_chain_id).ok().as_ref() == Some(wire_id))
            .collect()
    }
}

fn validate(app_id: &str, entry: &ChainEntry) -> Result<(), RelayError> {
    let invalid = |reason: &str| RelayError::InvalidChainEntry {
        app_id: app_id.to_string(),
        reason: reason.to_string(),
    };
    if app_id.is_empty() {
        return Err(invalid("empty app id"));
    }
    if entry.app_id != app_id {
        return Err(invalid("entry app id differs from registration key"));
    }
    if entry.native_chain_id.is_empty() {
        return Err(invalid("empty native chain id"));
    }
    Ok(())
}
