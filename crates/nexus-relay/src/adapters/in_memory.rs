//! In-memory state manager.
//!
//! Mirrors the on-chain state manager's bookkeeping: Nexus blocks are
//! committed once per height, chain states are accepted only against a
//! committed Nexus height, and reads of unknown keys return a zeroed struct.

use crate::algorithms::keccak256;
use crate::domain::{AccountState, Address, Hash, NexusBlock, RelayError, TxReceipt};
use crate::ports::outbound::StateManagerContract;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// One accepted `updateChainState` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainStateUpdate {
    /// Nexus height.
    pub height: u64,
    /// Siblings submitted with the leaf.
    pub siblings: Vec<Hash>,
    /// Wire app id.
    pub app_id: Hash,
}

#[derive(Default)]
struct Inner {
    blocks: BTreeMap<u64, (NexusBlock, Vec<u8>)>,
    chain_states: HashMap<Hash, BTreeMap<u64, AccountState>>,
    updates: Vec<ChainStateUpdate>,
    tx_count: u64,
}

impl Inner {
    fn next_tx(&mut self) -> Hash {
        self.tx_count += 1;
        let mut preimage = b"state-manager".to_vec();
        preimage.extend_from_slice(&self.tx_count.to_be_bytes());
        keccak256(&preimage)
    }
}

/// State manager kept in process memory.
#[derive(Default)]
pub struct InMemoryStateManager {
    inner: RwLock<Inner>,
}

impl InMemoryStateManager {
    /// Create an empty state manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed Nexus block at `height`.
    pub fn nexus_block(&self, height: u64) -> Option<NexusBlock> {
        self.inner.read().blocks.get(&height).map(|(b, _)| b.clone())
    }

    /// Aggregated proof stored with the block at `height`.
    pub fn aggregated_proof(&self, height: u64) -> Option<Vec<u8>> {
        self.inner.read().blocks.get(&height).map(|(_, p)| p.clone())
    }

    /// Accepted chain-state updates, in call order.
    pub fn updates(&self) -> Vec<ChainStateUpdate> {
        self.inner.read().updates.clone()
    }
}

#[async_trait]
impl StateManagerContract for InMemoryStateManager {
    async fn update_nexus_block(
        &self,
        _contract: Address,
        height: u64,
        block: &NexusBlock,
        aggregated_proof: &[u8],
    ) -> Result<TxReceipt, RelayError> {
        let mut inner = self.inner.write();
        let tx_hash = inner.next_tx();
        if inner.blocks.contains_key(&height) {
            return Ok(TxReceipt::reverted(
                tx_hash,
                format!("nexus block {} already committed", height),
            ));
        }
        inner
            .blocks
            .insert(height, (block.clone(), aggregated_proof.to_vec()));
        Ok(TxReceipt::confirmed(tx_hash))
    }

    async fn update_chain_state(
        &self,
        _contract: Address,
        height: u64,
        siblings: &[Hash],
        app_id: Hash,
        state: &AccountState,
    ) -> Result<TxReceipt, RelayError> {
        let mut inner = self.inner.write();
        let tx_hash = inner.next_tx();
        if !inner.blocks.contains_key(&height) {
            return Ok(TxReceipt::reverted(
                tx_hash,
                format!("nexus block {} not committed", height),
            ));
        }
        inner
            .chain_states
            .entry(app_id)
            .or_default()
            .insert(height, state.clone());
        inner.updates.push(ChainStateUpdate {
            height,
            siblings: siblings.to_vec(),
            app_id,
        });
        Ok(TxReceipt::confirmed(tx_hash))
    }

    async fn get_chain_state(
        &self,
        _contract: Address,
        height: u64,
        app_id: Hash,
    ) -> Result<AccountState, RelayError> {
        let inner = self.inner.read();
        let Some(states) = inner.chain_states.get(&app_id) else {
            return Ok(AccountState::default());
        };
        let state = if height == 0 {
            states.values().next_back()
        } else {
            states.get(&height)
        };
        Ok(state.cloned().unwrap_or_default())
    }
}
