//! # Proof Manager
//!
//! Pushes Nexus commitments and per-chain account states to one destination
//! chain's state-manager contract, and reads committed state back.

use crate::algorithms::pad_identifier;
use crate::application::registry::ChainRegistry;
use crate::domain::hex::strip_0x;
use crate::domain::{AccountState, Address, Hash, NexusBlock, RelayError};
use crate::ports::outbound::{AccountStateSource, ErrorSink, StateManagerContract};
use std::sync::Arc;
use tracing::{debug, info};

/// Height sentinel meaning "latest known to the contract".
pub const LATEST_HEIGHT: u64 = 0;

/// Nexus account ids are hex; the contract takes them as a 32-byte word.
fn nexus_account_id(app_id: &str) -> Result<Hash, RelayError> {
    pad_identifier(&format!("0x{}", strip_0x(app_id)))
}

/// State-manager client bound to one destination chain.
pub struct ProofManager<S: StateManagerContract> {
    app_id: String,
    contract_address: Address,
    contract: Arc<S>,
    sink: Arc<dyn ErrorSink>,
}

impl<S: StateManagerContract> ProofManager<S> {
    /// Bind to the state manager of `app_id`'s chain.
    ///
    /// Fails with `StateManagerContractMissing` if the entry has none.
    pub fn new(
        registry: &ChainRegistry,
        app_id: &str,
        contract: Arc<S>,
        sink: Arc<dyn ErrorSink>,
    ) -> Result<Self, RelayError> {
        let entry = registry.resolve(app_id)?;
        let contract_address = entry
            .state_manager_contract
            .ok_or_else(|| RelayError::StateManagerContractMissing(app_id.to_string()))?;
        Ok(Self {
            app_id: entry.app_id,
            contract_address,
            contract,
            sink,
        })
    }

    /// App id of the destination chain.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// State-manager address on the destination chain.
    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    fn reported<T>(&self, operation: &str, result: Result<T, RelayError>) -> Result<T, RelayError> {
        if let Err(e) = &result {
            self.sink.report(operation, e);
        }
        result
    }

    /// Submit Nexus's own commitment at `height`. Duplicate heights are the
    /// contract's to reject.
    pub async fn update_nexus_block(
        &self,
        height: u64,
        state_root: Hash,
        block_hash: Hash,
        aggregated_proof: &[u8],
    ) -> Result<Hash, RelayError> {
        let block = NexusBlock {
            state_root,
            block_hash,
        };
        let result = async {
            let tx = self
                .contract
                .update_nexus_block(self.contract_address, height, &block, aggregated_proof)
                .await?
                .into_confirmed()?;
            info!(
                app_id = %self.app_id,
                height,
                state_root = %hex::encode(state_root),
                "[nexus-relay] Nexus block committed"
            );
            Ok::<_, RelayError>(tx)
        }
        .await;
        self.reported("update_nexus_block", result)
    }

    /// Submit one chain's account leaf and its siblings against the Nexus
    /// root committed at `height`.
    pub async fn update_chain_state(
        &self,
        height: u64,
        siblings: &[Hash],
        app_id: &str,
        state: &AccountState,
    ) -> Result<Hash, RelayError> {
        let result = async {
            let account_id = nexus_account_id(app_id)?;
            debug!(
                account = %app_id,
                height,
                siblings = siblings.len(),
                "[nexus-relay] Submitting chain state"
            );
            let tx = self
                .contract
                .update_chain_state(self.contract_address, height, siblings, account_id, state)
                .await?
                .into_confirmed()?;
            info!(
                app_id = %self.app_id,
                account = %app_id,
                chain_height = state.height,
                "[nexus-relay] Chain state committed"
            );
            Ok::<_, RelayError>(tx)
        }
        .await;
        self.reported("update_chain_state", result)
    }

    /// Committed state of `app_id`. `None` reads the latest, resolved by the
    /// contract.
    pub async fn get_chain_state(
        &self,
        app_id: &str,
        height: Option<u64>,
    ) -> Result<AccountState, RelayError> {
        let result = async {
            let account_id = nexus_account_id(app_id)?;
            self.contract
                .get_chain_state(
                    self.contract_address,
                    height.unwrap_or(LATEST_HEIGHT),
                    account_id,
                )
                .await
        }
        .await;
        self.reported("get_chain_state", result)
    }

    /// Fetch `app_id`'s account leaf from the aggregation service and submit
    /// it at the height of the Nexus header it was proven against.
    ///
    /// The Nexus block at that height must already be committed.
    pub async fn sync_chain_state<A: AccountStateSource + ?Sized>(
        &self,
        source: &A,
        app_id: &str,
    ) -> Result<Hash, RelayError> {
        let response = match source.get_account_state(app_id).await {
            Ok(response) => response,
            Err(e) => return self.reported("sync_chain_state", Err(e)),
        };
        debug!(
            account = %app_id,
            chain_height = response.chain_state_number,
            height = response.nexus_header.number,
            "[nexus-relay] Account state fetched"
        );
        self.update_chain_state(
            response.nexus_header.number,
            &response.proof,
            app_id,
            &response.account,
        )
        .await
    }
}
