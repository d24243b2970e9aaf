//! # Outbound Ports
//!
//! Traits for external collaborators: chain nodes, contracts, the Nexus
//! aggregation service and error reporting.

use crate::algorithms::keccak256;
use crate::domain::{
    AccountState, AccountStateResponse, Address, Hash, NexusBlock, Receipt, RelayError, TxReceipt,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// One storage proof as returned by a node, before normalisation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcStorageProof {
    /// Storage key the proof is for.
    pub key: Hash,
    /// Slot value.
    pub value: Hash,
    /// Proof nodes in node order (32-byte siblings or raw trie nodes).
    pub proof: Vec<Vec<u8>>,
    /// Leaf index, when the chain reports one.
    pub index: Option<u64>,
}

/// Proof RPC - outbound port.
///
/// Method names are chain-specific; implementations normalise responses.
#[async_trait]
pub trait ProofRpc: Send + Sync {
    /// Latest height proofs may be requested at (block or finalized batch).
    async fn latest_height(&self) -> Result<u64, RelayError>;

    /// Proofs for `keys` of `account` at `height`.
    async fn get_proof(
        &self,
        account: Address,
        keys: &[Hash],
        height: u64,
    ) -> Result<Vec<RpcStorageProof>, RelayError>;
}

/// Mailbox contract - outbound port.
#[async_trait]
pub trait MailboxContract: Send + Sync {
    /// `sendMessage(appIdTo[], to[], nonce, data)` on `mailbox`.
    async fn send_message(
        &self,
        mailbox: Address,
        app_ids_to: &[Hash],
        recipients: &[Hash],
        nonce: u64,
        data: &[u8],
    ) -> Result<TxReceipt, RelayError>;

    /// `receiveMessage(height, receipt, encodedProof)` on `mailbox`.
    async fn receive_message(
        &self,
        mailbox: Address,
        height: u64,
        receipt: &Receipt,
        encoded_proof: &[u8],
    ) -> Result<TxReceipt, RelayError>;
}

/// State-manager contract - outbound port.
#[async_trait]
pub trait StateManagerContract: Send + Sync {
    /// `updateNexusBlock(height, {stateRoot, blockHash})`.
    async fn update_nexus_block(
        &self,
        contract: Address,
        height: u64,
        block: &NexusBlock,
        aggregated_proof: &[u8],
    ) -> Result<TxReceipt, RelayError>;

    /// `updateChainState(height, siblings[], appId, accountState)`.
    async fn update_chain_state(
        &self,
        contract: Address,
        height: u64,
        siblings: &[Hash],
        app_id: Hash,
        state: &AccountState,
    ) -> Result<TxReceipt, RelayError>;

    /// `getChainState(height, appId)`. Height 0 means latest, resolved contract-side.
    async fn get_chain_state(
        &self,
        contract: Address,
        height: u64,
        app_id: Hash,
    ) -> Result<AccountState, RelayError>;
}

/// Off-chain source of account leaves and their Nexus proofs - outbound port.
#[async_trait]
pub trait AccountStateSource: Send + Sync {
    /// Current account leaf and proof for `app_id`.
    async fn get_account_state(&self, app_id: &str) -> Result<AccountStateResponse, RelayError>;
}

/// Error reporting sink - outbound port.
pub trait ErrorSink: Send + Sync {
    /// Report a failed operation.
    fn report(&self, operation: &str, error: &RelayError);
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Recorded `get_proof` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofRequest {
    /// Account queried.
    pub account: Address,
    /// Keys queried.
    pub keys: Vec<Hash>,
    /// Height queried.
    pub height: u64,
}

/// Mock proof RPC for testing.
///
/// Returns deterministic sparse proofs: value `1`, siblings `[i + 1; 32]`.
pub struct MockProofRpc {
    /// Latest height reported by the next `latest_height` call.
    pub latest: AtomicU64,
    /// Amount `latest` grows after each `latest_height` call.
    pub advance_per_query: u64,
    /// Siblings per proof.
    pub siblings: usize,
    /// Leaf index reported.
    pub index: u64,
    /// Return trie nodes without an index instead of sparse siblings.
    pub patricia: bool,
    /// Return a 31-byte sibling.
    pub malformed: bool,
    /// Answer successfully but leave out the requested keys.
    pub omit_keys: bool,
    /// Fail every `get_proof` with this reason.
    pub fail_with: Option<String>,
    /// Recorded requests.
    pub requests: Mutex<Vec<ProofRequest>>,
    /// Number of `latest_height` calls.
    pub latest_calls: AtomicUsize,
}

impl MockProofRpc {
    /// Mock whose chain reports `latest` as its latest height.
    pub fn with_latest(latest: u64) -> Self {
        Self {
            latest: AtomicU64::new(latest),
            advance_per_query: 0,
            siblings: 3,
            index: 7,
            patricia: false,
            malformed: false,
            omit_keys: false,
            fail_with: None,
            requests: Mutex::new(Vec::new()),
            latest_calls: AtomicUsize::new(0),
        }
    }

    /// Recorded requests so far.
    pub fn recorded(&self) -> Vec<ProofRequest> {
        self.requests.lock().clone()
    }

    /// Value word the mock reports for every slot.
    pub fn value_word() -> Hash {
        let mut value = [0u8; 32];
        value[31] = 1;
        value
    }
}

impl Default for MockProofRpc {
    fn default() -> Self {
        Self::with_latest(1000)
    }
}

#[async_trait]
impl ProofRpc for MockProofRpc {
    async fn latest_height(&self) -> Result<u64, RelayError> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .latest
            .fetch_add(self.advance_per_query, Ordering::SeqCst))
    }

    async fn get_proof(
        &self,
        account: Address,
        keys: &[Hash],
        height: u64,
    ) -> Result<Vec<RpcStorageProof>, RelayError> {
        self.requests.lock().push(ProofRequest {
            account,
            keys: keys.to_vec(),
            height,
        });

        if let Some(reason) = &self.fail_with {
            return Err(RelayError::ProofUnavailable {
                height,
                reason: reason.clone(),
            });
        }

        if self.omit_keys {
            return Ok(Vec::new());
        }

        Ok(keys
            .iter()
            .map(|key| {
                let proof = if self.patricia {
                    vec![vec![0xf8; 83], key[..8].to_vec()]
                } else {
                    (0..self.siblings)
                        .map(|i| {
                            let width = if self.malformed && i == 0 { 31 } else { 32 };
                            vec![(i + 1) as u8; width]
                        })
                        .collect()
                };
                RpcStorageProof {
                    key: *key,
                    value: Self::value_word(),
                    proof,
                    index: if self.patricia { None } else { Some(self.index) },
                }
            })
            .collect())
    }
}

/// Recorded `sendMessage` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMessage {
    /// Mailbox called.
    pub mailbox: Address,
    /// Destination wire ids.
    pub app_ids_to: Vec<Hash>,
    /// Recipient words.
    pub recipients: Vec<Hash>,
    /// Nonce.
    pub nonce: u64,
    /// Payload.
    pub data: Vec<u8>,
}

/// Recorded `receiveMessage` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedMessage {
    /// Mailbox called.
    pub mailbox: Address,
    /// Proof height.
    pub height: u64,
    /// Receipt submitted.
    pub receipt: Receipt,
    /// Encoded proof bytes submitted.
    pub encoded_proof: Vec<u8>,
}

/// Mock mailbox contract for testing.
#[derive(Default)]
pub struct MockMailboxContract {
    /// Revert every call with this reason.
    pub revert_reason: Option<String>,
    /// Fail every call before reaching the chain.
    pub fail_transport: bool,
    /// Recorded sends.
    pub sent: Mutex<Vec<SentMessage>>,
    /// Recorded receives.
    pub received: Mutex<Vec<ReceivedMessage>>,
    /// Total calls (including failed ones).
    pub calls: AtomicUsize,
}

impl MockMailboxContract {
    fn outcome(&self) -> Result<TxReceipt, RelayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) as u64;
        if self.fail_transport {
            return Err(RelayError::Transport("Mock failure".to_string()));
        }
        let tx_hash = keccak256(&n.to_be_bytes());
        Ok(match &self.revert_reason {
            Some(reason) => TxReceipt::reverted(tx_hash, reason.clone()),
            None => TxReceipt::confirmed(tx_hash),
        })
    }

    /// Total calls made.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailboxContract for MockMailboxContract {
    async fn send_message(
        &self,
        mailbox: Address,
        app_ids_to: &[Hash],
        recipients: &[Hash],
        nonce: u64,
        data: &[u8],
    ) -> Result<TxReceipt, RelayError> {
        let outcome = self.outcome()?;
        self.sent.lock().push(SentMessage {
            mailbox,
            app_ids_to: app_ids_to.to_vec(),
            recipients: recipients.to_vec(),
            nonce,
            data: data.to_vec(),
        });
        Ok(outcome)
    }

    async fn receive_message(
        &self,
        mailbox: Address,
        height: u64,
        receipt: &Receipt,
        encoded_proof: &[u8],
    ) -> Result<TxReceipt, RelayError> {
        let outcome = self.outcome()?;
        self.received.lock().push(ReceivedMessage {
            mailbox,
            height,
            receipt: receipt.clone(),
            encoded_proof: encoded_proof.to_vec(),
        });
        Ok(outcome)
    }
}

/// Mock account-state source for testing.
pub struct MockAccountStateSource {
    /// Response returned for any app id.
    pub response: Option<AccountStateResponse>,
    /// App ids queried.
    pub queried: Mutex<Vec<String>>,
}

impl MockAccountStateSource {
    /// Source that always returns `response`.
    pub fn returning(response: AccountStateResponse) -> Self {
        Self {
            response: Some(response),
            queried: Mutex::new(Vec::new()),
        }
    }

    /// Source that is always unreachable.
    pub fn unreachable() -> Self {
        Self {
            response: None,
            queried: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AccountStateSource for MockAccountStateSource {
    async fn get_account_state(&self, app_id: &str) -> Result<AccountStateResponse, RelayError> {
        self.queried.lock().push(app_id.to_string());
        self.response
            .clone()
            .ok_or_else(|| RelayError::AggregationUnreachable("Mock failure".to_string()))
    }
}

/// Error sink that keeps every report.
#[derive(Default)]
pub struct CollectingErrorSink {
    /// `(operation, error message)` pairs.
    pub reports: Mutex<Vec<(String, String)>>,
}

impl CollectingErrorSink {
    /// Operations reported so far.
    pub fn operations(&self) -> Vec<String> {
        self.reports.lock().iter().map(|(op, _)| op.clone()).collect()
    }
}

impl ErrorSink for CollectingErrorSink {
    fn report(&self, operation: &str, error: &RelayError) {
        self.reports
            .lock()
            .push((operation.to_string(), error.to_string()));
    }
}
