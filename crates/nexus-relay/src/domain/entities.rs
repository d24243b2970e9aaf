//! # Domain Entities
//!
//! Core entities for the relay: registry entries, receipts, storage proofs
//! and the Nexus account state.

use super::errors::{Address, Hash};
use super::hex::{serde_hash, serde_hash_vec, serde_opt_address};
use super::value_objects::{ChainKind, ProofLayout, ReceiveStage};
use serde::{Deserialize, Serialize};

/// Connection details for one registered app.
///
/// Owned by the registry; changed only through `register` / `update_chain`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEntry {
    /// Logical application identifier (registry key).
    pub app_id: String,
    /// Chain kind tag used for verifier dispatch.
    pub kind: ChainKind,
    /// JSON-RPC endpoint of the chain node.
    pub rpc_endpoint: String,
    /// Mailbox contract address.
    #[serde(default, with = "serde_opt_address")]
    pub mailbox_contract: Option<Address>,
    /// State-manager contract address.
    #[serde(default, with = "serde_opt_address")]
    pub state_manager_contract: Option<Address>,
    /// Native chain identifier (padded into receipts as the wire id).
    pub native_chain_id: String,
}

impl ChainEntry {
    /// Create an entry with both contract addresses set.
    pub fn new(
        app_id: impl Into<String>,
        kind: ChainKind,
        rpc_endpoint: impl Into<String>,
        mailbox_contract: Address,
        state_manager_contract: Address,
        native_chain_id: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            kind,
            rpc_endpoint: rpc_endpoint.into(),
            mailbox_contract: Some(mailbox_contract),
            state_manager_contract: Some(state_manager_contract),
            native_chain_id: native_chain_id.into(),
        }
    }
}

/// Cross-chain message receipt.
///
/// All identifier fields are 32-byte left-padded words. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(with = "serde_hash")]
    app_id_from: Hash,
    #[serde(with = "serde_hash_vec")]
    app_id_to: Vec<Hash>,
    data: Vec<u8>,
    #[serde(with = "serde_hash")]
    from: Hash,
    #[serde(with = "serde_hash_vec")]
    to: Vec<Hash>,
    nonce: u64,
}

impl Receipt {
    /// Build from already-padded words.
    pub fn new(
        app_id_from: Hash,
        app_id_to: Vec<Hash>,
        data: Vec<u8>,
        from: Hash,
        to: Vec<Hash>,
        nonce: u64,
    ) -> Self {
        Self {
            app_id_from,
            app_id_to,
            data,
            from,
            to,
            nonce,
        }
    }

    /// Origin app wire id.
    pub fn app_id_from(&self) -> &Hash {
        &self.app_id_from
    }

    /// Destination app wire ids.
    pub fn app_id_to(&self) -> &[Hash] {
        &self.app_id_to
    }

    /// Message payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Sender word.
    pub fn from(&self) -> &Hash {
        &self.from
    }

    /// Recipient words.
    pub fn to(&self) -> &[Hash] {
        &self.to
    }

    /// Caller-supplied nonce.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// `keccak256(abi.encode(receipt))`, the key of the mailbox's messages mapping.
    pub fn digest(&self) -> Hash {
        crate::algorithms::receipt_digest(self)
    }
}

/// Inclusion proof of one storage slot at one height.
///
/// Valid only for `at_height`; never cached across heights.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageProof {
    /// Account whose storage is proven.
    pub account: Address,
    /// Storage slot.
    pub key: Hash,
    /// Slot value.
    pub value: Hash,
    /// Merkle siblings, source-to-root order (sparse layouts).
    pub path: Vec<Hash>,
    /// Leaf position (sparse layouts; 0 otherwise).
    pub index: u64,
    /// Block or batch number the proof is valid at.
    pub at_height: u64,
    /// Raw trie nodes (Merkle-Patricia layouts; empty otherwise).
    pub witness: Vec<Vec<u8>>,
}

impl StorageProof {
    /// Layout this proof was normalised into.
    pub fn layout(&self) -> ProofLayout {
        if self.witness.is_empty() {
            ProofLayout::SparseMerkle
        } else {
            ProofLayout::MerklePatricia
        }
    }
}

/// Canonical wire tuple submitted to a destination mailbox.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedProof {
    layout: ProofLayout,
    bytes: Vec<u8>,
}

impl EncodedProof {
    pub(crate) fn new(layout: ProofLayout, bytes: Vec<u8>) -> Self {
        Self { layout, bytes }
    }

    /// Layout of the encoded tuple.
    pub fn layout(&self) -> ProofLayout {
        self.layout
    }

    /// Raw ABI bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `0x`-prefixed hex of the ABI bytes.
    pub fn to_hex(&self) -> String {
        super::hex::to_hex(&self.bytes)
    }
}

/// One chain's committed state as known to Nexus.
///
/// Hash fields serialize as `0x`-prefixed 32-byte hex; heights as plain integers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Digest of the chain's verification statement.
    #[serde(rename = "statement", alias = "statement_digest", with = "serde_hash")]
    pub statement_digest: Hash,
    /// Chain state root.
    #[serde(with = "serde_hash")]
    pub state_root: Hash,
    /// Nexus hash the chain started from.
    #[serde(with = "serde_hash")]
    pub start_nexus_hash: Hash,
    /// Height of the last accepted proof.
    pub last_proof_height: u64,
    /// Chain height.
    pub height: u64,
}

/// Nexus's own commitment for one block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NexusBlock {
    /// Aggregated state root.
    #[serde(with = "serde_hash")]
    pub state_root: Hash,
    /// Nexus block hash.
    #[serde(with = "serde_hash")]
    pub block_hash: Hash,
}

/// Nexus header returned by the aggregation endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NexusHeader {
    /// Parent Nexus header hash.
    #[serde(with = "serde_hash")]
    pub parent_hash: Hash,
    /// Previous aggregated root.
    #[serde(with = "serde_hash")]
    pub prev_state_root: Hash,
    /// Aggregated root the account proof is against.
    #[serde(with = "serde_hash")]
    pub state_root: Hash,
    /// Underlying DA header hash.
    #[serde(with = "serde_hash")]
    pub avail_header_hash: Hash,
    /// Nexus height.
    pub number: u64,
}

/// Account leaf plus its inclusion proof against the latest Nexus root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountStateResponse {
    /// Chain height recorded in the account leaf.
    pub chain_state_number: u64,
    /// Nexus root the proof verifies against.
    pub state_root: Hash,
    /// The account leaf.
    pub account: AccountState,
    /// Merkle siblings of the leaf.
    pub proof: Vec<Hash>,
    /// Leaf value hash.
    pub value_hash: Hash,
    /// Header the root belongs to.
    pub nexus_header: NexusHeader,
}

/// Result of a confirmed `receive_message`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionOutcome {
    /// Destination transaction hash.
    pub tx_hash: Hash,
    /// App the proof was submitted to.
    pub app_id: String,
    /// Height the proof was generated at.
    pub at_height: u64,
    /// Storage slot that was proven.
    pub storage_slot: Hash,
    /// Final pipeline stage.
    pub stage: ReceiveStage,
}
