//! Proof RPC Adapter
//!
//! Implements `ProofRpc` over a chain node's JSON-RPC endpoint. The two
//! supported dialects differ in method names, height encoding and the shape
//! of the proof nodes they return.

use super::json_rpc::{JsonRpcClient, JsonRpcError};
use crate::domain::hex::{decode_hex, parse_quantity, parse_word, to_hex};
use crate::domain::{Address, ChainKind, Hash, RelayError};
use crate::ports::outbound::{ProofRpc, RpcStorageProof};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

/// JSON-RPC dialect spoken by the node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RpcDialect {
    /// `eth_blockNumber` / `eth_getProof`, hex block tags, Merkle-Patricia nodes.
    Ethereum,
    /// `zks_L1BatchNumber` / `zks_getProof`, integer batch numbers, sparse siblings.
    ZkSync,
}

impl RpcDialect {
    /// Dialect used for a chain kind.
    pub fn for_kind(kind: ChainKind) -> Self {
        match kind {
            ChainKind::EvmL1 => Self::Ethereum,
            ChainKind::ZkRollupL2 => Self::ZkSync,
        }
    }

    fn latest_method(&self) -> &'static str {
        match self {
            Self::Ethereum => "eth_blockNumber",
            Self::ZkSync => "zks_L1BatchNumber",
        }
    }

    fn proof_method(&self) -> &'static str {
        match self {
            Self::Ethereum => "eth_getProof",
            Self::ZkSync => "zks_getProof",
        }
    }

    fn proof_params(&self, account: Address, keys: &[Hash], height: u64) -> Value {
        let keys: Vec<String> = keys.iter().map(|k| to_hex(k)).collect();
        match self {
            Self::Ethereum => json!([to_hex(&account), keys, format!("0x{:x}", height)]),
            Self::ZkSync => json!([to_hex(&account), keys, height]),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProofResponse {
    storage_proof: Vec<RawStorageProof>,
}

#[derive(Deserialize)]
struct RawStorageProof {
    key: String,
    value: String,
    proof: Vec<String>,
    #[serde(default)]
    index: Option<u64>,
}

/// HTTP proof RPC for one chain node.
pub struct HttpProofRpc {
    client: JsonRpcClient,
    dialect: RpcDialect,
}

impl HttpProofRpc {
    /// Create an adapter for `endpoint` speaking `dialect`.
    pub fn new(endpoint: impl Into<String>, dialect: RpcDialect) -> Result<Self, RelayError> {
        let client = JsonRpcClient::new(endpoint)
            .map_err(|e| RelayError::Transport(format!("HTTP client: {}", e)))?;
        Ok(Self { client, dialect })
    }

    /// Dialect this adapter speaks.
    pub fn dialect(&self) -> RpcDialect {
        self.dialect
    }
}

fn unavailable(height: u64, error: JsonRpcError) -> RelayError {
    if error.is_schema() {
        RelayError::MalformedProofResponse(error.to_string())
    } else {
        RelayError::ProofUnavailable {
            height,
            reason: error.to_string(),
        }
    }
}

fn malformed(error: RelayError) -> RelayError {
    RelayError::MalformedProofResponse(error.to_string())
}

fn parse_proof_response(value: Value) -> Result<Vec<RpcStorageProof>, RelayError> {
    let response: ProofResponse = serde_json::from_value(value)
        .map_err(|e| RelayError::MalformedProofResponse(e.to_string()))?;

    response
        .storage_proof
        .into_iter()
        .map(|raw| {
            let proof = raw
                .proof
                .iter()
                .map(|node| decode_hex(node))
                .collect::<Result<Vec<_>, _>>()
                .map_err(malformed)?;
            Ok(RpcStorageProof {
                key: parse_word(&raw.key).map_err(malformed)?,
                value: parse_word(&raw.value).map_err(malformed)?,
                proof,
                index: raw.index,
            })
        })
        .collect()
}

#[async_trait]
impl ProofRpc for HttpProofRpc {
    async fn latest_height(&self) -> Result<u64, RelayError> {
        let quantity: String = self
            .client
            .call(self.dialect.latest_method(), [(); 0])
            .await
            .map_err(|e| unavailable(0, e))?;
        parse_quantity(&quantity).map_err(malformed)
    }

    async fn get_proof(
        &self,
        account: Address,
        keys: &[Hash],
        height: u64,
    ) -> Result<Vec<RpcStorageProof>, RelayError> {
        debug!(
            method = self.dialect.proof_method(),
            keys = keys.len(),
            height,
            endpoint = %self.client.endpoint(),
            "[nexus-relay] Requesting storage proof"
        );

        let value: Value = self
            .client
            .call(
                self.dialect.proof_method(),
                self.dialect.proof_params(account, keys, height),
            )
            .await
            .map_err(|e| unavailable(height, e))?;

        parse_proof_response(value)
    }
}
