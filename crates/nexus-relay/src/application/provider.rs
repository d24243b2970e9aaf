//! # Storage Proof Provider
//!
//! Resolves the height to prove at and normalises node responses into
//! `StorageProof`s of the chain's layout.
//!
//! When no height is given the provider proves at `latest - block_query_offset`
//! so the proof never targets a block or batch that may still be reverted.

use crate::domain::{Address, ChainKind, Hash, ProofLayout, RelayError, StorageProof};
use crate::ports::outbound::{ProofRpc, RpcStorageProof};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::debug;

/// Per-chain proof provider.
pub struct StorageProofProvider<R: ProofRpc> {
    rpc: Arc<R>,
    kind: ChainKind,
    block_query_offset: u64,
}

impl<R: ProofRpc> StorageProofProvider<R> {
    /// Provider with an explicit verification-lag offset.
    pub fn new(rpc: Arc<R>, kind: ChainKind, block_query_offset: u64) -> Self {
        Self {
            rpc,
            kind,
            block_query_offset,
        }
    }

    /// Provider using the chain kind's default offset.
    pub fn for_kind(rpc: Arc<R>, kind: ChainKind) -> Self {
        Self::new(rpc, kind, kind.default_block_query_offset())
    }

    /// Height units subtracted from latest.
    pub fn block_query_offset(&self) -> u64 {
        self.block_query_offset
    }

    /// Layout proofs are normalised into.
    pub fn layout(&self) -> ProofLayout {
        self.kind.proof_layout()
    }

    /// The height a request will be served at.
    pub async fn resolve_height(&self, height: Option<u64>) -> Result<u64, RelayError> {
        if let Some(height) = height {
            return Ok(height);
        }
        let latest = self.rpc.latest_height().await?;
        let safe = latest.checked_sub(self.block_query_offset).ok_or_else(|| {
            RelayError::ProofUnavailable {
                height: latest,
                reason: format!(
                    "latest {} {} is below the {}-unit verification lag",
                    self.kind.height_unit(),
                    latest,
                    self.block_query_offset
                ),
            }
        })?;
        debug!(
            unit = self.kind.height_unit(),
            height = safe,
            latest,
            offset = self.block_query_offset,
            "[nexus-relay] Resolved latest safe height"
        );
        Ok(safe)
    }

    /// Proof of one storage key.
    pub async fn get_proof(
        &self,
        account: Address,
        key: Hash,
        height: Option<u64>,
    ) -> Result<StorageProof, RelayError> {
        let height = self.resolve_height(height).await?;
        self.fetch(account, key, height).await
    }

    /// Proofs of several keys, all at one height.
    ///
    /// The height is resolved once before any key is fetched; the per-key
    /// fetches then run concurrently.
    pub async fn get_proofs(
        &self,
        account: Address,
        keys: &[Hash],
        height: Option<u64>,
    ) -> Result<Vec<StorageProof>, RelayError> {
        let height = self.resolve_height(height).await?;
        try_join_all(keys.iter().map(|key| self.fetch(account, *key, height))).await
    }

    async fn fetch(
        &self,
        account: Address,
        key: Hash,
        height: u64,
    ) -> Result<StorageProof, RelayError> {
        let raw = self
            .rpc
            .get_proof(account, &[key], height)
            .await?
            .into_iter()
            .find(|p| p.key == key)
            .ok_or_else(|| {
                RelayError::MalformedProofResponse(format!(
                    "no proof for key {} in response at height {}",
                    hex::encode(key),
                    height
                ))
            })?;
        normalise(account, raw, height, self.layout())
    }
}

fn normalise(
    account: Address,
    raw: RpcStorageProof,
    height: u64,
    layout: ProofLayout,
) -> Result<StorageProof, RelayError> {
    match layout {
        ProofLayout::SparseMerkle => {
            let path = raw
                .proof
                .iter()
                .map(|node| {
                    <[u8; 32]>::try_from(node.as_slice()).map_err(|_| {
                        RelayError::MalformedProofResponse(format!(
                            "sibling is {} bytes, expected 32",
                            node.len()
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let index = raw.index.ok_or_else(|| {
                RelayError::MalformedProofResponse("missing leaf index".to_string())
            })?;
            Ok(StorageProof {
                account,
                key: raw.key,
                value: raw.value,
                path,
                index,
                at_height: height,
                witness: Vec::new(),
            })
        }
        ProofLayout::MerklePatricia => {
            if raw.proof.is_empty() {
                return Err(RelayError::MalformedProofResponse(
                    "empty trie witness".to_string(),
                ));
            }
            Ok(StorageProof {
                account,
                key: raw.key,
                value: raw.value,
                path: Vec::new(),
                index: 0,
                at_height: height,
                witness: raw.proof,
            })
        }
    }
}
