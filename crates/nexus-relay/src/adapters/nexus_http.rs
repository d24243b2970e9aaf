//! Nexus Aggregation Client
//!
//! Implements `AccountStateSource` against the aggregation service's
//! `GET /account-hex?app_account_id=<id>` endpoint.

use crate::domain::hex::{parse_hash, strip_0x};
use crate::domain::{AccountState, AccountStateResponse, Hash, NexusHeader, RelayError};
use crate::ports::outbound::AccountStateSource;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

#[derive(Deserialize)]
struct RawHeader {
    parent_hash: String,
    prev_state_root: String,
    state_root: String,
    avail_header_hash: String,
    number: u64,
}

#[derive(Deserialize)]
struct RawAccountResponse {
    account: AccountState,
    proof: Vec<String>,
    value_hash_hex: String,
    nexus_header: RawHeader,
}

fn hash(field: &str, value: &str) -> Result<Hash, RelayError> {
    parse_hash(value)
        .map_err(|e| RelayError::MalformedAggregationResponse(format!("{}: {}", field, e)))
}

fn parse_account_response(body: &str) -> Result<AccountStateResponse, RelayError> {
    let raw: RawAccountResponse = serde_json::from_str(body)
        .map_err(|e| RelayError::MalformedAggregationResponse(e.to_string()))?;

    let nexus_header = NexusHeader {
        parent_hash: hash("parent_hash", &raw.nexus_header.parent_hash)?,
        prev_state_root: hash("prev_state_root", &raw.nexus_header.prev_state_root)?,
        state_root: hash("state_root", &raw.nexus_header.state_root)?,
        avail_header_hash: hash("avail_header_hash", &raw.nexus_header.avail_header_hash)?,
        number: raw.nexus_header.number,
    };
    let proof = raw
        .proof
        .iter()
        .map(|sibling| hash("proof", sibling))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AccountStateResponse {
        chain_state_number: raw.account.height,
        state_root: nexus_header.state_root,
        value_hash: hash("value_hash_hex", &raw.value_hash_hex)?,
        account: raw.account,
        proof,
        nexus_header,
    })
}

/// HTTP client for the Nexus aggregation service.
pub struct NexusStateClient {
    client: Client,
    base_url: String,
}

impl NexusStateClient {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, RelayError> {
        let client = Client::builder()
            .build()
            .map_err(|e| RelayError::Transport(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Service base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl AccountStateSource for NexusStateClient {
    async fn get_account_state(&self, app_id: &str) -> Result<AccountStateResponse, RelayError> {
        let url = format!("{}/account-hex", self.base_url);
        debug!(%url, account = %app_id, "[nexus-relay] Fetching account state");

        let response = self
            .client
            .get(&url)
            .query(&[("app_account_id", strip_0x(app_id))])
            .send()
            .await
            .map_err(|e| RelayError::AggregationUnreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::AggregationUnreachable(format!(
                "{} returned {}",
                url, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RelayError::AggregationUnreachable(e.to_string()))?;
        parse_account_response(&body)
    }
}
