//! JSON-RPC 2.0 client over HTTP.

use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when talking to a JSON-RPC node.
#[derive(Debug, Error)]
pub enum JsonRpcError {
    /// Transport failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Node returned a JSON-RPC error object.
    #[error("JSON-RPC error {code}: {message}")]
    Rpc {
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },
    /// Body was not the expected envelope or result type.
    #[error("Failed to parse response: {0}")]
    Parse(String),
    /// Endpoint refused the connection.
    #[error("Connection failed: {0}")]
    Connection(String),
}

impl JsonRpcError {
    /// Whether the body did not match the expected schema.
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

#[derive(Serialize)]
struct JsonRpcRequest<'a, P> {
    jsonrpc: &'static str,
    method: &'a str,
    params: P,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct JsonRpcResponse<R> {
    result: Option<R>,
    error: Option<JsonRpcErrorObject>,
}

/// JSON-RPC client bound to one endpoint.
///
/// No timeout is set; bounding calls is the caller's business.
pub struct JsonRpcClient {
    client: Client,
    endpoint: String,
    request_id: AtomicU64,
}

impl JsonRpcClient {
    /// Create a client for `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, JsonRpcError> {
        let client = Client::builder().build().map_err(JsonRpcError::Http)?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            request_id: AtomicU64::new(1),
        })
    }

    /// Endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Call a JSON-RPC method.
    pub async fn call<P: Serialize + Send, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, JsonRpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    JsonRpcError::Connection(format!("Cannot connect to {}", self.endpoint))
                } else {
                    JsonRpcError::Http(e)
                }
            })?;

        let body = response.text().await.map_err(JsonRpcError::Http)?;
        parse_response(&body)
    }
}

fn parse_response<R: DeserializeOwned>(body: &str) -> Result<R, JsonRpcError> {
    let rpc_response: JsonRpcResponse<R> =
        serde_json::from_str(body).map_err(|e| JsonRpcError::Parse(e.to_string()))?;

    if let Some(error) = rpc_response.error {
        return Err(JsonRpcError::Rpc {
            code: error.code,
            message: error.message,
        });
    }

    rpc_response
        .result
        .ok_or_else(|| JsonRpcError::Parse("Missing result in response".to_string()))
}
