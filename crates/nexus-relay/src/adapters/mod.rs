//! # Adapters Module
//!
//! Concrete implementations of the outbound ports.

pub mod error_sink;
pub mod in_memory;
pub mod json_rpc;
pub mod nexus_http;
pub mod proof_rpc;

pub use error_sink::TracingErrorSink;
pub use in_memory::{ChainStateUpdate, InMemoryStateManager};
pub use json_rpc::{JsonRpcClient, JsonRpcError};
pub use nexus_http::NexusStateClient;
pub use proof_rpc::{HttpProofRpc, RpcDialect};
