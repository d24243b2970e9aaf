//! # Relay Telemetry
//!
//! Logging setup shared by the relay binaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&TelemetryConfig::from_env())?;
//!     // tracing macros now reach stdout
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RELAY_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directive |
//! | `RELAY_JSON_LOGS` | `false` (`true` in containers) | JSON lines output |
//! | `RELAY_LOG_LOCATION` | `false` | Include file and line |
//! | `RELAY_SERVICE_NAME` | `nexus-relay` | Service name |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

// Reached by the exported logging macros.
#[doc(hidden)]
pub use tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The filter directive did not parse.
    #[error("Invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber was already installed.
    #[error("Failed to install subscriber: {0}")]
    AlreadyInitialized(String),
}
