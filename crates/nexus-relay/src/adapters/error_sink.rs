//! Error sink that forwards reports to `tracing`.

use crate::domain::RelayError;
use crate::ports::outbound::ErrorSink;
use tracing::{error, warn};

/// Logs network failures at `warn` and everything else at `error`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, operation: &str, err: &RelayError) {
        if err.is_network() {
            warn!(operation, error = %err, "[nexus-relay] Operation failed");
        } else {
            error!(operation, error = %err, "[nexus-relay] Operation failed");
        }
    }
}
