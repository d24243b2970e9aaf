//! Cross-module flows over the mock transports.

pub mod nexus_state;
pub mod relay_flow;
