//! Cadence Gateway: concrete AI Analysis Gateways
//!
//! - [`HttpGateway`] posts `{prompt, analysis_kind}` to a configured
//!   endpoint. It does not retry; the caller decides how to degrade.
//! - [`ScriptedGateway`] answers from in-memory rules; it is the test
//!   double used across the workspace.

mod config;
mod http;
mod scripted;

pub use config::GatewayConfig;
pub use http::HttpGateway;
pub use scripted::ScriptedGateway;

use cadence_core::{AnalysisGateway, GatewayError};
use std::sync::Arc;

/// Build the gateway named by `config.provider`
pub fn create_gateway(config: &GatewayConfig) -> Result<Arc<dyn AnalysisGateway>, GatewayError> {
    tracing::debug!(provider = %config.provider, endpoint = %config.endpoint, "create_gateway: called");
    match config.provider.as_str() {
        "http" => Ok(Arc::new(HttpGateway::from_config(config)?)),
        other => Err(GatewayError::Malformed(format!(
            "Unknown gateway provider: '{}'. Supported: http",
            other
        ))),
    }
}
