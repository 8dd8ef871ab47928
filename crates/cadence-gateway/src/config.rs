//! Gateway configuration

use serde::{Deserialize, Serialize};

/// Where and how to reach the analysis gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Only "http" is supported
    pub provider: String,

    /// Analysis endpoint for the http provider
    pub endpoint: String,

    /// Environment variable holding a bearer token, if any
    pub api_key_env: Option<String>,

    /// Model hint forwarded to the gateway
    pub model: Option<String>,

    /// Client-side request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: "http".to_string(),
            endpoint: "http://127.0.0.1:9090/v1/analyze".to_string(),
            api_key_env: None,
            model: None,
            timeout_secs: 60,
        }
    }
}
