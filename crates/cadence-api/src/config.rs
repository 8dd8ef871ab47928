//! Service configuration
//!
//! Loaded from the YAML file named by `CADENCE_CONFIG`; every field has a
//! default, so the service also starts without a file. `CADENCE_ADDR`
//! overrides the listen address.

use cadence_gateway::GatewayConfig;
use cadence_quality::QualityProfile;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_ENV: &str = "CADENCE_CONFIG";
pub const ADDR_ENV: &str = "CADENCE_ADDR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("CONFIG/READ: {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CONFIG/PARSE: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("CONFIG/INVALID: {0}")]
    Invalid(String),
}

/// Limits applied to every pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Concurrent gateway calls within one stage
    pub gateway_concurrency: usize,

    /// Per-call gateway timeout in seconds
    pub gateway_timeout_secs: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            gateway_concurrency: cadence_core::DEFAULT_GATEWAY_CONCURRENCY,
            gateway_timeout_secs: cadence_core::DEFAULT_GATEWAY_TIMEOUT.as_secs(),
        }
    }
}

impl PipelineSettings {
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub listen_addr: String,
    pub gateway: GatewayConfig,
    pub pipeline: PipelineSettings,

    /// Named profile ("standard@1.0", "strict@1.0"), used unless `profile` is set
    pub quality_profile: String,

    /// Inline thresholds; omitted fields take standard values
    pub profile: Option<QualityProfile>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8787".to_string(),
            gateway: GatewayConfig::default(),
            pipeline: PipelineSettings::default(),
            quality_profile: "standard@1.0".to_string(),
            profile: None,
        }
    }
}

impl ServiceConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Configuration from `CADENCE_CONFIG` and `CADENCE_ADDR`
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        Self::resolve(path.as_deref(), std::env::var(ADDR_ENV).ok())
    }

    pub fn resolve(path: Option<&Path>, addr: Option<String>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(addr) = addr.filter(|a| !a.trim().is_empty()) {
            config.listen_addr = addr;
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.gateway_concurrency == 0 {
            return Err(ConfigError::Invalid("pipeline.gateway_concurrency must be at least 1".into()));
        }
        if self.pipeline.gateway_timeout_secs == 0 {
            return Err(ConfigError::Invalid("pipeline.gateway_timeout_secs must be at least 1".into()));
        }
        if let Some(profile) = &self.profile {
            profile.validate().map_err(ConfigError::Invalid)?;
        }
        Ok(())
    }

    /// The inline profile if given, else the named one
    pub fn quality_profile(&self) -> QualityProfile {
        self.profile
            .clone()
            .unwrap_or_else(|| QualityProfile::for_name(&self.quality_profile))
    }
}
