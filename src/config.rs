use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::Validate;

/// Row count above which reassembling a split relation in memory logs a warning
pub const DEFAULT_LARGE_RESULT_THRESHOLD: usize = 5000;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Resolver configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Reassembled row count above which a performance warning is logged
    #[validate(range(min = 1, message = "Large result threshold must be at least 1"))]
    pub large_result_threshold: usize,

    /// Whether every hop's scope is rendered into the debug log
    pub log_hop_scopes: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            large_result_threshold: DEFAULT_LARGE_RESULT_THRESHOLD,
            log_hop_scopes: true,
        }
    }
}

impl ResolverConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            large_result_threshold: parse_env_var(
                "SPLITHOP_LARGE_RESULT_THRESHOLD",
                &DEFAULT_LARGE_RESULT_THRESHOLD.to_string(),
            )?,
            log_hop_scopes: parse_env_var("SPLITHOP_LOG_HOP_SCOPES", "true")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
