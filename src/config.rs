use crate::device::DeviceConfig;
use crate::ingest::ReceiverConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level configuration covering both ends of the ingestion path.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub receiver: ReceiverConfig,
    pub device: DeviceConfig,
}

impl ServiceConfig {
    /// Loads and validates a JSON configuration file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let payload = fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;
        let config: ServiceConfig =
            serde_json::from_str(&payload).map_err(|source| ConfigError::Parse {
                path: path_ref.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks ranges the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_probability("receiver.p_overload", self.receiver.p_overload)?;
        check_probability("device.faults.p_drop", self.device.faults.p_drop)?;
        check_probability("device.faults.p_jitter", self.device.faults.p_jitter)?;
        check_probability("device.faults.p_duplicate", self.device.faults.p_duplicate)?;
        check_probability("device.retry.jitter_range", self.device.retry.jitter_range)?;
        if self.receiver.dedup.ttl_seconds == 0 {
            return Err(ConfigError::Invalid(
                "receiver.dedup.ttl_seconds must be > 0".into(),
            ));
        }
        if self.device.source_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "device.source_id must not be empty".into(),
            ));
        }
        if self.device.retry.base_backoff_seconds < 0.0 {
            return Err(ConfigError::Invalid(
                "device.retry.base_backoff_seconds must be >= 0".into(),
            ));
        }
        if self.device.retry.max_backoff_seconds < self.device.retry.base_backoff_seconds {
            return Err(ConfigError::Invalid(
                "device.retry.max_backoff_seconds must be >= base_backoff_seconds".into(),
            ));
        }
        if self.device.faults.max_jitter_seconds < 0.0 {
            return Err(ConfigError::Invalid(
                "device.faults.max_jitter_seconds must be >= 0".into(),
            ));
        }
        if self.device.request_timeout_seconds <= 0.0 {
            return Err(ConfigError::Invalid(
                "device.request_timeout_seconds must be > 0".into(),
            ));
        }
        Ok(())
    }
}

fn check_probability(field: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{field} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}

/// Errors surfaced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}
