//! Monitor configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables for the bundled register actions.
///
/// # Examples
///
/// ```
/// use modempoll::MonitorConfig;
///
/// let config = MonitorConfig::from_json_str(r#"{"failure_backoff_secs": 30}"#).unwrap();
/// assert_eq!(config.failure_backoff_secs, 30);
/// assert_eq!(config.info_refresh_secs, 3_600);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Device backoff after a failed write or read.
    pub failure_backoff_secs: u64,
    /// Stage backoff after a successful device info read.
    pub info_refresh_secs: u64,
    /// Unit identifier placed in register frames.
    pub unit_id: u8,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            failure_backoff_secs: 60,
            info_refresh_secs: 3_600,
            unit_id: 1,
        }
    }
}

impl MonitorConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Reject values that would make an action spin on a broken modem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_backoff_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "failure_backoff_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.unit_id == 0 {
            return Err(ConfigError::Invalid {
                field: "unit_id".to_string(),
                reason: "0 is the broadcast address".to_string(),
            });
        }
        Ok(())
    }
}
