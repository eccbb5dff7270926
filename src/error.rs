//! Error types for modempoll.
//!
//! All errors are strongly typed using thiserror. Nothing below the monitor
//! executor's failure boundary escapes `invoke`; these types describe what
//! the boundary logs.

use std::path::PathBuf;

use thiserror::Error;

use crate::actions::FrameError;
use crate::catalog::CatalogError;
use crate::device::StateError;

/// Faults raised while an action executes.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Device state error: {0}")]
    State(#[from] StateError),

    #[error("Malformed frame: {0}")]
    Frame(#[from] FrameError),

    #[error("Protocol error: {reason}")]
    Protocol {
        reason: String,
    },

    #[error("Action panicked: {message}")]
    Panicked {
        message: String,
    },
}

impl ActionError {
    /// Creates a protocol error.
    #[must_use]
    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
        }
    }

    /// Converts a caught panic payload into an error.
    #[must_use]
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked { message }
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value for '{field}': {reason}")]
    Invalid {
        field: String,
        reason: String,
    },
}

/// Top-level error type for modempoll.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    #[error("Device state error: {0}")]
    State(#[from] StateError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl MonitorError {
    /// Returns true if this error was raised by action logic.
    #[must_use]
    pub const fn is_action(&self) -> bool {
        matches!(self, Self::Action(_))
    }

    /// Returns true if this error clears up when the device is retried on a
    /// later cycle.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Action(_) | Self::State(_) => true,
            Self::Catalog(_) | Self::Config(_) => false,
        }
    }
}

/// Result type alias for modempoll operations.
pub type MonitorResult<T> = Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        let err = ActionError::protocol("unexpected register count");
        let msg = format!("{err}");
        assert!(msg.contains("Protocol error"));
        assert!(msg.contains("unexpected register count"));
    }

    #[test]
    fn test_from_panic_str_payload() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        let err = ActionError::from_panic(payload.as_ref());
        let ActionError::Panicked { message } = err else {
            panic!("expected Panicked");
        };
        assert_eq!(message, "boom");
    }

    #[test]
    fn test_from_panic_string_payload() {
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned boom"));
        let err = ActionError::from_panic(payload.as_ref());
        assert!(err.to_string().contains("owned boom"));
    }

    #[test]
    fn test_monitor_error_from_action() {
        let err: MonitorError = ActionError::protocol("x").into();
        assert!(err.is_action());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_catalog_error_is_not_retryable() {
        let err: MonitorError = CatalogError::EmptyStageSequence.into();
        assert!(!err.is_action());
        assert!(!err.is_retryable());
        assert!(format!("{err}").contains("Stage sequence must not be empty"));
    }

    #[test]
    fn test_config_error_invalid() {
        let err = ConfigError::Invalid {
            field: "unit_id".to_string(),
            reason: "must be non-zero".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("unit_id"));
        assert!(msg.contains("must be non-zero"));
    }
}
