//! Per-device logging channel.
//!
//! Actions and the executor report through a [`MonitorLogger`]: notices for
//! state transitions (sleep, wake up) and exceptions for faults absorbed at
//! the executor boundary. [`TracingLogger`] forwards both to `tracing`.

use std::error::Error;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use tracing_subscriber::EnvFilter;

use crate::device::{Device, DeviceId};

/// Logging channel bound to one device.
pub trait MonitorLogger: Send + Sync {
    /// Record an informational state transition.
    fn notice(&self, message: fmt::Arguments<'_>);

    /// Record a fault absorbed by the executor.
    fn exception(&self, err: &dyn Error);
}

/// Logger that emits `tracing` events tagged with the device.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    device: DeviceId,
    host: String,
    port: u16,
}

impl TracingLogger {
    /// Logger tagged with the id and address of `device`.
    #[must_use]
    pub fn new(device: &Device) -> Self {
        Self {
            device: device.id(),
            host: device.host().to_string(),
            port: device.port(),
        }
    }
}

impl MonitorLogger for TracingLogger {
    fn notice(&self, message: fmt::Arguments<'_>) {
        tracing::info!(
            device = %self.device,
            host = %self.host,
            port = self.port,
            "{}",
            message
        );
    }

    fn exception(&self, err: &dyn Error) {
        tracing::error!(
            device = %self.device,
            host = %self.host,
            port = self.port,
            error = %err,
            "monitor action failed"
        );
    }
}

/// One captured log call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    /// A formatted notice.
    Notice(String),
    /// The display text of an absorbed fault.
    Exception(String),
}

/// Logger that keeps every record in memory.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl RecordingLogger {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything captured so far, in order.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Notice messages, in order.
    #[must_use]
    pub fn notices(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                LogRecord::Notice(m) => Some(m),
                LogRecord::Exception(_) => None,
            })
            .collect()
    }

    /// Exception messages, in order.
    #[must_use]
    pub fn exceptions(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                LogRecord::Exception(m) => Some(m),
                LogRecord::Notice(_) => None,
            })
            .collect()
    }

    fn push(&self, record: LogRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

impl MonitorLogger for RecordingLogger {
    fn notice(&self, message: fmt::Arguments<'_>) {
        self.push(LogRecord::Notice(message.to_string()));
    }

    fn exception(&self, err: &dyn Error) {
        self.push(LogRecord::Exception(err.to_string()));
    }
}

/// Install a global fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Returns false when a global subscriber was already set.
///
/// ```
/// modempoll::logging::init();
/// assert!(!modempoll::logging::init());
/// ```
pub fn init() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActionError;

    fn _assert_logger_object_safe(_: &dyn MonitorLogger) {}

    #[test]
    fn test_recording_logger_splits_channels() {
        let logger = RecordingLogger::new();
        logger.notice(format_args!("modem wait to: {}, {} seconds", "2026/01/01 00:00:00", 60));
        logger.exception(&ActionError::protocol("bad frame"));

        assert_eq!(logger.notices(), vec!["modem wait to: 2026/01/01 00:00:00, 60 seconds"]);
        assert_eq!(logger.exceptions().len(), 1);
        assert!(logger.exceptions()[0].contains("bad frame"));
    }

    #[test]
    fn test_init_installs_subscriber_once() {
        assert!(init());
        assert!(!init());

        let device = Device::new(DeviceId(5), "127.0.0.1", 5001, Vec::new(), 1);
        TracingLogger::new(&device).notice(format_args!("modem wake up"));
    }

    #[test]
    fn test_tracing_logger_does_not_panic_without_subscriber() {
        let device = Device::new(DeviceId(4), "127.0.0.1", 5000, Vec::new(), 1);
        let logger = TracingLogger::new(&device);
        logger.notice(format_args!("stage wake up"));
        logger.exception(&ActionError::protocol("x"));
    }
}
