//! Shared base for single register-block reads.

use std::sync::atomic::{AtomicU16, Ordering};

use crate::config::MonitorConfig;
use crate::device::StateError;
use crate::error::ActionError;
use crate::monitor::{Action, ActionSession};

use super::frame::ReadRegisters;

/// Parameters and result handling of one register read.
pub trait RegisterRead: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// First register address.
    fn address(&self) -> u16;

    /// Number of registers to read.
    fn count(&self) -> u16;

    /// Capability gate checked before anything is written.
    fn enabled(&self, _session: &ActionSession<'_>) -> Result<bool, StateError> {
        Ok(true)
    }

    /// Consume the decoded registers.
    fn handle(&self, session: &mut ActionSession<'_>, registers: Vec<u16>) -> Result<(), ActionError>;
}

/// Action that writes one read request and decodes the matching response.
///
/// Success means the gate was open and both the write and the read went
/// through. A failed write or read backs the device off for
/// `failure_backoff_secs`; a malformed response is a fault.
#[derive(Debug)]
pub struct RegisterReadAction<R> {
    read: R,
    unit: u8,
    failure_backoff_secs: u64,
    transactions: AtomicU16,
}

impl<R: RegisterRead> RegisterReadAction<R> {
    /// Wrap `read` with the unit id and failure backoff from `config`.
    #[must_use]
    pub fn new(read: R, config: &MonitorConfig) -> Self {
        Self {
            read,
            unit: config.unit_id,
            failure_backoff_secs: config.failure_backoff_secs,
            transactions: AtomicU16::new(1),
        }
    }

    fn next_transaction(&self) -> u16 {
        self.transactions.fetch_add(1, Ordering::Relaxed)
    }
}

impl<R: RegisterRead> Action for RegisterReadAction<R> {
    fn name(&self) -> &str {
        self.read.name()
    }

    fn execute(&self, session: &mut ActionSession<'_>) -> Result<bool, ActionError> {
        if !self.read.enabled(session)? {
            return Ok(false);
        }

        let request = ReadRegisters::new(0, self.unit, self.read.address(), self.read.count())?
            .with_transaction(self.next_transaction());

        if !session.send_message(&request.encode()) {
            session.sleep_device(self.failure_backoff_secs, true)?;
            return Ok(false);
        }

        let Some(response) = session.receive_message(request.response_len()) else {
            session.sleep_device(self.failure_backoff_secs, true)?;
            return Ok(false);
        };

        let registers = request.decode_response(&response)?;
        self.read.handle(session, registers)?;
        Ok(true)
    }
}
