//! Helpers exposed to actions during `execute`.

use chrono::{DateTime, Utc};

use crate::catalog::Catalog;
use crate::device::{keys, Device, Scope, StateError};
use crate::error::ActionError;
use crate::logging::MonitorLogger;
use crate::time::{wake_time, Clock, NOTICE_TIME_FORMAT};
use crate::transport::Transport;
use crate::value::Value;

use super::context::MonitorContext;

/// Protocol logic run by the executor once a device and its stage are active.
pub trait Action: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Run one protocol exchange.
    ///
    /// Returns `Ok(true)` when the exchange succeeded (the executor then
    /// applies the pacing delay) and `Ok(false)` when nothing was done or the
    /// transport failed. `Err` is a fault: logged once and absorbed.
    fn execute(&self, session: &mut ActionSession<'_>) -> Result<bool, ActionError>;
}

/// Action built from a closure.
pub struct FnAction<F> {
    name: String,
    f: F,
}

impl<F> FnAction<F>
where
    F: Fn(&mut ActionSession<'_>) -> Result<bool, ActionError> + Send + Sync,
{
    /// Named action running `f`.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Action for FnAction<F>
where
    F: Fn(&mut ActionSession<'_>) -> Result<bool, ActionError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, session: &mut ActionSession<'_>) -> Result<bool, ActionError> {
        (self.f)(session)
    }
}

/// Per-invocation view handed to [`Action::execute`].
///
/// Tracks whether this invocation holds the transport lock so the executor
/// can release it if `execute` faults between a send and its receive.
pub struct ActionSession<'a> {
    ctx: MonitorContext<'a>,
    clock: &'a dyn Clock,
    holds_lock: bool,
}

impl<'a> ActionSession<'a> {
    pub(crate) fn new(ctx: MonitorContext<'a>, clock: &'a dyn Clock) -> Self {
        Self {
            ctx,
            clock,
            holds_lock: false,
        }
    }

    /// Device being monitored.
    #[must_use]
    pub fn device(&self) -> &'a Device {
        self.ctx.device()
    }

    /// Catalog backend.
    #[must_use]
    pub fn catalog(&self) -> &'a dyn Catalog {
        self.ctx.catalog()
    }

    /// Logger bound to the device.
    #[must_use]
    pub fn logger(&self) -> &'a dyn MonitorLogger {
        self.ctx.logger()
    }

    /// Shared transport. Prefer the send/receive helpers, which keep the lock paired.
    #[must_use]
    pub fn transport(&self) -> &'a dyn Transport {
        self.ctx.transport()
    }

    /// Current time on the executor clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Read a device-scope capability flag. Missing flags are `false`.
    pub fn device_flag(&self, key: &str) -> Result<bool, StateError> {
        self.device().store().get_flag(Scope::Device, key)
    }

    /// Pause the whole device for `seconds`.
    ///
    /// With `log`, also marks the device sleeping and emits one notice with
    /// the wake time. Without it only the wait time moves.
    pub fn sleep_device(&self, seconds: u64, log: bool) -> Result<(), StateError> {
        self.sleep(Scope::Device, seconds, log)
    }

    /// Pause the current stage for `seconds`. Same semantics as
    /// [`sleep_device`](Self::sleep_device), scoped to the stage store.
    pub fn sleep_stage(&self, seconds: u64, log: bool) -> Result<(), StateError> {
        self.sleep(Scope::Stage, seconds, log)
    }

    fn sleep(&self, scope: Scope, seconds: u64, log: bool) -> Result<(), StateError> {
        let store = self.device().store();
        let wait_time = wake_time(self.clock.now(), seconds);
        store.set(scope, keys::WAIT_TIME, Value::Time(wait_time))?;
        tracing::debug!(scope = scope.as_str(), %wait_time, seconds, "sleep scheduled");

        if log {
            store.set(scope, keys::SLEEPING, Value::Bool(true))?;
            let at = wait_time.format(NOTICE_TIME_FORMAT);
            match scope {
                Scope::Device => self
                    .logger()
                    .notice(format_args!("modem wait to: {at}, {seconds} seconds")),
                Scope::Stage => self.logger().notice(format_args!("next stage after: {at}")),
            }
        }
        Ok(())
    }

    /// Write `message` and, on success, take the transport lock for this
    /// device. A failed write takes no lock.
    pub fn send_message(&mut self, message: &[u8]) -> bool {
        let transport = self.transport();
        if !transport.write(message) {
            return false;
        }
        transport.lock(self.device().id());
        self.holds_lock = true;
        true
    }

    /// Read a response of `length` bytes and, on success, release the lock
    /// taken by the matching send. A failed read keeps the lock.
    pub fn receive_message(&mut self, length: usize) -> Option<Vec<u8>> {
        let transport = self.transport();
        let message = transport.read(length)?;
        transport.unlock(self.device().id());
        self.holds_lock = false;
        Some(message)
    }

    /// Whether a send of this invocation is still waiting for its receive.
    #[must_use]
    pub const fn holds_lock(&self) -> bool {
        self.holds_lock
    }

    /// Release a lock left behind by a faulting action.
    pub(crate) fn release_abandoned_lock(&mut self) -> bool {
        if !self.holds_lock {
            return false;
        }
        self.transport().unlock(self.device().id());
        self.holds_lock = false;
        true
    }
}
