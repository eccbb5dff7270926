//! Staged wait-check, execute and pacing.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::device::{keys, DeviceStore, Scope, StateError};
use crate::error::ActionError;
use crate::logging::MonitorLogger;
use crate::time::{is_waiting, Clock, SystemClock};
use crate::value::Value;

use super::context::MonitorContext;
use super::pacing::{Pacer, ThreadPacer};
use super::session::{Action, ActionSession};

/// Delay applied after every successful exchange to protect the shared
/// transport and backend.
pub const PACING_DELAY: Duration = Duration::from_secs(2);

/// Which branch an invocation took.
///
/// Informational only: every branch is a normal return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The current stage was waiting; the cursor moved to `next_stage`.
    StageWaiting {
        /// Stage cursor after the advance.
        next_stage: usize,
    },
    /// The whole device was waiting; nothing changed.
    DeviceWaiting,
    /// `execute` ran and returned `success`.
    Completed {
        /// Value returned by `execute`.
        success: bool,
    },
    /// A fault was logged and absorbed.
    Faulted,
}

/// Runs actions under the staged monitoring contract.
///
/// The executor holds no per-call state: each [`invoke`](Self::invoke)
/// receives its collaborators in a fresh [`MonitorContext`].
pub struct MonitorExecutor {
    clock: Arc<dyn Clock>,
    pacer: Arc<dyn Pacer>,
}

impl MonitorExecutor {
    /// Executor on the system clock that sleeps the calling thread for pacing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(Arc::new(SystemClock), Arc::new(ThreadPacer))
    }

    /// Executor on an explicit clock and pacer.
    #[must_use]
    pub fn with_parts(clock: Arc<dyn Clock>, pacer: Arc<dyn Pacer>) -> Self {
        Self { clock, pacer }
    }

    /// Run `action` for the device in `ctx`, unless it or its stage is waiting.
    ///
    /// Order:
    /// 1. stage wait: advance the stage cursor and return,
    /// 2. device wait: return without touching the cursor,
    /// 3. `execute` inside the failure boundary,
    /// 4. [`PACING_DELAY`] when `execute` reported success.
    ///
    /// Never returns an error and never panics because of the action.
    pub fn invoke(&self, action: &dyn Action, ctx: &MonitorContext<'_>) -> Outcome {
        let device = ctx.device();
        let span = tracing::debug_span!("invoke", device = %device.id(), action = action.name());
        let _enter = span.enter();

        let now = self.clock.now();
        match self.check_waits(ctx, now) {
            Ok(Some(outcome)) => {
                tracing::debug!(?outcome, "skipped");
                return outcome;
            }
            Ok(None) => {}
            Err(err) => {
                ctx.logger().exception(&err);
                return Outcome::Faulted;
            }
        }

        let mut session = ActionSession::new(*ctx, self.clock.as_ref());
        let result = panic::catch_unwind(AssertUnwindSafe(|| action.execute(&mut session)))
            .unwrap_or_else(|payload| Err(ActionError::from_panic(payload.as_ref())));

        match result {
            Ok(true) => {
                self.pacer.pause(PACING_DELAY);
                Outcome::Completed { success: true }
            }
            Ok(false) => Outcome::Completed { success: false },
            Err(err) => {
                if session.release_abandoned_lock() {
                    tracing::warn!("released transport lock abandoned by faulting action");
                }
                ctx.logger().exception(&err);
                Outcome::Faulted
            }
        }
    }

    /// Stage wait strictly before device wait.
    fn check_waits(
        &self,
        ctx: &MonitorContext<'_>,
        now: DateTime<Utc>,
    ) -> Result<Option<Outcome>, StateError> {
        let store = ctx.device().store();
        let logger = ctx.logger();

        if scope_waiting(store, logger, Scope::Stage, now)? {
            let next_stage = store.advance_stage()?;
            return Ok(Some(Outcome::StageWaiting { next_stage }));
        }
        if scope_waiting(store, logger, Scope::Device, now)? {
            return Ok(Some(Outcome::DeviceWaiting));
        }
        Ok(None)
    }
}

impl Default for MonitorExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns true while `now < waitTime`. Once the wait has elapsed, clears a
/// pending sleeping flag and emits one wake up notice.
fn scope_waiting(
    store: &dyn DeviceStore,
    logger: &dyn MonitorLogger,
    scope: Scope,
    now: DateTime<Utc>,
) -> Result<bool, StateError> {
    if is_waiting(now, store.get_time(scope, keys::WAIT_TIME)?) {
        return Ok(true);
    }

    if store.get_flag(scope, keys::SLEEPING)? {
        store.set(scope, keys::SLEEPING, Value::Bool(false))?;
        match scope {
            Scope::Device => logger.notice(format_args!("modem wake up")),
            Scope::Stage => logger.notice(format_args!("stage wake up")),
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Duration as ChronoDuration;

    use crate::catalog::FixtureCatalog;
    use crate::device::{Device, DeviceId};
    use crate::logging::RecordingLogger;
    use crate::monitor::pacing::RecordingPacer;
    use crate::time::ManualClock;
    use crate::transport::MemoryTransport;

    struct Harness {
        transport: MemoryTransport,
        catalog: FixtureCatalog,
        device: Device,
        logger: RecordingLogger,
        clock: Arc<ManualClock>,
        pacer: Arc<RecordingPacer>,
        executor: MonitorExecutor,
    }

    impl Harness {
        fn new() -> Self {
            let clock = Arc::new(ManualClock::default());
            let pacer = Arc::new(RecordingPacer::new());
            let executor = MonitorExecutor::with_parts(clock.clone(), pacer.clone());
            Self {
                transport: MemoryTransport::new(),
                catalog: FixtureCatalog::new(),
                device: Device::new(DeviceId(1), "127.0.0.1", 5000, Vec::new(), 3),
                logger: RecordingLogger::new(),
                clock,
                pacer,
                executor,
            }
        }

        fn invoke(&self, action: &dyn Action) -> Outcome {
            let ctx = MonitorContext::new(&self.transport, &self.catalog, &self.device, &self.logger);
            self.executor.invoke(action, &ctx)
        }

        fn set(&self, scope: Scope, key: &str, value: Value) {
            self.device.store().set(scope, key, value).unwrap();
        }

        fn offset(&self, secs: i64) -> Value {
            Value::Time(self.clock.now() + ChronoDuration::seconds(secs))
        }
    }

    struct Counting {
        calls: AtomicUsize,
        result: fn() -> Result<bool, ActionError>,
    }

    impl Counting {
        fn returning(result: fn() -> Result<bool, ActionError>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Action for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn execute(&self, _session: &mut ActionSession<'_>) -> Result<bool, ActionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    #[test]
    fn test_active_device_success_paces() {
        let h = Harness::new();
        let action = Counting::returning(|| Ok(true));

        assert_eq!(h.invoke(&action), Outcome::Completed { success: true });
        assert_eq!(action.calls(), 1);
        assert_eq!(h.pacer.pauses(), vec![Duration::from_secs(2)]);
        assert!(h.logger.records().is_empty());
    }

    #[test]
    fn test_false_result_skips_pacing() {
        let h = Harness::new();
        let action = Counting::returning(|| Ok(false));

        assert_eq!(h.invoke(&action), Outcome::Completed { success: false });
        assert!(h.pacer.pauses().is_empty());
    }

    #[test]
    fn test_stage_waiting_advances_cursor_once() {
        let h = Harness::new();
        h.set(Scope::Stage, keys::WAIT_TIME, h.offset(100));
        let action = Counting::returning(|| Ok(true));

        assert_eq!(h.invoke(&action), Outcome::StageWaiting { next_stage: 1 });
        assert_eq!(action.calls(), 0);
        assert_eq!(h.device.store().stage_index().unwrap(), 1);
        assert_eq!(h.transport.io_count(), 0);
        assert!(h.pacer.pauses().is_empty());
    }

    #[test]
    fn test_device_waiting_keeps_cursor() {
        let h = Harness::new();
        h.set(Scope::Device, keys::WAIT_TIME, h.offset(100));
        let action = Counting::returning(|| Ok(true));

        assert_eq!(h.invoke(&action), Outcome::DeviceWaiting);
        assert_eq!(action.calls(), 0);
        assert_eq!(h.device.store().stage_index().unwrap(), 0);
        assert_eq!(h.transport.io_count(), 0);
    }

    #[test]
    fn test_stage_wait_checked_before_device_wait() {
        let h = Harness::new();
        h.set(Scope::Stage, keys::WAIT_TIME, h.offset(100));
        h.set(Scope::Device, keys::WAIT_TIME, h.offset(100));
        h.set(Scope::Device, keys::SLEEPING, Value::Bool(true));
        let action = Counting::returning(|| Ok(true));

        assert_eq!(h.invoke(&action), Outcome::StageWaiting { next_stage: 1 });
        // Device check never ran: its sleeping flag is untouched.
        assert!(h.device.store().get_flag(Scope::Device, keys::SLEEPING).unwrap());
        assert!(h.logger.records().is_empty());
    }

    #[test]
    fn test_wake_up_notices() {
        let h = Harness::new();
        h.set(Scope::Stage, keys::WAIT_TIME, h.offset(-1));
        h.set(Scope::Stage, keys::SLEEPING, Value::Bool(true));
        h.set(Scope::Device, keys::WAIT_TIME, h.offset(-1));
        h.set(Scope::Device, keys::SLEEPING, Value::Bool(true));
        let action = Counting::returning(|| Ok(false));

        assert_eq!(h.invoke(&action), Outcome::Completed { success: false });
        assert_eq!(h.logger.notices(), vec!["stage wake up", "modem wake up"]);

        let store = h.device.store();
        assert!(!store.get_flag(Scope::Stage, keys::SLEEPING).unwrap());
        assert!(!store.get_flag(Scope::Device, keys::SLEEPING).unwrap());

        // Flags are cleared, so the next call is silent.
        let _ = h.invoke(&action);
        assert_eq!(h.logger.notices().len(), 2);
    }

    #[test]
    fn test_wait_ends_exactly_at_wait_time() {
        let h = Harness::new();
        h.set(Scope::Device, keys::WAIT_TIME, h.offset(10));
        let action = Counting::returning(|| Ok(false));

        assert_eq!(h.invoke(&action), Outcome::DeviceWaiting);
        h.clock.advance(ChronoDuration::seconds(10));
        assert_eq!(h.invoke(&action), Outcome::Completed { success: false });
        assert_eq!(action.calls(), 1);
    }

    #[test]
    fn test_fault_logged_once_without_pacing() {
        let h = Harness::new();
        let action = Counting::returning(|| Err(ActionError::protocol("bad register")));

        assert_eq!(h.invoke(&action), Outcome::Faulted);
        assert_eq!(h.logger.exceptions().len(), 1);
        assert!(h.logger.exceptions()[0].contains("bad register"));
        assert!(h.pacer.pauses().is_empty());
    }

    #[test]
    fn test_panic_is_absorbed() {
        let h = Harness::new();
        let action = Counting::returning(|| panic!("register map corrupted"));

        assert_eq!(h.invoke(&action), Outcome::Faulted);
        assert_eq!(h.logger.exceptions().len(), 1);
        assert!(h.logger.exceptions()[0].contains("register map corrupted"));
    }

    #[test]
    fn test_fault_after_send_releases_lock() {
        let h = Harness::new();
        let action = crate::monitor::FnAction::new("half-exchange", |session: &mut ActionSession<'_>| {
            assert!(session.send_message(&[0x01]));
            Err(ActionError::protocol("aborted mid exchange"))
        });

        assert_eq!(h.invoke(&action), Outcome::Faulted);
        assert_eq!(h.transport.lock_count(DeviceId(1)), 1);
        assert_eq!(h.transport.unlock_count(DeviceId(1)), 1);
        assert_eq!(h.transport.owner(), None);
    }

    #[test]
    fn test_corrupt_wait_time_is_absorbed() {
        let h = Harness::new();
        h.set(Scope::Device, keys::WAIT_TIME, Value::Text("soon".to_string()));
        let action = Counting::returning(|| Ok(true));

        assert_eq!(h.invoke(&action), Outcome::Faulted);
        assert_eq!(action.calls(), 0);
        assert_eq!(h.logger.exceptions().len(), 1);
    }
}
