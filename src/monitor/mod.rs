//! Staged monitoring executor.
//!
//! An external scheduler calls [`MonitorExecutor::invoke`] once per device,
//! stage and cycle. The executor decides whether the device or its current
//! stage is still cooling down, runs the [`Action`] when neither is, paces
//! successful exchanges, and absorbs every fault so one broken modem cannot
//! stall the others.
//!
//! ```
//! use std::sync::Arc;
//!
//! use modempoll::catalog::FixtureCatalog;
//! use modempoll::logging::RecordingLogger;
//! use modempoll::monitor::{FnAction, MonitorContext, MonitorExecutor, Outcome, RecordingPacer};
//! use modempoll::time::SystemClock;
//! use modempoll::transport::MemoryTransport;
//! use modempoll::{Device, DeviceId};
//!
//! let executor = MonitorExecutor::with_parts(Arc::new(SystemClock), Arc::new(RecordingPacer::new()));
//! let transport = MemoryTransport::new();
//! let catalog = FixtureCatalog::new();
//! let device = Device::new(DeviceId(0), "127.0.0.1", 5000, Vec::new(), 1);
//! let logger = RecordingLogger::new();
//!
//! let ping = FnAction::new("ping", |session| Ok(session.send_message(b"ping")));
//! let ctx = MonitorContext::new(&transport, &catalog, &device, &logger);
//! assert_eq!(executor.invoke(&ping, &ctx), Outcome::Completed { success: true });
//! ```

mod context;
mod executor;
mod pacing;
mod session;

pub use context::MonitorContext;
pub use executor::{MonitorExecutor, Outcome, PACING_DELAY};
pub use pacing::{Pacer, RecordingPacer, ThreadPacer};
pub use session::{Action, ActionSession, FnAction};
