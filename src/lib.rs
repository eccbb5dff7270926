//! # modempoll - staged monitoring for polled field modems
//!
//! A scheduler outside this crate walks a fleet of remote modems and, for
//! every device and stage, hands one monitoring [`Action`] to a
//! [`MonitorExecutor`]. The executor owns the control flow around that
//! action: cool-down windows per device and per stage, wake-up notices,
//! pacing after a successful exchange, and a failure boundary that keeps one
//! faulting modem from disturbing the rest.
//!
//! ## Core Concepts
//!
//! - **Device**: a remote modem with its sensors and a key/value state store
//! - **Stage**: one step of a device's monitoring sequence, with its own state
//! - **Action**: a unit of monitoring work, such as a register read
//! - **Transport**: the shared link; sending locks it to a device until the
//!   matching receive
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use modempoll::actions::DeviceInfo;
//! use modempoll::catalog::{DeviceKind, FixtureCatalog};
//! use modempoll::logging::TracingLogger;
//! use modempoll::monitor::{MonitorContext, ThreadPacer};
//! use modempoll::time::SystemClock;
//! use modempoll::transport::MemoryTransport;
//! use modempoll::{DeviceRegistry, MonitorConfig, MonitorExecutor};
//!
//! # fn main() -> modempoll::MonitorResult<()> {
//! let config = MonitorConfig::default();
//! let catalog = FixtureCatalog::new();
//! let registry = DeviceRegistry::load(&catalog, DeviceKind::Abs, 2)?;
//! let transport = MemoryTransport::new();
//! let executor = MonitorExecutor::with_parts(Arc::new(SystemClock), Arc::new(ThreadPacer));
//! let info = DeviceInfo::action(&config);
//!
//! for device in registry.iter() {
//!     let logger = TracingLogger::new(device);
//!     let ctx = MonitorContext::new(&transport, &catalog, device, &logger);
//!     // Modems without a signal reading skip the info block.
//!     let _ = executor.invoke(&info, &ctx);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod error;
pub mod time;
pub mod value;

// Devices and their backing records
pub mod catalog;
pub mod config;
pub mod device;

// Execution
pub mod actions;
pub mod logging;
pub mod monitor;
pub mod transport;

// Re-export primary types at crate root for convenience
pub use config::MonitorConfig;
pub use device::{Device, DeviceId, DeviceRegistry, DeviceStore, Scope};
pub use error::{ActionError, ConfigError, MonitorError, MonitorResult};
pub use monitor::{Action, ActionSession, MonitorContext, MonitorExecutor, Outcome};
pub use value::Value;
