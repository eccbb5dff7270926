//! Shared request/response transport.
//!
//! One transport carries the traffic of many devices. Between a device's write
//! and its matching read the transport is owned by that device; ownership is
//! marked with `lock`/`unlock` keyed by device id. Socket or serial
//! implementations live outside this crate; [`MemoryTransport`] is the
//! in-process reference implementation.

use crate::device::DeviceId;

mod memory;

pub use memory::{MemoryTransport, TransportEvent};

/// Framed channel shared by many devices.
///
/// Failures are reported as `false` / `None`; timeouts are the
/// implementation's concern.
pub trait Transport: Send + Sync {
    /// Write one framed message. Returns whether the write succeeded.
    fn write(&self, message: &[u8]) -> bool;

    /// Read one response of `expected_len` bytes.
    fn read(&self, expected_len: usize) -> Option<Vec<u8>>;

    /// Mark the transport as exclusively owned by `device`.
    fn lock(&self, device: DeviceId);

    /// Release exclusive ownership held by `device`.
    fn unlock(&self, device: DeviceId);
}
