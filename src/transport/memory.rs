//! In-memory scripted transport.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::device::DeviceId;

use super::Transport;

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A message was written.
    Write(Vec<u8>),
    /// A response of `expected_len` bytes was requested.
    Read {
        /// Requested response length.
        expected_len: usize,
    },
    /// The lock was granted to a device.
    Lock(DeviceId),
    /// A device asked for the lock while another one held it.
    Contended {
        /// Device keeping the lock.
        holder: DeviceId,
        /// Device that was refused.
        requester: DeviceId,
    },
    /// A device released the lock, or asked to.
    Unlock(DeviceId),
}

#[derive(Debug, Default)]
struct State {
    write_results: VecDeque<bool>,
    responses: VecDeque<Option<Vec<u8>>>,
    events: Vec<TransportEvent>,
    owner: Option<DeviceId>,
}

/// Transport that replays scripted results and records every call.
///
/// Writes succeed unless a failure was scripted; reads fail unless a response
/// was scripted.
///
/// # Examples
///
/// ```
/// use modempoll::transport::{MemoryTransport, Transport};
///
/// let transport = MemoryTransport::new();
/// transport.push_response(vec![0x01, 0x02]);
///
/// assert!(transport.write(&[0xAA]));
/// assert_eq!(transport.read(2), Some(vec![0x01, 0x02]));
/// assert_eq!(transport.read(2), None);
/// ```
#[derive(Debug, Default)]
pub struct MemoryTransport {
    state: Mutex<State>,
}

impl MemoryTransport {
    /// Transport with nothing scripted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Script the outcome of the next unscripted write.
    pub fn push_write_result(&self, ok: bool) {
        self.state().write_results.push_back(ok);
    }

    /// Script a successful read returning `response`.
    pub fn push_response(&self, response: Vec<u8>) {
        self.state().responses.push_back(Some(response));
    }

    /// Script a failed read.
    pub fn push_read_failure(&self) {
        self.state().responses.push_back(None);
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<TransportEvent> {
        self.state().events.clone()
    }

    /// Messages written so far.
    #[must_use]
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state()
            .events
            .iter()
            .filter_map(|e| match e {
                TransportEvent::Write(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of write and read calls.
    #[must_use]
    pub fn io_count(&self) -> usize {
        self.state()
            .events
            .iter()
            .filter(|e| matches!(e, TransportEvent::Write(_) | TransportEvent::Read { .. }))
            .count()
    }

    /// Number of times `device` was granted the lock.
    #[must_use]
    pub fn lock_count(&self, device: DeviceId) -> usize {
        self.state()
            .events
            .iter()
            .filter(|e| **e == TransportEvent::Lock(device))
            .count()
    }

    /// Number of unlock calls made for `device`.
    #[must_use]
    pub fn unlock_count(&self, device: DeviceId) -> usize {
        self.state()
            .events
            .iter()
            .filter(|e| **e == TransportEvent::Unlock(device))
            .count()
    }

    /// Lock requests refused because another device held the lock.
    #[must_use]
    pub fn contentions(&self) -> Vec<(DeviceId, DeviceId)> {
        self.state()
            .events
            .iter()
            .filter_map(|e| match *e {
                TransportEvent::Contended { holder, requester } => Some((holder, requester)),
                _ => None,
            })
            .collect()
    }

    /// Device currently holding the exclusive lock.
    #[must_use]
    pub fn owner(&self) -> Option<DeviceId> {
        self.state().owner
    }
}

impl Transport for MemoryTransport {
    fn write(&self, message: &[u8]) -> bool {
        let mut state = self.state();
        state.events.push(TransportEvent::Write(message.to_vec()));
        state.write_results.pop_front().unwrap_or(true)
    }

    fn read(&self, expected_len: usize) -> Option<Vec<u8>> {
        let mut state = self.state();
        state.events.push(TransportEvent::Read { expected_len });
        state.responses.pop_front().flatten()
    }

    fn lock(&self, device: DeviceId) {
        let mut state = self.state();
        match state.owner {
            Some(holder) if holder != device => {
                state.events.push(TransportEvent::Contended {
                    holder,
                    requester: device,
                });
            }
            _ => {
                state.events.push(TransportEvent::Lock(device));
                state.owner = Some(device);
            }
        }
    }

    fn unlock(&self, device: DeviceId) {
        let mut state = self.state();
        state.events.push(TransportEvent::Unlock(device));
        if state.owner == Some(device) {
            state.owner = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_write_failure() {
        let transport = MemoryTransport::new();
        transport.push_write_result(false);

        assert!(!transport.write(b"a"));
        assert!(transport.write(b"b"));
        assert_eq!(transport.writes(), vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn test_scripted_read_failure_then_response() {
        let transport = MemoryTransport::new();
        transport.push_read_failure();
        transport.push_response(vec![9]);

        assert_eq!(transport.read(1), None);
        assert_eq!(transport.read(1), Some(vec![9]));
        assert_eq!(transport.io_count(), 2);
    }

    #[test]
    fn test_unlock_by_other_device_keeps_owner() {
        let transport = MemoryTransport::new();
        transport.lock(DeviceId(1));
        transport.unlock(DeviceId(2));
        assert_eq!(transport.owner(), Some(DeviceId(1)));

        transport.unlock(DeviceId(1));
        assert_eq!(transport.owner(), None);
        assert_eq!(transport.lock_count(DeviceId(1)), 1);
        assert_eq!(transport.unlock_count(DeviceId(1)), 1);
    }

    #[test]
    fn test_lock_held_by_other_device_is_not_stolen() {
        let transport = MemoryTransport::new();
        transport.lock(DeviceId(1));
        transport.lock(DeviceId(2));
        transport.unlock(DeviceId(2));

        assert_eq!(transport.owner(), Some(DeviceId(1)));
        assert_eq!(transport.lock_count(DeviceId(2)), 0);
        assert_eq!(transport.contentions(), vec![(DeviceId(1), DeviceId(2))]);
    }

    #[test]
    fn test_owner_may_lock_again() {
        let transport = MemoryTransport::new();
        transport.lock(DeviceId(3));
        transport.lock(DeviceId(3));

        assert_eq!(transport.owner(), Some(DeviceId(3)));
        assert_eq!(transport.lock_count(DeviceId(3)), 2);
        assert!(transport.contentions().is_empty());
    }
}
