//! Post-success pacing delay.

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// Applies the delay that bounds aggregate request rate.
pub trait Pacer: Send + Sync {
    /// Block the calling thread for `delay`.
    fn pause(&self, delay: Duration);
}

/// Pacer that sleeps the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, delay: Duration) {
        thread::sleep(delay);
    }
}

/// Pacer that records requested delays without sleeping.
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPacer {
    /// Pacer with no recorded pauses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requested delays, in order.
    #[must_use]
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Pacer for RecordingPacer {
    fn pause(&self, delay: Duration) {
        self.pauses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_thread_pacer_blocks() {
        let started = Instant::now();
        ThreadPacer.pause(Duration::from_millis(20));
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_recording_pacer_records() {
        let pacer = RecordingPacer::new();
        pacer.pause(Duration::from_secs(2));
        assert_eq!(pacer.pauses(), vec![Duration::from_secs(2)]);
    }
}
