//! Device and stage data stores.
//!
//! Each device owns a key/value store plus one store per processing stage. The
//! stage cursor selects which stage store `Scope::Stage` reads and writes.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::value::Value;

/// Well-known data store keys.
pub mod keys {
    /// Absolute instant before which the scope is waiting.
    pub const WAIT_TIME: &str = "monitor.waitTime";
    /// Set while a logged sleep is pending.
    pub const SLEEPING: &str = "monitor.sleeping";
    /// Capability flag: the modem reports a usable radio signal.
    pub const SIGNAL: &str = "modem.signal";
    /// Last device info register block read from the modem.
    pub const DEVICE_INFO: &str = "modem.deviceInfo";
}

/// Errors raised by device state stores.
#[derive(Debug, Error)]
pub enum StateError {
    /// A lock guarding the store was poisoned.
    #[error("Poisoned device state lock: {0}")]
    Poisoned(&'static str),

    /// A key holds a value of a different type than requested.
    #[error("Key '{key}' holds {actual}, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// The stage cursor points outside the stage sequence.
    #[error("Stage index {index} out of range (stages: {count})")]
    StageOutOfRange {
        index: usize,
        count: usize,
    },
}

/// Which data store an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The device-wide store.
    Device,
    /// The store of the stage under the cursor.
    Stage,
}

impl Scope {
    /// Label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Stage => "stage",
        }
    }
}

/// Storage contract for per-device state.
///
/// Implementations must be safe to share between the threads of an external
/// scheduler.
pub trait DeviceStore: Send + Sync {
    /// Read a key.
    fn get(&self, scope: Scope, key: &str) -> Result<Option<Value>, StateError>;

    /// Write a key.
    fn set(&self, scope: Scope, key: &str, value: Value) -> Result<(), StateError>;

    /// Move the stage cursor to the next stage, wrapping at the end.
    /// Returns the new cursor position.
    fn advance_stage(&self) -> Result<usize, StateError>;

    /// Current stage cursor.
    fn stage_index(&self) -> Result<usize, StateError>;

    /// Length of the fixed stage sequence.
    fn stage_count(&self) -> usize;

    /// Read a boolean flag. Missing keys read as `false`.
    fn get_flag(&self, scope: Scope, key: &str) -> Result<bool, StateError> {
        match self.get(scope, key)? {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(v)) => Ok(v),
            Some(other) => Err(StateError::TypeMismatch {
                key: key.to_string(),
                expected: "bool",
                actual: other.type_name(),
            }),
        }
    }

    /// Read a timestamp. Missing keys read as `None`.
    fn get_time(&self, scope: Scope, key: &str) -> Result<Option<DateTime<Utc>>, StateError> {
        match self.get(scope, key)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Time(v)) => Ok(Some(v)),
            Some(other) => Err(StateError::TypeMismatch {
                key: key.to_string(),
                expected: "time",
                actual: other.type_name(),
            }),
        }
    }
}

#[derive(Debug)]
struct StoreState {
    device: HashMap<String, Value>,
    stages: Vec<HashMap<String, Value>>,
    cursor: usize,
}

/// Thread-safe in-memory device store.
#[derive(Debug)]
pub struct InMemoryDeviceStore {
    state: RwLock<StoreState>,
}

impl InMemoryDeviceStore {
    /// Create a store for a sequence of `stage_count` stages.
    ///
    /// A zero count is raised to one so the cursor always has a valid target.
    #[must_use]
    pub fn new(stage_count: usize) -> Self {
        let stage_count = stage_count.max(1);
        Self {
            state: RwLock::new(StoreState {
                device: HashMap::new(),
                stages: vec![HashMap::new(); stage_count],
                cursor: 0,
            }),
        }
    }
}

impl Default for InMemoryDeviceStore {
    fn default() -> Self {
        Self::new(1)
    }
}

fn scoped<'a>(
    state: &'a StoreState,
    scope: Scope,
) -> Result<&'a HashMap<String, Value>, StateError> {
    match scope {
        Scope::Device => Ok(&state.device),
        Scope::Stage => state
            .stages
            .get(state.cursor)
            .ok_or(StateError::StageOutOfRange {
                index: state.cursor,
                count: state.stages.len(),
            }),
    }
}

impl DeviceStore for InMemoryDeviceStore {
    fn get(&self, scope: Scope, key: &str) -> Result<Option<Value>, StateError> {
        let state = self.state.read().map_err(|_| StateError::Poisoned("store.get"))?;
        Ok(scoped(&state, scope)?.get(key).cloned())
    }

    fn set(&self, scope: Scope, key: &str, value: Value) -> Result<(), StateError> {
        let mut state = self.state.write().map_err(|_| StateError::Poisoned("store.set"))?;
        let cursor = state.cursor;
        let count = state.stages.len();
        let map = match scope {
            Scope::Device => &mut state.device,
            Scope::Stage => state
                .stages
                .get_mut(cursor)
                .ok_or(StateError::StageOutOfRange { index: cursor, count })?,
        };
        map.insert(key.to_string(), value);
        Ok(())
    }

    fn advance_stage(&self) -> Result<usize, StateError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StateError::Poisoned("store.advance_stage"))?;
        state.cursor = (state.cursor + 1) % state.stages.len();
        Ok(state.cursor)
    }

    fn stage_index(&self) -> Result<usize, StateError> {
        let state = self
            .state
            .read()
            .map_err(|_| StateError::Poisoned("store.stage_index"))?;
        Ok(state.cursor)
    }

    fn stage_count(&self) -> usize {
        self.state.read().map_or(0, |state| state.stages.len())
    }
}
