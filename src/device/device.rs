//! Device identity and ownership of its state store.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::sensor::Sensor;
use super::store::{DeviceStore, InMemoryDeviceStore};

/// Catalog identifier for a device.
///
/// # Examples
///
/// ```
/// use modempoll::DeviceId;
///
/// assert_eq!(DeviceId(3).to_string(), "3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A remote telemetry modem polled over the shared transport.
///
/// Identity and sensor layout are fixed at construction. All mutable state
/// lives behind the [`DeviceStore`], so a `Device` can be shared between
/// scheduler threads by reference or `Arc`.
pub struct Device {
    id: DeviceId,
    host: String,
    port: u16,
    sensors: Vec<Sensor>,
    store: Box<dyn DeviceStore>,
}

impl Device {
    /// Create a device with an in-memory store of `stage_count` stages.
    #[must_use]
    pub fn new(
        id: DeviceId,
        host: impl Into<String>,
        port: u16,
        sensors: Vec<Sensor>,
        stage_count: usize,
    ) -> Self {
        Self::with_store(id, host, port, sensors, Box::new(InMemoryDeviceStore::new(stage_count)))
    }

    /// Create a device backed by a custom store.
    #[must_use]
    pub fn with_store(
        id: DeviceId,
        host: impl Into<String>,
        port: u16,
        sensors: Vec<Sensor>,
        store: Box<dyn DeviceStore>,
    ) -> Self {
        Self {
            id,
            host: host.into(),
            port,
            sensors,
            store,
        }
    }

    /// Numeric device id.
    #[must_use]
    pub const fn id(&self) -> DeviceId {
        self.id
    }

    /// Host name or address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` of the modem.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Fixed, ordered sensor channels.
    #[must_use]
    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    /// Device and stage state.
    #[must_use]
    pub fn store(&self) -> &dyn DeviceStore {
        self.store.as_ref()
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("sensors", &self.sensors.len())
            .field("stages", &self.store.stage_count())
            .finish_non_exhaustive()
    }
}
