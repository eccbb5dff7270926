//! Device layer modules.
//!
//! This module groups device identity, sensor channels, state stores and the
//! registry that builds devices from the catalog.

pub mod device;
pub mod registry;
pub mod sensor;
pub mod store;

pub use device::{Device, DeviceId};
pub use registry::DeviceRegistry;
pub use sensor::{Conversion, ConversionId, Sensor, SensorId, SensorType};
pub use store::{keys, DeviceStore, InMemoryDeviceStore, Scope, StateError};
