//! Catalog of modems, sensors and conversions.
//!
//! The catalog is the external source of device definitions and the sink for
//! sampled values. Records here are plain serializable data; the
//! [`DeviceRegistry`](crate::device::DeviceRegistry) turns them into live
//! devices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::device::{ConversionId, DeviceId, SensorId, SensorType};

/// Static fixture provider.
pub mod fixture;

pub use fixture::{FixtureCatalog, IdSequence};

/// Modem product family a catalog query is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// ABS telemetry modems.
    Abs,
    /// ALR telemetry modems.
    Alr,
}

/// Errors raised while loading or validating catalog data.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A sensor references a conversion that was not loaded.
    #[error("Sensor {sensor} references unknown conversion {conversion}")]
    UnknownConversion {
        sensor: SensorId,
        conversion: ConversionId,
    },

    /// A sensor of a non-accumulator type references a conversion.
    #[error("Sensor {sensor} of type {kind} cannot reference a conversion")]
    ConversionNotSupported {
        sensor: SensorId,
        kind: SensorType,
    },

    /// The same id appears twice.
    #[error("Duplicate {entity} id: {id}")]
    DuplicateId {
        entity: &'static str,
        id: u32,
    },

    /// Devices need at least one stage.
    #[error("Stage sequence must not be empty")]
    EmptyStageSequence,

    /// Catalog JSON could not be parsed.
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Conversion row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRecord {
    /// Conversion id.
    pub id: ConversionId,
    /// Reset interval in seconds.
    pub reset_secs: u64,
}

/// Sensor row, nested under its modem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Sensor id.
    pub id: SensorId,
    /// Reset policy, for accumulator channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_id: Option<ConversionId>,
    /// Channel type.
    #[serde(rename = "type")]
    pub kind: SensorType,
    /// Connector and memory slot.
    pub index: u8,
    /// Last time the accumulator was reset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reset: Option<DateTime<Utc>>,
}

/// Modem row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModemRecord {
    /// Modem id.
    pub id: DeviceId,
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Sensor channels in layout order.
    #[serde(default)]
    pub sensors: Vec<SensorRecord>,
}

/// A batch of sampled values read from a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Device the sample was read from.
    pub device: DeviceId,
    /// Channels the values belong to, in order.
    pub channels: Vec<SensorId>,
    /// Position of the sample in the modem's memory.
    pub index: u32,
    /// Status word reported with the sample.
    pub status: u16,
    /// Time the modem recorded the sample.
    pub timestamp: DateTime<Utc>,
    /// Converted values, one per channel.
    pub values: Vec<f64>,
}

/// Provider of device definitions and sink for sampled values.
pub trait Catalog: Send + Sync {
    /// Load all conversions for a device family.
    fn load_conversions(&self, kind: DeviceKind) -> Result<Vec<ConversionRecord>, CatalogError>;

    /// Load all modems for a device family.
    fn load_modems(&self, kind: DeviceKind) -> Result<Vec<ModemRecord>, CatalogError>;

    /// Persist a sample. Returns whether the sink accepted it.
    fn record_sample(&self, sample: Sample) -> bool;
}
