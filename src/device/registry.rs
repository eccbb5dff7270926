//! Builds live devices from catalog records.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::catalog::{Catalog, CatalogError, DeviceKind, ModemRecord};

use super::device::{Device, DeviceId};
use super::sensor::{Conversion, ConversionId, Sensor};

/// All devices of one family, created once at startup.
#[derive(Debug)]
pub struct DeviceRegistry {
    devices: Vec<Arc<Device>>,
    by_id: HashMap<DeviceId, usize>,
    conversions: HashMap<ConversionId, Conversion>,
}

impl DeviceRegistry {
    /// Load conversions and modems of `kind` and build one device per modem,
    /// each with a stage sequence of length `stage_count`.
    ///
    /// # Errors
    ///
    /// Fails on duplicate ids, on a conversion referenced by a channel that
    /// cannot reset, on a reference to an unknown conversion, and when
    /// `stage_count` is zero.
    pub fn load(
        catalog: &dyn Catalog,
        kind: DeviceKind,
        stage_count: usize,
    ) -> Result<Self, CatalogError> {
        if stage_count == 0 {
            return Err(CatalogError::EmptyStageSequence);
        }

        let mut conversions = HashMap::new();
        for record in catalog.load_conversions(kind)? {
            let conversion = Conversion {
                id: record.id,
                reset_interval_secs: record.reset_secs,
            };
            if conversions.insert(record.id, conversion).is_some() {
                return Err(CatalogError::DuplicateId {
                    entity: "conversion",
                    id: record.id.0,
                });
            }
        }

        let mut devices = Vec::new();
        let mut by_id = HashMap::new();
        let mut sensor_ids = HashSet::new();
        for record in catalog.load_modems(kind)? {
            if by_id.contains_key(&record.id) {
                return Err(CatalogError::DuplicateId {
                    entity: "device",
                    id: record.id.0,
                });
            }
            let device = build_device(record, &conversions, &mut sensor_ids, stage_count)?;
            by_id.insert(device.id(), devices.len());
            devices.push(Arc::new(device));
        }

        Ok(Self {
            devices,
            by_id,
            conversions,
        })
    }

    /// Device with `id`, if loaded.
    #[must_use]
    pub fn get(&self, id: DeviceId) -> Option<&Arc<Device>> {
        self.by_id.get(&id).and_then(|&idx| self.devices.get(idx))
    }

    /// Devices in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Device>> {
        self.devices.iter()
    }

    /// Number of devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether no device was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Conversion with `id`, if loaded.
    #[must_use]
    pub fn conversion(&self, id: ConversionId) -> Option<&Conversion> {
        self.conversions.get(&id)
    }

    /// Accumulator channels of `device` whose reset interval has elapsed.
    #[must_use]
    pub fn sensors_due_for_reset<'a>(
        &self,
        device: &'a Device,
        now: DateTime<Utc>,
    ) -> Vec<&'a Sensor> {
        device
            .sensors()
            .iter()
            .filter(|sensor| {
                sensor
                    .conversion
                    .and_then(|id| self.conversions.get(&id))
                    .is_some_and(|conversion| sensor.reset_due(now, conversion))
            })
            .collect()
    }
}

fn build_device(
    record: ModemRecord,
    conversions: &HashMap<ConversionId, Conversion>,
    sensor_ids: &mut HashSet<u32>,
    stage_count: usize,
) -> Result<Device, CatalogError> {
    let mut sensors = Vec::with_capacity(record.sensors.len());
    for s in record.sensors {
        if !sensor_ids.insert(s.id.0) {
            return Err(CatalogError::DuplicateId {
                entity: "sensor",
                id: s.id.0,
            });
        }
        if let Some(conversion) = s.conversion_id {
            if !s.kind.supports_reset() {
                return Err(CatalogError::ConversionNotSupported {
                    sensor: s.id,
                    kind: s.kind,
                });
            }
            if !conversions.contains_key(&conversion) {
                return Err(CatalogError::UnknownConversion {
                    sensor: s.id,
                    conversion,
                });
            }
        }
        sensors.push(Sensor {
            id: s.id,
            kind: s.kind,
            index: s.index,
            conversion: s.conversion_id,
            last_reset: s.last_reset,
        });
    }

    Ok(Device::new(record.id, record.host, record.port, sensors, stage_count))
}
