//! Static catalog used by tests and local runs.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::device::{ConversionId, DeviceId, SensorId, SensorType};

use super::{Catalog, CatalogError, ConversionRecord, DeviceKind, ModemRecord, Sample, SensorRecord};

/// First device id handed out by the fixture.
pub const DEVICE_ID_BASE: u32 = 0;
/// First sensor id handed out by the fixture.
pub const SENSOR_ID_BASE: u32 = 10;
/// First conversion id handed out by the fixture.
pub const CONVERSION_ID_BASE: u32 = 100;

/// Monotonic id generator.
///
/// # Examples
///
/// ```
/// use modempoll::catalog::IdSequence;
///
/// let mut ids = IdSequence::starting_at(10);
/// assert_eq!(ids.next_id(), 10);
/// assert_eq!(ids.next_id(), 11);
/// ```
#[derive(Debug, Clone)]
pub struct IdSequence {
    next: u32,
}

impl IdSequence {
    /// Sequence whose first id is `first`.
    #[must_use]
    pub const fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    /// Return the next id and advance the sequence.
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Reset intervals of the standard conversions: 1h, 2h, 3h.
const STANDARD_RESETS: [u64; 3] = [3_600, 7_200, 10_800];

/// Standard ABS/ALR channel layout: (type, connector, conversion slot).
const STANDARD_LAYOUT: [(SensorType, u8, Option<usize>); 13] = [
    (SensorType::AnalogIn1, 0, None),
    (SensorType::AnalogIn1, 1, None),
    (SensorType::AnalogIn2, 0, None),
    (SensorType::AnalogIn2, 1, None),
    (SensorType::PulseCounter, 0, None),
    (SensorType::PulseCounter, 1, Some(0)),
    (SensorType::PulseFrequency, 0, None),
    (SensorType::PulseFrequency, 1, None),
    (SensorType::TimeCounter, 0, None),
    (SensorType::TimeCounter, 0, Some(1)),
    (SensorType::AnalogTotalizer, 0, None),
    (SensorType::AnalogTotalizer, 0, Some(2)),
    (SensorType::SignalQuality, 0, None),
];

const STANDARD_MODEMS: [(&str, u16); 2] = [("127.0.0.1", 5000), ("127.0.0.1", 5001)];

#[derive(Debug, Serialize, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    conversions: Vec<ConversionRecord>,
    #[serde(default)]
    modems: Vec<ModemRecord>,
}

/// Static catalog built once at construction.
///
/// Queries ignore the device family. Samples are kept in memory.
#[derive(Debug)]
pub struct FixtureCatalog {
    conversions: Vec<ConversionRecord>,
    modems: Vec<ModemRecord>,
    samples: RwLock<Vec<Sample>>,
}

impl FixtureCatalog {
    /// The standard test bench: two modems on localhost with the full
    /// 13-channel layout and three reset conversions.
    #[must_use]
    pub fn new() -> Self {
        let mut conversion_ids = IdSequence::starting_at(CONVERSION_ID_BASE);
        let conversions: Vec<ConversionRecord> = STANDARD_RESETS
            .iter()
            .map(|&reset_secs| ConversionRecord {
                id: ConversionId(conversion_ids.next_id()),
                reset_secs,
            })
            .collect();

        let mut device_ids = IdSequence::starting_at(DEVICE_ID_BASE);
        let mut sensor_ids = IdSequence::starting_at(SENSOR_ID_BASE);
        let modems = STANDARD_MODEMS
            .iter()
            .map(|&(host, port)| ModemRecord {
                id: DeviceId(device_ids.next_id()),
                host: host.to_string(),
                port,
                sensors: STANDARD_LAYOUT
                    .iter()
                    .map(|&(kind, index, slot)| SensorRecord {
                        id: SensorId(sensor_ids.next_id()),
                        conversion_id: slot.map(|s| conversions[s].id),
                        kind,
                        index,
                        last_reset: None,
                    })
                    .collect(),
            })
            .collect();

        Self::from_records(conversions, modems)
    }

    /// Catalog serving exactly these records.
    #[must_use]
    pub fn from_records(conversions: Vec<ConversionRecord>, modems: Vec<ModemRecord>) -> Self {
        Self {
            conversions,
            modems,
            samples: RwLock::new(Vec::new()),
        }
    }

    /// Parse a `{"conversions": [...], "modems": [...]}` document.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = serde_json::from_str(json)?;
        Ok(Self::from_records(doc.conversions, doc.modems))
    }

    /// Samples recorded so far.
    #[must_use]
    pub fn samples(&self) -> Vec<Sample> {
        self.samples.read().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog for FixtureCatalog {
    fn load_conversions(&self, _kind: DeviceKind) -> Result<Vec<ConversionRecord>, CatalogError> {
        Ok(self.conversions.clone())
    }

    fn load_modems(&self, _kind: DeviceKind) -> Result<Vec<ModemRecord>, CatalogError> {
        Ok(self.modems.clone())
    }

    fn record_sample(&self, sample: Sample) -> bool {
        match self.samples.write() {
            Ok(mut samples) => {
                samples.push(sample);
                true
            }
            Err(_) => false,
        }
    }
}
