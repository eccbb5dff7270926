//! Sensor channels and reset conversions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::wake_time;

/// Catalog identifier for a sensor channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorId(pub u32);

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Catalog identifier for a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversionId(pub u32);

impl fmt::Display for ConversionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of physical channel a sensor is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorType {
    /// Analog input bank 1.
    #[serde(rename = "a1")]
    AnalogIn1,
    /// Analog input bank 2.
    #[serde(rename = "a2")]
    AnalogIn2,
    /// Pulse totalizer.
    #[serde(rename = "pc")]
    PulseCounter,
    /// Pulse frequency.
    #[serde(rename = "pf")]
    PulseFrequency,
    /// Time totalizer.
    #[serde(rename = "tc")]
    TimeCounter,
    /// Analog value totalizer.
    #[serde(rename = "tz")]
    AnalogTotalizer,
    /// Radio signal quality.
    #[serde(rename = "sq")]
    SignalQuality,
}

impl SensorType {
    /// All channel types in catalog order.
    pub const ALL: [Self; 7] = [
        Self::AnalogIn1,
        Self::AnalogIn2,
        Self::PulseCounter,
        Self::PulseFrequency,
        Self::TimeCounter,
        Self::AnalogTotalizer,
        Self::SignalQuality,
    ];

    /// Accumulator channels grow monotonically and may be reset periodically.
    #[must_use]
    pub const fn supports_reset(self) -> bool {
        matches!(
            self,
            Self::PulseCounter | Self::TimeCounter | Self::AnalogTotalizer
        )
    }

    /// Short catalog code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::AnalogIn1 => "a1",
            Self::AnalogIn2 => "a2",
            Self::PulseCounter => "pc",
            Self::PulseFrequency => "pf",
            Self::TimeCounter => "tc",
            Self::AnalogTotalizer => "tz",
            Self::SignalQuality => "sq",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Reset policy referenced by accumulator channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    /// Conversion id.
    pub id: ConversionId,
    /// Interval between accumulator resets.
    pub reset_interval_secs: u64,
}

/// One sensor channel of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    /// Sensor id.
    pub id: SensorId,
    /// Channel type.
    pub kind: SensorType,
    /// Physical connector and memory slot on the modem.
    pub index: u8,
    /// Reset policy, for accumulator channels.
    pub conversion: Option<ConversionId>,
    /// Last time the accumulator was reset.
    pub last_reset: Option<DateTime<Utc>>,
}

impl Sensor {
    /// Create a channel without a conversion.
    #[must_use]
    pub const fn new(id: SensorId, kind: SensorType, index: u8) -> Self {
        Self {
            id,
            kind,
            index,
            conversion: None,
            last_reset: None,
        }
    }

    /// Attach a conversion reference.
    #[must_use]
    pub const fn with_conversion(mut self, conversion: ConversionId) -> Self {
        self.conversion = Some(conversion);
        self
    }

    /// Returns true when the channel resets on an interval.
    #[must_use]
    pub const fn resets(&self) -> bool {
        self.kind.supports_reset() && self.conversion.is_some()
    }

    /// Whether the conversion's reset interval has elapsed since the last reset.
    ///
    /// A channel that was never reset is due immediately.
    #[must_use]
    pub fn reset_due(&self, now: DateTime<Utc>, conversion: &Conversion) -> bool {
        if !self.resets() || self.conversion != Some(conversion.id) {
            return false;
        }
        match self.last_reset {
            Some(last) => now >= wake_time(last, conversion.reset_interval_secs),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn hourly() -> Conversion {
        Conversion {
            id: ConversionId(100),
            reset_interval_secs: 3600,
        }
    }

    #[test]
    fn test_supports_reset_only_for_accumulators() {
        let accumulators: Vec<_> = SensorType::ALL
            .iter()
            .copied()
            .filter(|t| t.supports_reset())
            .collect();
        assert_eq!(
            accumulators,
            vec![
                SensorType::PulseCounter,
                SensorType::TimeCounter,
                SensorType::AnalogTotalizer
            ]
        );
    }

    #[test]
    fn test_reset_due_after_interval() {
        let now = Utc::now();
        let mut sensor =
            Sensor::new(SensorId(10), SensorType::PulseCounter, 1).with_conversion(ConversionId(100));

        sensor.last_reset = Some(now - Duration::minutes(59));
        assert!(!sensor.reset_due(now, &hourly()));

        sensor.last_reset = Some(now - Duration::hours(1));
        assert!(sensor.reset_due(now, &hourly()));
    }

    #[test]
    fn test_reset_due_when_never_reset() {
        let sensor =
            Sensor::new(SensorId(10), SensorType::TimeCounter, 0).with_conversion(ConversionId(100));
        assert!(sensor.reset_due(Utc::now(), &hourly()));
    }

    #[test]
    fn test_reset_never_due_without_conversion() {
        let sensor = Sensor::new(SensorId(10), SensorType::PulseCounter, 0);
        assert!(!sensor.resets());
        assert!(!sensor.reset_due(Utc::now(), &hourly()));
    }

    #[test]
    fn test_sensor_type_serde_codes() {
        let json = serde_json::to_string(&SensorType::AnalogTotalizer).unwrap();
        assert_eq!(json, "\"tz\"");
        let back: SensorType = serde_json::from_str("\"sq\"").unwrap();
        assert_eq!(back, SensorType::SignalQuality);
    }
}
