//! Decoded measurement records and time-stamped loop packets

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

use super::{UnitGroup, UnitSystem};

/// Physical quantities a station sentence can carry.
///
/// Serialized names match the host's observation field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Quantity {
    Barometer,
    OutTemp,
    OutHumidity,
    WindDir,
    WindSpeed,
}

impl Quantity {
    pub const fn name(self) -> &'static str {
        match self {
            Quantity::Barometer => "barometer",
            Quantity::OutTemp => "outTemp",
            Quantity::OutHumidity => "outHumidity",
            Quantity::WindDir => "windDir",
            Quantity::WindSpeed => "windSpeed",
        }
    }

    pub const fn group(self) -> UnitGroup {
        match self {
            Quantity::Barometer => UnitGroup::Pressure,
            Quantity::OutTemp => UnitGroup::Temperature,
            Quantity::OutHumidity => UnitGroup::Percent,
            Quantity::WindDir => UnitGroup::Direction,
            Quantity::WindSpeed => UnitGroup::Speed,
        }
    }
}

/// Values decoded from one frame, all expressed in `system`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    system: UnitSystem,
    values: BTreeMap<Quantity, f64>,
}

impl MeasurementRecord {
    pub fn new(system: UnitSystem) -> Self {
        Self { system, values: BTreeMap::new() }
    }

    pub fn insert(&mut self, quantity: Quantity, value: f64) {
        self.values.insert(quantity, value);
    }

    pub fn get(&self, quantity: Quantity) -> Option<f64> {
        self.values.get(&quantity).copied()
    }

    pub fn system(&self) -> UnitSystem {
        self.system
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Quantity, f64)> + '_ {
        self.values.iter().map(|(q, v)| (*q, *v))
    }

    pub fn barometer(&self) -> Option<f64> {
        self.get(Quantity::Barometer)
    }

    pub fn out_temp(&self) -> Option<f64> {
        self.get(Quantity::OutTemp)
    }

    pub fn out_humidity(&self) -> Option<f64> {
        self.get(Quantity::OutHumidity)
    }

    pub fn wind_dir(&self) -> Option<f64> {
        self.get(Quantity::WindDir)
    }

    pub fn wind_speed(&self) -> Option<f64> {
        self.get(Quantity::WindSpeed)
    }
}

/// A decoded record stamped with the time it was read.
///
/// Serializes flat, in the shape the host expects:
/// `{"dateTime": 1476100000, "usUnits": 1, "barometer": 29.92, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoopPacket {
    /// Seconds since the Unix epoch, rounded to the nearest second
    #[serde(rename = "dateTime")]
    pub date_time: u64,

    /// Unit system of every value in the packet
    #[serde(rename = "usUnits", serialize_with = "serialize_unit_code")]
    pub us_units: UnitSystem,

    #[serde(flatten)]
    pub values: BTreeMap<Quantity, f64>,
}

impl LoopPacket {
    /// Stamp a record with a read time.
    pub fn new(record: MeasurementRecord, date_time: u64) -> Self {
        Self { date_time, us_units: record.system, values: record.values }
    }

    pub fn get(&self, quantity: Quantity) -> Option<f64> {
        self.values.get(&quantity).copied()
    }
}

fn serialize_unit_code<S: Serializer>(system: &UnitSystem, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(system.code())
}
