//! Measurement units, unit groups and unit systems

use serde::{Deserialize, Serialize};
use std::fmt;

/// A physical unit a decoded value can be expressed in.
///
/// Names follow the host framework's unit vocabulary so packets can be handed
/// over without translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    #[serde(rename = "inHg")]
    InHg,
    Mbar,
    #[serde(rename = "hPa")]
    HPa,
    #[serde(rename = "kPa")]
    KPa,
    #[serde(rename = "mmHg")]
    MmHg,
    #[serde(rename = "degree_C")]
    DegreeC,
    #[serde(rename = "degree_F")]
    DegreeF,
    Knot,
    MilePerHour,
    KmPerHour,
    MeterPerSecond,
    Percent,
    DegreeCompass,
}

impl Unit {
    /// The measurement group this unit belongs to.
    pub const fn group(self) -> UnitGroup {
        match self {
            Unit::InHg | Unit::Mbar | Unit::HPa | Unit::KPa | Unit::MmHg => UnitGroup::Pressure,
            Unit::DegreeC | Unit::DegreeF => UnitGroup::Temperature,
            Unit::Knot | Unit::MilePerHour | Unit::KmPerHour | Unit::MeterPerSecond => {
                UnitGroup::Speed
            }
            Unit::Percent => UnitGroup::Percent,
            Unit::DegreeCompass => UnitGroup::Direction,
        }
    }

    /// Host vocabulary name (`inHg`, `degree_F`, `mile_per_hour`, ...).
    pub const fn name(self) -> &'static str {
        match self {
            Unit::InHg => "inHg",
            Unit::Mbar => "mbar",
            Unit::HPa => "hPa",
            Unit::KPa => "kPa",
            Unit::MmHg => "mmHg",
            Unit::DegreeC => "degree_C",
            Unit::DegreeF => "degree_F",
            Unit::Knot => "knot",
            Unit::MilePerHour => "mile_per_hour",
            Unit::KmPerHour => "km_per_hour",
            Unit::MeterPerSecond => "meter_per_second",
            Unit::Percent => "percent",
            Unit::DegreeCompass => "degree_compass",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Group of interchangeable units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitGroup {
    Pressure,
    Temperature,
    Speed,
    Percent,
    Direction,
}

/// Target unit system for decoded records.
///
/// Mirrors the host's `US`, `METRIC` and `METRICWX` conventions, including
/// their numeric `usUnits` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitSystem {
    #[default]
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "METRIC")]
    Metric,
    #[serde(rename = "METRICWX")]
    MetricWx,
}

impl UnitSystem {
    /// Numeric code used in the `usUnits` packet field.
    pub const fn code(self) -> u8 {
        match self {
            UnitSystem::Us => 0x01,
            UnitSystem::Metric => 0x10,
            UnitSystem::MetricWx => 0x11,
        }
    }

    /// Unit this system uses for a measurement group.
    pub const fn unit_for(self, group: UnitGroup) -> Unit {
        match (self, group) {
            (UnitSystem::Us, UnitGroup::Pressure) => Unit::InHg,
            (_, UnitGroup::Pressure) => Unit::Mbar,
            (UnitSystem::Us, UnitGroup::Temperature) => Unit::DegreeF,
            (_, UnitGroup::Temperature) => Unit::DegreeC,
            (UnitSystem::Us, UnitGroup::Speed) => Unit::MilePerHour,
            (UnitSystem::Metric, UnitGroup::Speed) => Unit::KmPerHour,
            (UnitSystem::MetricWx, UnitGroup::Speed) => Unit::MeterPerSecond,
            (_, UnitGroup::Percent) => Unit::Percent,
            (_, UnitGroup::Direction) => Unit::DegreeCompass,
        }
    }
}
