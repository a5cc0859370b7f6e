//! Unit conversion contract and the standard linear/affine converter

use crate::types::{Unit, UnitGroup};
use crate::{Result, StationError};

/// Converts a value between two units.
///
/// Implementations must be pure and deterministic. Unit pairs the converter
/// does not handle are reported as [`StationError::UnitConversion`].
pub trait UnitConverter: Send + Sync {
    fn convert(&self, value: f64, from: Unit, to: Unit) -> Result<f64>;
}

/// Converter covering every unit in [`Unit`] within its own group.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardConverter;

const MBAR_PER_INHG: f64 = 33.863_886_666_7;
const MBAR_PER_MMHG: f64 = 1.333_223_874_15;
const MBAR_PER_KPA: f64 = 10.0;

const MPS_PER_KNOT: f64 = 1852.0 / 3600.0;
const MPS_PER_MPH: f64 = 1609.344 / 3600.0;
const MPS_PER_KPH: f64 = 1000.0 / 3600.0;

impl StandardConverter {
    fn pressure_to_mbar(value: f64, unit: Unit) -> f64 {
        match unit {
            Unit::InHg => value * MBAR_PER_INHG,
            Unit::MmHg => value * MBAR_PER_MMHG,
            Unit::KPa => value * MBAR_PER_KPA,
            _ => value,
        }
    }

    fn mbar_to_pressure(value: f64, unit: Unit) -> f64 {
        match unit {
            Unit::InHg => value / MBAR_PER_INHG,
            Unit::MmHg => value / MBAR_PER_MMHG,
            Unit::KPa => value / MBAR_PER_KPA,
            _ => value,
        }
    }

    fn speed_to_mps(value: f64, unit: Unit) -> f64 {
        match unit {
            Unit::Knot => value * MPS_PER_KNOT,
            Unit::MilePerHour => value * MPS_PER_MPH,
            Unit::KmPerHour => value * MPS_PER_KPH,
            _ => value,
        }
    }

    fn mps_to_speed(value: f64, unit: Unit) -> f64 {
        match unit {
            Unit::Knot => value / MPS_PER_KNOT,
            Unit::MilePerHour => value / MPS_PER_MPH,
            Unit::KmPerHour => value / MPS_PER_KPH,
            _ => value,
        }
    }
}

impl UnitConverter for StandardConverter {
    fn convert(&self, value: f64, from: Unit, to: Unit) -> Result<f64> {
        if from == to {
            return Ok(value);
        }

        match (from.group(), to.group()) {
            (UnitGroup::Pressure, UnitGroup::Pressure) => {
                Ok(Self::mbar_to_pressure(Self::pressure_to_mbar(value, from), to))
            }
            (UnitGroup::Speed, UnitGroup::Speed) => {
                Ok(Self::mps_to_speed(Self::speed_to_mps(value, from), to))
            }
            (UnitGroup::Temperature, UnitGroup::Temperature) => match from {
                Unit::DegreeC => Ok(value * 1.8 + 32.0),
                _ => Ok((value - 32.0) / 1.8),
            },
            _ => Err(StationError::UnitConversion { from, to }),
        }
    }
}
