//! Sentence field schemas

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{Quantity, Unit};
use crate::{Result, StationError};

/// Tag of the meteorological composite sentence emitted by the station.
pub const WIMDA_TAG: &str = "WIMDA";

/// Number of comma-separated fields following the `WIMDA` tag.
pub const WIMDA_FIELD_COUNT: usize = 20;

/// How a raw field token is turned into a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParserKind {
    /// Any finite decimal number
    Decimal,
    /// Compass bearing, 0 to 360 degrees inclusive
    Bearing,
}

/// Position, native unit and parser for one decoded quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Quantity the field is decoded into
    pub quantity: Quantity,
    /// 1-based field position after the tag
    pub position: usize,
    /// Unit the station reports the value in
    pub unit: Unit,
    /// Token parser
    pub kind: ParserKind,
}

impl FieldSpec {
    pub fn new(quantity: Quantity, position: usize, unit: Unit, kind: ParserKind) -> Self {
        Self { quantity, position, unit, kind }
    }
}

/// Static description of one sentence type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Expected sentence tag
    pub tag: String,
    /// Exact number of fields after the tag
    pub field_count: usize,
    /// Decoded fields in schema order
    pub fields: Vec<FieldSpec>,
}

impl FieldSchema {
    /// Create a new schema with validation.
    pub fn new(tag: impl Into<String>, field_count: usize, fields: Vec<FieldSpec>) -> Result<Self> {
        let schema = Self { tag: tag.into(), field_count, fields };
        schema.validate()?;
        Ok(schema)
    }

    /// Schema of the `WIMDA` meteorological composite.
    ///
    /// Layout: pressure inHg, `I`, pressure bar, `B`, air temperature, `C`,
    /// water temperature, `C`, relative humidity, absolute humidity, dew point,
    /// `C`, true direction, `T`, magnetic direction, `M`, speed knots, `N`,
    /// speed m/s, `M`.
    pub fn wimda() -> Self {
        Self {
            tag: WIMDA_TAG.to_string(),
            field_count: WIMDA_FIELD_COUNT,
            fields: vec![
                FieldSpec::new(Quantity::Barometer, 1, Unit::InHg, ParserKind::Decimal),
                FieldSpec::new(Quantity::OutTemp, 5, Unit::DegreeC, ParserKind::Decimal),
                FieldSpec::new(Quantity::OutHumidity, 9, Unit::Percent, ParserKind::Decimal),
                FieldSpec::new(Quantity::WindDir, 13, Unit::DegreeCompass, ParserKind::Bearing),
                FieldSpec::new(Quantity::WindSpeed, 17, Unit::Knot, ParserKind::Decimal),
            ],
        }
    }

    /// Validate the schema for consistency.
    pub fn validate(&self) -> Result<()> {
        if self.tag.is_empty() || self.tag.contains([',', '$', '*']) {
            return Err(StationError::config(format!("invalid sentence tag '{}'", self.tag)));
        }

        let mut seen = HashSet::new();
        for spec in &self.fields {
            if spec.position == 0 || spec.position > self.field_count {
                return Err(StationError::config(format!(
                    "{} field position {} outside 1..={}",
                    spec.quantity.name(),
                    spec.position,
                    self.field_count
                )));
            }

            if !seen.insert(spec.quantity) {
                return Err(StationError::config(format!(
                    "{} declared more than once",
                    spec.quantity.name()
                )));
            }

            if spec.unit.group() != spec.quantity.group() {
                return Err(StationError::config(format!(
                    "{} cannot be reported in {}",
                    spec.quantity.name(),
                    spec.unit
                )));
            }
        }

        Ok(())
    }

    /// Start-of-sentence marker for this schema, e.g. `$WIMDA,`.
    pub fn marker(&self) -> String {
        format!("${},", self.tag)
    }
}
