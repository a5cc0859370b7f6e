//! Schema-driven sentence decoding with unit normalization
//!
//! Decoding is all-or-nothing: a record is produced only when the tag, the
//! field count and every schema field check out. Any failure is a format
//! error for that frame alone; the decoder keeps no state between calls.
//!
//! ```rust
//! use nm150::{Frame, FieldSchema, StandardConverter, UnitSystem, decode};
//!
//! let frame = Frame::new("WIMDA,29.92,I,1.0132,B,20.0,C,,C,55.0,,11.1,C,180.0,T,178.0,M,10.0,N,5.1,M");
//! let record = decode(&frame, &FieldSchema::wimda(), &StandardConverter, UnitSystem::Us)?;
//! assert!((record.out_temp().unwrap() - 68.0).abs() < 1e-3);
//! # Ok::<(), nm150::StationError>(())
//! ```

use std::sync::Arc;
use tracing::trace;

use crate::convert::{StandardConverter, UnitConverter};
use crate::types::{FieldSchema, Frame, MeasurementRecord, ParserKind, UnitSystem};
use crate::{Result, StationError};

/// Decode `frame` against `schema`, converting every value into `system`.
pub fn decode(
    frame: &Frame,
    schema: &FieldSchema,
    converter: &dyn UnitConverter,
    system: UnitSystem,
) -> Result<MeasurementRecord> {
    let tag = frame.tag();
    if tag != schema.tag {
        return Err(StationError::format(
            &schema.tag,
            format!("unexpected sentence tag '{}'", tag),
        ));
    }

    let mut fields: Vec<&str> = frame.fields().collect();
    if fields.len() != schema.field_count {
        return Err(StationError::format(
            &schema.tag,
            format!("expected {} fields, found {}", schema.field_count, fields.len()),
        ));
    }

    // A trailing checksum is tolerated but not verified
    if let Some(last) = fields.last_mut() {
        if let Some((value, _checksum)) = last.split_once('*') {
            *last = value;
        }
    }

    let mut record = MeasurementRecord::new(system);
    for spec in &schema.fields {
        let token = fields
            .get(spec.position.wrapping_sub(1))
            .ok_or_else(|| {
                StationError::config(format!(
                    "{} field position {} outside 1..={}",
                    spec.quantity.name(),
                    spec.position,
                    fields.len()
                ))
            })?
            .trim();
        let raw = parse_token(token, spec.kind).ok_or_else(|| {
            StationError::format(
                &schema.tag,
                format!(
                    "field {} ({}) has invalid value '{}'",
                    spec.position,
                    spec.quantity.name(),
                    token
                ),
            )
        })?;

        let target = system.unit_for(spec.quantity.group());
        let value = converter.convert(raw, spec.unit, target)?;
        trace!(quantity = spec.quantity.name(), raw, value, "Decoded field");
        record.insert(spec.quantity, value);
    }

    Ok(record)
}

fn parse_token(token: &str, kind: ParserKind) -> Option<f64> {
    if token.is_empty() {
        return None;
    }
    let value: f64 = token.parse().ok().filter(|v: &f64| v.is_finite())?;
    match kind {
        ParserKind::Decimal => Some(value),
        ParserKind::Bearing => (0.0..=360.0).contains(&value).then_some(value),
    }
}

/// Decoder bound to one schema, converter and target unit system.
#[derive(Clone)]
pub struct SentenceDecoder {
    schema: Arc<FieldSchema>,
    converter: Arc<dyn UnitConverter>,
    system: UnitSystem,
}

impl SentenceDecoder {
    /// WIMDA decoder using the standard converter
    pub fn wimda(system: UnitSystem) -> Self {
        Self::new(Arc::new(FieldSchema::wimda()), Arc::new(StandardConverter), system)
    }

    pub fn new(
        schema: Arc<FieldSchema>,
        converter: Arc<dyn UnitConverter>,
        system: UnitSystem,
    ) -> Self {
        Self { schema, converter, system }
    }

    pub fn decode_frame(&self, frame: &Frame) -> Result<MeasurementRecord> {
        decode(frame, &self.schema, self.converter.as_ref(), self.system)
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn system(&self) -> UnitSystem {
        self.system
    }
}

impl std::fmt::Debug for SentenceDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceDecoder")
            .field("tag", &self.schema.tag)
            .field("system", &self.system)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{SAMPLE_WIMDA, wimda_body};
    use crate::types::{Quantity, Unit};

    const TOLERANCE: f64 = 1e-3;

    fn decode_us(text: &str) -> Result<MeasurementRecord> {
        SentenceDecoder::wimda(UnitSystem::Us).decode_frame(&Frame::new(text))
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("quantity missing from record");
        assert!((actual - expected).abs() < TOLERANCE, "{} != {}", actual, expected);
    }

    #[test]
    fn decodes_sample_into_us_units() {
        let record = decode_us(SAMPLE_WIMDA).unwrap();
        assert_eq!(record.system(), UnitSystem::Us);
        assert_eq!(record.len(), 5);
        assert_close(record.barometer(), 29.92);
        assert_close(record.out_temp(), 68.0);
        assert_close(record.out_humidity(), 55.0);
        assert_close(record.wind_dir(), 180.0);
        assert_close(record.wind_speed(), 11.5078);
    }

    #[test]
    fn decodes_into_metric_units() {
        let record = SentenceDecoder::wimda(UnitSystem::MetricWx)
            .decode_frame(&Frame::new(SAMPLE_WIMDA))
            .unwrap();
        assert!((record.barometer().unwrap() - 1013.21).abs() < 0.01);
        assert_close(record.out_temp(), 20.0);
        assert_close(record.wind_speed(), 5.1444);

        let record = SentenceDecoder::wimda(UnitSystem::Metric)
            .decode_frame(&Frame::new(SAMPLE_WIMDA))
            .unwrap();
        assert_close(record.wind_speed(), 18.52);
    }

    #[test]
    fn checksum_suffix_is_ignored() {
        let with_checksum = format!("{}*3F", SAMPLE_WIMDA);
        let record = decode_us(&with_checksum).unwrap();
        assert_close(record.out_temp(), 68.0);
    }

    #[test]
    fn wrong_tag_is_format_error() {
        let err = decode_us(&SAMPLE_WIMDA.replacen("WIMDA", "WIMWV", 1)).unwrap_err();
        assert!(err.is_format_error());
        assert!(err.to_string().contains("WIMWV"));
    }

    #[test]
    fn too_few_fields_is_format_error() {
        let err = decode_us("WIMDA,29.92,I,1.0132,B,20.0,C").unwrap_err();
        assert!(err.is_format_error());
        assert!(err.to_string().contains("expected 20 fields, found 6"));
    }

    #[test]
    fn too_many_fields_is_format_error() {
        let err = decode_us(&format!("{},extra", SAMPLE_WIMDA)).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn empty_required_field_is_format_error() {
        let body = SAMPLE_WIMDA.replace(",20.0,C,", ",,C,");
        let err = decode_us(&body).unwrap_err();
        assert!(err.is_format_error());
        assert!(err.to_string().contains("outTemp"));
    }

    #[test]
    fn non_numeric_required_field_is_format_error() {
        let body = SAMPLE_WIMDA.replace(",55.0,", ",wet,");
        assert!(decode_us(&body).unwrap_err().is_format_error());
    }

    #[test]
    fn bearing_out_of_range_is_format_error() {
        let body = wimda_body(29.92, 20.0, 55.0, 400.0, 10.0);
        assert!(decode_us(&body).unwrap_err().is_format_error());
    }

    #[test]
    fn optional_fields_may_be_empty() {
        let body = "WIMDA,30.01,I,,B,-3.5,C,,C,80,,,C,0,T,,M,0,N,,M";
        let record = decode_us(body).unwrap();
        assert_close(record.barometer(), 30.01);
        assert_close(record.out_temp(), 25.7);
        assert_close(record.wind_speed(), 0.0);
    }

    #[test]
    fn converter_errors_propagate() {
        struct NoConversions;
        impl UnitConverter for NoConversions {
            fn convert(&self, _value: f64, from: Unit, to: Unit) -> Result<f64> {
                Err(StationError::UnitConversion { from, to })
            }
        }

        let decoder = SentenceDecoder::new(
            Arc::new(FieldSchema::wimda()),
            Arc::new(NoConversions),
            UnitSystem::Us,
        );
        let err = decoder.decode_frame(&Frame::new(SAMPLE_WIMDA)).unwrap_err();
        assert!(matches!(err, StationError::UnitConversion { .. }));
    }

    #[test]
    fn custom_schema() {
        let schema = FieldSchema::new(
            "XXTMP",
            2,
            vec![crate::types::FieldSpec::new(
                Quantity::OutTemp,
                2,
                Unit::DegreeF,
                ParserKind::Decimal,
            )],
        )
        .unwrap();
        let record =
            decode(&Frame::new("XXTMP,ignored,50"), &schema, &StandardConverter, UnitSystem::Metric)
                .unwrap();
        assert_close(record.out_temp(), 10.0);
    }

    #[test]
    fn unvalidated_schema_position_zero_is_an_error() {
        let schema = FieldSchema {
            tag: "XXTMP".to_string(),
            field_count: 2,
            fields: vec![crate::types::FieldSpec::new(Quantity::OutTemp, 0, Unit::DegreeC, ParserKind::Decimal)],
        };
        let err = decode(&Frame::new("XXTMP,1,2"), &schema, &StandardConverter, UnitSystem::Us).unwrap_err();
        assert!(matches!(err, StationError::Config { .. }));
    }

    #[test]
    fn deserialized_schema_position_past_fields_is_an_error() {
        let schema: FieldSchema = serde_json::from_str(
            r#"{"tag":"XXTMP","field_count":2,"fields":[
                {"quantity":"outTemp","position":25,"unit":"degree_C","kind":"Decimal"}]}"#,
        )
        .unwrap();
        let err = decode(&Frame::new("XXTMP,1,2"), &schema, &StandardConverter, UnitSystem::Us).unwrap_err();
        assert!(matches!(err, StationError::Config { .. }));
        assert!(err.to_string().contains("25"));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn decoded_values_match_inputs(
                pressure in 25.0f64..32.0,
                temp in -40.0f64..50.0,
                humidity in 0.0f64..100.0,
                dir in 0.0f64..360.0,
                knots in 0.0f64..100.0
            ) {
                let body = wimda_body(pressure, temp, humidity, dir, knots);
                let record = SentenceDecoder::wimda(UnitSystem::MetricWx)
                    .decode_frame(&Frame::new(body))
                    .unwrap();
                // Sentence values are rounded to 0.1 (0.01 for pressure)
                prop_assert!((record.out_temp().unwrap() - temp).abs() <= 0.051);
                prop_assert!((record.out_humidity().unwrap() - humidity).abs() <= 0.051);
                prop_assert!(record.wind_dir().unwrap() >= 0.0);
                prop_assert!(record.wind_speed().unwrap() >= 0.0);
            }

            #[test]
            fn garbage_never_panics(text in "WIMDA[,0-9.A-Z*-]{0,120}") {
                let _ = decode_us(&text);
            }
        }
    }
}
