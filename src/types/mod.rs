//! Core types for station telemetry.
//!
//! - [`Frame`] is one sentence lifted out of the byte stream
//! - [`FieldSchema`] describes where each quantity sits in a sentence and
//!   which unit the station reports it in
//! - [`MeasurementRecord`] holds decoded values in one [`UnitSystem`]
//! - [`LoopPacket`] is a record stamped with its read time
//!
//! ## Usage Example
//!
//! ```rust
//! use nm150::types::{FieldSchema, Quantity, Unit};
//!
//! let schema = FieldSchema::wimda();
//! let wind = schema.fields.iter().find(|f| f.quantity == Quantity::WindSpeed).unwrap();
//! assert_eq!(wind.unit, Unit::Knot);
//! assert_eq!(wind.position, 17);
//! ```

mod frame;
mod record;
mod schema;
mod units;
mod update_rate;

pub use frame::Frame;
pub use record::{LoopPacket, MeasurementRecord, Quantity};
pub use schema::{FieldSchema, FieldSpec, ParserKind, WIMDA_FIELD_COUNT, WIMDA_TAG};
pub use units::{Unit, UnitGroup, UnitSystem};
pub use update_rate::UpdateRate;
