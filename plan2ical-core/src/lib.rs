//! Core of plan2ical: turns event plan tables into iCalendar documents.
//!
//! The pipeline is leaf-first:
//! - `table` reads delimited text or the first sheet of a spreadsheet into rows
//! - `extract` picks the candidate rows out of a table
//! - `normalize` turns one row into a `NormalizedEvent` or a `Rejection`
//! - `document` collects events into a `CalendarDocument`
//! - `ics` encodes the document into calendar bytes
//!
//! `convert` wires these together and reports what was skipped.

pub mod config;
pub mod convert;
pub mod datetime;
pub mod document;
pub mod error;
pub mod event;
pub mod extract;
pub mod ics;
pub mod normalize;
pub mod table;

pub use config::{CategoryStyle, ConvertConfig};
pub use convert::{Conversion, ConversionReport, Converter};
pub use document::CalendarDocument;
pub use error::{ConvertError, ConvertResult};
pub use event::{EventTime, NormalizedEvent};
pub use table::RawRow;
