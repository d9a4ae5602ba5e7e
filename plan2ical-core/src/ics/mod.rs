//! iCalendar output.
//!
//! Encoding is done by the `icalendar` crate; this module decides how each
//! event is represented (date vs zoned timestamp, end or no end, where the
//! derived labels go) and cleans up the encoder's output.

mod generate;

pub use generate::{EmitError, EmitFailure, Emitted, Emitter};
