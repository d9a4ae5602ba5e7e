//! Normalized event types.
//!
//! A `NormalizedEvent` is what one plan row turns into. It is built once by
//! the normalizer and only read afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Start or end of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTime {
    /// Calendar date only: no time of day, no zone.
    Date(NaiveDate),
    /// Instant in the regional zone.
    Zoned(DateTime<Tz>),
}

impl EventTime {
    /// UTC instant; dates count from midnight UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            EventTime::Date(d) => d.and_time(chrono::NaiveTime::MIN).and_utc(),
            EventTime::Zoned(dt) => dt.with_timezone(&Utc),
        }
    }
}

impl std::fmt::Display for EventTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::Zoned(dt) => write!(f, "{} {}", dt.format("%Y-%m-%dT%H:%M"), dt.timezone().name()),
        }
    }
}

/// A calendar event built from one plan row.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub start: EventTime,
    /// `None` for all-day and open-ended events.
    pub end: Option<EventTime>,
    /// Whether the row had a time of day.
    pub has_time: bool,
    pub title: String,
    pub location_or_category: String,
    pub minimum_age: String,
    /// Labels inferred from the location keyword and the minimum age.
    pub derived_categories: Vec<String>,
}

impl NormalizedEvent {
    pub fn is_all_day(&self) -> bool {
        !self.has_time
    }

    /// Timed event without an end: starts at a known time, runs open.
    pub fn is_open_ended(&self) -> bool {
        self.has_time && self.end.is_none()
    }
}

impl std::fmt::Display for NormalizedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.title, self.start)
    }
}
