//! Event normalization: one plan row in, one event (or a rejection) out.
//!
//! The only reason to reject a row is an unreadable date/time. Every other
//! field falls back to a default so messy plans still yield as many events
//! as possible.

use chrono::TimeDelta;
use chrono_tz::Tz;
use thiserror::Error;

use crate::config::{ConvertConfig, Labels};
use crate::datetime::PatternSet;
use crate::error::ConvertResult;
use crate::event::{EventTime, NormalizedEvent};
use crate::table::RawRow;

/// Why a row produced no event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("date parse error: '{text}'")]
    DateParse { text: String },

    #[error("date parse error: '{text}' does not exist in {zone}")]
    NonexistentLocalTime { text: String, zone: String },
}

/// The named fields of a plan row. Column positions are only known here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowFields<'a> {
    pub date: &'a str,
    pub time: &'a str,
    pub location_or_category: &'a str,
    pub title: &'a str,
    pub minimum_age: &'a str,
}

impl<'a> RowFields<'a> {
    const DATE: usize = 0;
    const TIME: usize = 1;
    const LOCATION: usize = 2;
    const TITLE: usize = 3;
    const MINIMUM_AGE: usize = 4;

    /// Trimmed cells; missing columns read as empty.
    pub fn from_row(row: &'a RawRow) -> Self {
        RowFields {
            date: row.cell(Self::DATE).trim(),
            time: row.cell(Self::TIME).trim(),
            location_or_category: row.cell(Self::LOCATION).trim(),
            title: row.cell(Self::TITLE).trim(),
            minimum_age: row.cell(Self::MINIMUM_AGE).trim(),
        }
    }

    /// Date and time as one text, for diagnostics.
    pub fn when_text(&self) -> String {
        format!("{} {}", self.date, self.time).trim().to_string()
    }
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    zone: Tz,
    patterns: PatternSet,
    labels: Labels,
    untitled: String,
    duration: TimeDelta,
}

impl Normalizer {
    pub fn new(config: &ConvertConfig) -> ConvertResult<Self> {
        Ok(Normalizer {
            zone: config.zone()?,
            patterns: config.patterns.clone(),
            labels: config.labels.clone(),
            untitled: config.untitled.clone(),
            duration: TimeDelta::minutes(i64::from(config.event_minutes)),
        })
    }

    pub fn normalize(&self, row: &RawRow) -> Result<NormalizedEvent, Rejection> {
        let fields = RowFields::from_row(row);

        let moment = self
            .patterns
            .parse(fields.date, fields.time)
            .ok_or_else(|| Rejection::DateParse {
                text: fields.when_text(),
            })?;

        let (start, end) = match moment.naive() {
            Some(local) => {
                // DST fall-back: the earlier of the two instants
                let start = local
                    .and_local_timezone(self.zone)
                    .earliest()
                    .ok_or_else(|| Rejection::NonexistentLocalTime {
                        text: fields.when_text(),
                        zone: self.zone.name().to_string(),
                    })?;
                let end = (!moment.open_end).then(|| EventTime::Zoned(start + self.duration));
                (EventTime::Zoned(start), end)
            }
            None => (EventTime::Date(moment.date), None),
        };

        let title = if fields.title.is_empty() {
            self.untitled.clone()
        } else {
            fields.title.to_string()
        };

        Ok(NormalizedEvent {
            start,
            end,
            has_time: moment.time.is_some(),
            title,
            location_or_category: fields.location_or_category.to_string(),
            minimum_age: fields.minimum_age.to_string(),
            derived_categories: self.derive_categories(&fields),
        })
    }

    /// Location keyword label first, then the age label.
    fn derive_categories(&self, fields: &RowFields<'_>) -> Vec<String> {
        let mut categories = Vec::new();
        if !self.labels.keyword.is_empty()
            && fields.location_or_category.contains(self.labels.keyword.as_str())
        {
            categories.push(self.labels.keyword_label.clone());
        }
        if !fields.minimum_age.is_empty() {
            categories.push(self.labels.age_label(fields.minimum_age));
        }
        categories
    }
}
