//! ICS document generation.

use std::collections::HashMap;

use icalendar::{Calendar, Component, EventLike, Property, ValueType};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{CategoryStyle, ConvertConfig};
use crate::document::CalendarDocument;
use crate::event::{EventTime, NormalizedEvent};

/// Why one event could not be encoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    #[error("{field} contains a control character")]
    ControlCharacter { field: &'static str },
}

/// An event left out of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitFailure {
    /// Position in the document's event list.
    pub position: usize,
    pub title: String,
    pub error: EmitError,
}

/// Encoded document plus the events that did not make it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Emitted {
    pub bytes: Vec<u8>,
    pub written: usize,
    pub failures: Vec<EmitFailure>,
}

#[derive(Debug, Clone, Default)]
pub struct Emitter {
    style: CategoryStyle,
    venue: Option<String>,
}

impl Emitter {
    pub fn new(style: CategoryStyle) -> Self {
        Emitter { style, venue: None }
    }

    /// Use `venue` as LOCATION of every event instead of the row's location.
    pub fn with_venue(mut self, venue: Option<String>) -> Self {
        self.venue = venue.filter(|v| !v.trim().is_empty());
        self
    }

    pub fn from_config(config: &ConvertConfig) -> Self {
        Emitter::new(config.category_style).with_venue(config.venue.clone())
    }

    /// Encode the whole document. Events that fail are logged and left out.
    pub fn emit(&self, doc: &CalendarDocument) -> Emitted {
        let mut cal = Calendar::new();
        let mut uids = UidAllocator::new(doc.product_id());
        let mut category_lines = Vec::with_capacity(doc.len());
        let mut failures = Vec::new();

        for (position, event) in doc.events().iter().enumerate() {
            let uid = uids.next(event);
            match self.encode_event(event, &uid) {
                Ok(ics_event) => {
                    cal.push(ics_event);
                    category_lines.push(self.categories_line(event));
                }
                Err(error) => {
                    log::warn!("Error adding event '{}' ({}): {error}", event.title, event.start);
                    failures.push(EmitFailure {
                        position,
                        title: event.title.clone(),
                        error,
                    });
                }
            }
        }

        let cal = cal.done();
        let text = finish_document(&cal.to_string(), doc, &category_lines);

        Emitted {
            bytes: text.into_bytes(),
            written: category_lines.len(),
            failures,
        }
    }

    /// Map one event onto a VEVENT.
    pub fn encode_event(
        &self,
        event: &NormalizedEvent,
        uid: &str,
    ) -> Result<icalendar::Event, EmitError> {
        let location = self
            .venue
            .as_deref()
            .unwrap_or(event.location_or_category.as_str());

        check_text("summary", &event.title)?;
        check_text("location", location)?;
        for label in &event.derived_categories {
            check_text("category", label)?;
        }

        let mut ics_event = icalendar::Event::new();
        ics_event.uid(uid);
        ics_event.summary(&event.title);

        // DTSTAMP is required; derive it from the start so output never
        // depends on the wall clock
        ics_event.timestamp(event.start.to_utc());

        add_datetime_property(&mut ics_event, "DTSTART", &event.start);
        if let Some(ref end) = event.end {
            add_datetime_property(&mut ics_event, "DTEND", end);
        }

        if !location.is_empty() {
            ics_event.location(location);
        }

        if self.style == CategoryStyle::Description && !event.derived_categories.is_empty() {
            ics_event.description(&event.derived_categories.join(", "));
        }

        Ok(ics_event.done())
    }

    fn categories_line(&self, event: &NormalizedEvent) -> Option<String> {
        if self.style != CategoryStyle::Categories || event.derived_categories.is_empty() {
            return None;
        }

        let values: Vec<String> = event
            .derived_categories
            .iter()
            .map(|label| escape_text(label))
            .collect();
        Some(fold_line(&format!("CATEGORIES:{}", values.join(","))))
    }
}

/// Add a DTSTART/DTEND property: bare date, or local time with TZID.
fn add_datetime_property(ics_event: &mut icalendar::Event, name: &str, time: &EventTime) {
    match time {
        EventTime::Date(d) => {
            let mut prop = Property::new(name, d.format("%Y%m%d").to_string());
            prop.append_parameter(ValueType::Date);
            ics_event.append_property(prop);
        }
        EventTime::Zoned(dt) => {
            let mut prop = Property::new(name, dt.format("%Y%m%dT%H%M%S").to_string());
            prop.add_parameter("TZID", dt.timezone().name());
            ics_event.append_property(prop);
        }
    }
}

/// Clean up the encoder output:
/// - calendar-level VERSION and PRODID come from the document
/// - drop CALSCALE:GREGORIAN (it's the default)
/// - add CATEGORIES lines, which are written by hand so the commas
///   between values stay unescaped
/// - bare LF line endings, no trailing whitespace
fn finish_document(
    ics: &str,
    doc: &CalendarDocument,
    category_lines: &[Option<String>],
) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_header = false;
    let mut event_index = 0;

    for line in ics.lines() {
        if line == "BEGIN:VCALENDAR" {
            lines.push(line.to_string());
            lines.push(format!("VERSION:{}", doc.version()));
            lines.push(format!("PRODID:{}", doc.product_id()));
            in_header = true;
            continue;
        }

        if line.starts_with("BEGIN:") {
            in_header = false;
        }

        if in_header
            && (line.starts_with("VERSION:")
                || line.starts_with("PRODID:")
                || line.starts_with("CALSCALE:"))
        {
            continue;
        }

        if line == "END:VEVENT" {
            if let Some(Some(categories)) = category_lines.get(event_index) {
                lines.push(categories.clone());
            }
            event_index += 1;
        }

        lines.push(line.to_string());
    }

    lines.join("\n").trim().to_string()
}

/// Fold a content line at 75 octets (RFC 5545 3.1) without splitting a
/// UTF-8 sequence. Continuation lines start with a single space.
fn fold_line(line: &str) -> String {
    const LIMIT: usize = 75;

    let mut folded = String::with_capacity(line.len() + line.len() / LIMIT * 2);
    let mut width = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > LIMIT {
            folded.push_str("\n ");
            width = 1;
        }
        folded.push(c);
        width += len;
    }
    folded
}

/// Escape a TEXT value (RFC 5545 3.3.11) for a hand-written line.
fn escape_text(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
}

fn check_text(field: &'static str, value: &str) -> Result<(), EmitError> {
    if value.chars().any(|c| c.is_control() && c != '\t') {
        return Err(EmitError::ControlCharacter { field });
    }
    Ok(())
}

/// Stable UIDs: UUIDv5 over product id, start and title. Repeats of the
/// same key get an ordinal so every UID in a document is unique.
struct UidAllocator<'a> {
    product_id: &'a str,
    seen: HashMap<String, usize>,
}

impl<'a> UidAllocator<'a> {
    fn new(product_id: &'a str) -> Self {
        UidAllocator {
            product_id,
            seen: HashMap::new(),
        }
    }

    fn next(&mut self, event: &NormalizedEvent) -> String {
        let key = format!("{}|{}|{}", self.product_id, event.start, event.title);
        let count = self.seen.entry(key.clone()).or_insert(0);
        *count += 1;

        let name = if *count == 1 {
            key
        } else {
            format!("{key}|{count}")
        };
        Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta, TimeZone};
    use chrono_tz::Europe::Berlin;

    fn timed_event() -> NormalizedEvent {
        let start = Berlin.with_ymd_and_hms(2026, 8, 1, 14, 0, 0).unwrap();
        NormalizedEvent {
            start: EventTime::Zoned(start),
            end: Some(EventTime::Zoned(start + TimeDelta::hours(1))),
            has_time: true,
            title: "Sternenhimmel".to_string(),
            location_or_category: "Planetarium".to_string(),
            minimum_age: "6".to_string(),
            derived_categories: vec![
                "planetarium showing".to_string(),
                "from age 6 years".to_string(),
            ],
        }
    }

    fn open_event() -> NormalizedEvent {
        NormalizedEvent {
            start: EventTime::Zoned(Berlin.with_ymd_and_hms(2026, 8, 1, 20, 0, 0).unwrap()),
            end: None,
            has_time: true,
            title: "Sternbeobachtung".to_string(),
            location_or_category: "Wiese".to_string(),
            minimum_age: String::new(),
            derived_categories: vec![],
        }
    }

    fn all_day_event() -> NormalizedEvent {
        NormalizedEvent {
            start: EventTime::Date(NaiveDate::from_ymd_opt(2026, 12, 24).unwrap()),
            end: None,
            has_time: false,
            title: "Weihnachtsbeobachtung".to_string(),
            location_or_category: String::new(),
            minimum_age: String::new(),
            derived_categories: vec![],
        }
    }

    fn emit_text(emitter: &Emitter, events: Vec<NormalizedEvent>) -> String {
        let doc = CalendarDocument::build("-//suhler-sternfreunde.de//", events);
        String::from_utf8(emitter.emit(&doc).bytes).unwrap()
    }

    /// The lines of the n-th VEVENT.
    fn vevent(ics: &str, n: usize) -> Vec<String> {
        ics.split("BEGIN:VEVENT")
            .nth(n + 1)
            .unwrap()
            .split("END:VEVENT")
            .next()
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_calendar_level_properties() {
        let ics = emit_text(&Emitter::default(), vec![timed_event()]);

        assert!(ics.starts_with("BEGIN:VCALENDAR\n"), "ICS:\n{ics}");
        assert!(ics.ends_with("END:VCALENDAR"), "ICS:\n{ics}");
        assert!(ics.lines().any(|l| l == "VERSION:2.0"));
        assert!(ics.lines().any(|l| l == "PRODID:-//suhler-sternfreunde.de//"));
        assert_eq!(ics.lines().filter(|l| l.starts_with("PRODID:")).count(), 1);
        assert!(!ics.contains("CALSCALE"), "CALSCALE should be dropped. ICS:\n{ics}");
        assert!(!ics.contains('\r'), "Line endings should be bare LF");
    }

    #[test]
    fn test_timed_event_has_zoned_start_and_end() {
        let ics = emit_text(&Emitter::default(), vec![timed_event()]);
        let lines = vevent(&ics, 0);

        assert!(
            lines.contains(&"DTSTART;TZID=Europe/Berlin:20260801T140000".to_string()),
            "ICS:\n{ics}"
        );
        assert!(
            lines.contains(&"DTEND;TZID=Europe/Berlin:20260801T150000".to_string()),
            "ICS:\n{ics}"
        );
        assert!(lines.contains(&"SUMMARY:Sternenhimmel".to_string()));
        assert!(lines.contains(&"LOCATION:Planetarium".to_string()));
        // 14:00 CEST
        assert!(lines.contains(&"DTSTAMP:20260801T120000Z".to_string()), "ICS:\n{ics}");
        assert!(lines.iter().any(|l| l.starts_with("UID:")));
    }

    #[test]
    fn test_open_ended_event_has_no_dtend() {
        let ics = emit_text(&Emitter::default(), vec![open_event()]);
        let lines = vevent(&ics, 0);

        assert!(lines.contains(&"DTSTART;TZID=Europe/Berlin:20260801T200000".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("DTEND")), "ICS:\n{ics}");
        assert!(!lines.iter().any(|l| l.starts_with("DESCRIPTION")));
    }

    #[test]
    fn test_all_day_event_has_value_date() {
        let ics = emit_text(&Emitter::default(), vec![all_day_event()]);
        let lines = vevent(&ics, 0);

        assert!(
            lines.contains(&"DTSTART;VALUE=DATE:20261224".to_string()),
            "DTSTART should have VALUE=DATE parameter. ICS:\n{ics}"
        );
        assert!(!lines.iter().any(|l| l.starts_with("DTEND")));
        assert!(!ics.contains("TZID"));
        assert!(!lines.iter().any(|l| l.starts_with("LOCATION")), "empty location is omitted");
    }

    #[test]
    fn test_labels_as_description() {
        let ics = emit_text(&Emitter::new(CategoryStyle::Description), vec![timed_event()]);
        let lines = vevent(&ics, 0);

        let description = lines
            .iter()
            .find(|l| l.starts_with("DESCRIPTION:"))
            .expect("Should have DESCRIPTION line");
        assert!(description.contains("planetarium showing"));
        assert!(description.contains("from age 6 years"));
        assert!(
            description.find("planetarium").unwrap() < description.find("from age").unwrap(),
            "location label comes first: {description}"
        );
        assert!(!ics.contains("CATEGORIES"));
    }

    #[test]
    fn test_labels_as_categories() {
        let mut event = timed_event();
        event.derived_categories.push("a, b".to_string());
        let ics = emit_text(&Emitter::new(CategoryStyle::Categories), vec![event, open_event()]);

        let first = vevent(&ics, 0);
        assert!(
            first.contains(&"CATEGORIES:planetarium showing,from age 6 years,a\\, b".to_string()),
            "ICS:\n{ics}"
        );
        assert!(!first.iter().any(|l| l.starts_with("DESCRIPTION")));
        // No labels, no CATEGORIES line
        assert!(!vevent(&ics, 1).iter().any(|l| l.starts_with("CATEGORIES")));
    }

    #[test]
    fn test_long_categories_line_is_folded() {
        let mut event = timed_event();
        event.derived_categories = vec![format!("ab {} Jahren", "ä".repeat(60))];
        let ics = emit_text(&Emitter::new(CategoryStyle::Categories), vec![event]);

        let lines = vevent(&ics, 0);
        let start = lines
            .iter()
            .position(|l| l.starts_with("CATEGORIES:"))
            .unwrap();
        assert!(lines[start + 1].starts_with(' '), "ICS:\n{ics}");
        for line in &lines {
            assert!(line.len() <= 75, "line too long: {line}");
        }

        let unfolded: String = lines[start..]
            .iter()
            .enumerate()
            .take_while(|(i, l)| *i == 0 || l.starts_with(' '))
            .map(|(_, l)| l.strip_prefix(' ').unwrap_or(l))
            .collect();
        assert_eq!(unfolded, format!("CATEGORIES:ab {} Jahren", "ä".repeat(60)));
    }

    #[test]
    fn test_venue_overrides_location() {
        let emitter = Emitter::default().with_venue(Some("Sternwarte Suhl".to_string()));
        let ics = emit_text(&emitter, vec![timed_event(), all_day_event()]);

        assert!(vevent(&ics, 0).contains(&"LOCATION:Sternwarte Suhl".to_string()));
        assert!(vevent(&ics, 1).contains(&"LOCATION:Sternwarte Suhl".to_string()));
    }

    #[test]
    fn test_events_keep_document_order() {
        let ics = emit_text(
            &Emitter::default(),
            vec![all_day_event(), timed_event(), open_event()],
        );
        let summaries: Vec<_> = ics.lines().filter(|l| l.starts_with("SUMMARY:")).collect();
        assert_eq!(
            summaries,
            vec![
                "SUMMARY:Weihnachtsbeobachtung",
                "SUMMARY:Sternenhimmel",
                "SUMMARY:Sternbeobachtung"
            ]
        );
    }

    #[test]
    fn test_output_is_deterministic() {
        let events = vec![timed_event(), open_event(), all_day_event()];
        let first = emit_text(&Emitter::default(), events.clone());
        let second = emit_text(&Emitter::default(), events);
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_events_get_distinct_uids() {
        let ics = emit_text(&Emitter::default(), vec![timed_event(), timed_event()]);
        let uids: Vec<_> = ics.lines().filter(|l| l.starts_with("UID:")).collect();
        assert_eq!(uids.len(), 2);
        assert_ne!(uids[0], uids[1]);
    }

    #[test]
    fn test_failed_event_is_skipped() {
        let mut broken = open_event();
        broken.title = "Mond\u{7}".to_string();
        let doc = CalendarDocument::build("-//test//", vec![timed_event(), broken, all_day_event()]);

        let emitted = Emitter::default().emit(&doc);

        assert_eq!(emitted.written, 2);
        assert_eq!(
            emitted.failures,
            vec![EmitFailure {
                position: 1,
                title: "Mond\u{7}".to_string(),
                error: EmitError::ControlCharacter { field: "summary" },
            }]
        );
        let ics = String::from_utf8(emitted.bytes).unwrap();
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
    }

    #[test]
    fn test_empty_document_is_valid_calendar() {
        let ics = emit_text(&Emitter::default(), vec![]);
        assert!(ics.starts_with("BEGIN:VCALENDAR"));
        assert!(ics.ends_with("END:VCALENDAR"));
        assert!(!ics.contains("VEVENT"));
    }
}
