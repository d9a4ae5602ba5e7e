//! Date/time text parsing for plan cells.
//!
//! Accepted text is enumerated by a `PatternSet`: day-first numeric dates,
//! clock times with an optional localized hour suffix ("14:00 Uhr") and an
//! open-ended marker in front of the time ("ab 20:00").

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// The accepted date/time text patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternSet {
    /// chrono formats for the date cell, tried in order. Two-digit-year
    /// variants come before four-digit ones so "01.08.26" means 2026.
    pub date_formats: Vec<String>,
    /// chrono formats for a clock time. A bare hour ("20") always parses.
    pub time_formats: Vec<String>,
    /// Case-insensitive tokens dropped before parsing, alone or glued to a clock.
    pub noise_tokens: Vec<String>,
    /// Marker at the start of the time cell for an open-ended event.
    pub open_end_marker: String,
}

impl Default for PatternSet {
    fn default() -> Self {
        PatternSet {
            date_formats: ["%d.%m.%y", "%d.%m.%Y", "%d/%m/%y", "%d/%m/%Y", "%Y-%m-%d"]
                .map(String::from)
                .to_vec(),
            time_formats: ["%H:%M", "%H.%M", "%H:%M:%S"].map(String::from).to_vec(),
            noise_tokens: vec!["Uhr".to_string()],
            open_end_marker: "ab".to_string(),
        }
    }
}

/// Date and optional clock time read from a date cell and a time cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    pub date: NaiveDate,
    /// `Some` iff the time cell was non-empty.
    pub time: Option<NaiveTime>,
    pub open_end: bool,
}

impl Moment {
    pub fn naive(&self) -> Option<NaiveDateTime> {
        self.time.map(|t| self.date.and_time(t))
    }
}

impl PatternSet {
    /// Whether the time cell starts with the open-end marker rather than a clock.
    pub fn is_open_end(&self, time_cell: &str) -> bool {
        self.strip_open_end(time_cell).is_some()
    }

    /// Parse a date cell and a time cell. `None` when either is unreadable.
    pub fn parse(&self, date_cell: &str, time_cell: &str) -> Option<Moment> {
        let (date, date_cell_time) = self.parse_date(&self.clean_date(date_cell))?;

        let time_cell = time_cell.trim();
        if time_cell.is_empty() {
            return Some(Moment {
                date,
                time: None,
                open_end: false,
            });
        }

        let open_end = self.is_open_end(time_cell);
        let cleaned = self.clean_time(time_cell);
        let time = if cleaned.is_empty() {
            // Marker without a clock, e.g. just "ab": the clock may sit in the date cell
            date_cell_time.unwrap_or(NaiveTime::MIN)
        } else {
            self.parse_time(&cleaned)?
        };

        Some(Moment {
            date,
            time: Some(time),
            open_end,
        })
    }

    /// Parse a date, also accepting a date cell that carries a clock time.
    pub fn parse_date(&self, text: &str) -> Option<(NaiveDate, Option<NaiveTime>)> {
        for format in &self.date_formats {
            if let Ok(date) = NaiveDate::parse_from_str(text, format) {
                return Some((date, None));
            }
        }

        let (date_text, time_text) = text.split_once(char::is_whitespace)?;
        let date = self
            .date_formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(date_text, format).ok())?;
        let time = self.parse_time(time_text.trim())?;
        Some((date, Some(time)))
    }

    pub fn parse_time(&self, text: &str) -> Option<NaiveTime> {
        for format in &self.time_formats {
            if let Ok(time) = NaiveTime::parse_from_str(text, format) {
                return Some(time);
            }
        }

        // "20 Uhr" leaves a bare hour
        if !text.is_empty() && text.len() <= 2 && text.bytes().all(|b| b.is_ascii_digit()) {
            let hour: u32 = text.parse().ok()?;
            return NaiveTime::from_hms_opt(hour, 0, 0);
        }

        None
    }

    /// Drop noise tokens and a leading weekday ("Sa.", "Fr,") from a date cell.
    pub fn clean_date(&self, date_cell: &str) -> String {
        let mut tokens = self.strip_noise(date_cell);
        if tokens.len() > 1 && is_weekday_token(&tokens[0]) {
            tokens.remove(0);
        }
        tokens.join(" ")
    }

    /// Drop the open-end marker and noise tokens from a time cell.
    pub fn clean_time(&self, time_cell: &str) -> String {
        let time_cell = time_cell.trim();
        let rest = self.strip_open_end(time_cell).unwrap_or(time_cell);
        self.strip_noise(rest).join(" ")
    }

    fn strip_open_end<'a>(&self, time_cell: &'a str) -> Option<&'a str> {
        let marker = self.open_end_marker.trim();
        if marker.is_empty() {
            return None;
        }

        let time_cell = time_cell.trim();
        let head = time_cell.get(..marker.len())?;
        if !head.eq_ignore_ascii_case(marker) {
            return None;
        }

        let rest = &time_cell[marker.len()..];
        match rest.chars().next() {
            None => Some(rest),
            Some(c) if c.is_whitespace() || c.is_ascii_digit() => Some(rest.trim()),
            // "abends" is a word, not the marker
            Some(_) => None,
        }
    }

    fn strip_noise(&self, text: &str) -> Vec<String> {
        text.split_whitespace()
            .filter_map(|token| {
                let mut token = token;
                for noise in &self.noise_tokens {
                    if token.eq_ignore_ascii_case(noise) {
                        return None;
                    }
                    if let Some(clock) = strip_suffix_ignore_case(token, noise) {
                        if clock.ends_with(|c: char| c.is_ascii_digit()) {
                            token = clock;
                        }
                    }
                }
                Some(token.to_string())
            })
            .collect()
    }
}

fn strip_suffix_ignore_case<'a>(token: &'a str, suffix: &str) -> Option<&'a str> {
    let split = token.len().checked_sub(suffix.len())?;
    if !token.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = token.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

fn is_weekday_token(token: &str) -> bool {
    let word = token.trim_end_matches(['.', ',']);
    !word.is_empty() && word.chars().all(char::is_alphabetic)
}
