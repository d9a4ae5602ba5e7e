//! Row extraction: which table rows are worth normalizing.

use std::fmt;

use crate::table::{COLUMN_COUNT, RawRow};

/// A row that passed the structural checks, with its table position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    pub index: usize,
    pub row: RawRow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Empty,
    BlankDate,
    TooFewColumns(usize),
    Header,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Empty => write!(f, "empty row"),
            SkipReason::BlankDate => write!(f, "blank date cell"),
            SkipReason::TooFewColumns(n) => {
                write!(f, "{n} of {COLUMN_COUNT} required columns")
            }
            SkipReason::Header => write!(f, "header row"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedRow {
    pub index: usize,
    pub reason: SkipReason,
}

/// Result of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub rows: Vec<CandidateRow>,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone)]
pub struct RowExtractor {
    limit: usize,
    header_marker: Option<String>,
}

impl RowExtractor {
    pub fn new(limit: usize) -> Self {
        RowExtractor {
            limit,
            header_marker: None,
        }
    }

    /// Skip the first candidate if its date cell contains `marker`.
    pub fn with_header_marker(mut self, marker: Option<&str>) -> Self {
        self.header_marker = marker.map(str::to_string);
        self
    }

    /// Collect at most `limit` candidate rows in table order. Never fails.
    pub fn extract(&self, table: &[RawRow]) -> Extraction {
        let mut extraction = Extraction::default();

        for (index, row) in table.iter().enumerate() {
            if extraction.rows.len() >= self.limit {
                break;
            }

            match self.check(row, extraction.rows.is_empty()) {
                Some(reason) => extraction.skipped.push(SkippedRow { index, reason }),
                None => extraction.rows.push(CandidateRow {
                    index,
                    row: row.clone(),
                }),
            }
        }

        extraction
    }

    fn check(&self, row: &RawRow, first_candidate: bool) -> Option<SkipReason> {
        if row.is_empty() || row.is_blank() {
            return Some(SkipReason::Empty);
        }
        if row.cell(0).trim().is_empty() {
            return Some(SkipReason::BlankDate);
        }
        if row.len() < COLUMN_COUNT {
            return Some(SkipReason::TooFewColumns(row.len()));
        }
        if first_candidate {
            if let Some(marker) = &self.header_marker {
                if row.cell(0).contains(marker.as_str()) {
                    return Some(SkipReason::Header);
                }
            }
        }
        None
    }
}

/// Candidate rows of `table`, at most `limit` of them.
pub fn extract(table: &[RawRow], limit: usize) -> Vec<CandidateRow> {
    RowExtractor::new(limit).extract(table).rows
}
