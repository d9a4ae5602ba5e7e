//! The conversion pipeline and its report.
//!
//! table → extract → normalize (row by row) → document → emit.
//! This is the one place where skips, rejections and encode failures are
//! collected and logged.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::ConvertConfig;
use crate::document::CalendarDocument;
use crate::error::ConvertResult;
use crate::event::NormalizedEvent;
use crate::extract::{RowExtractor, SkippedRow};
use crate::ics::{EmitFailure, Emitter};
use crate::normalize::{Normalizer, Rejection};
use crate::table::{RawRow, read_table};

/// A candidate row the normalizer turned down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRejection {
    /// Zero-based position in the input table.
    pub index: usize,
    pub reason: Rejection,
}

/// What happened to the rows of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    pub table_rows: usize,
    pub candidates: usize,
    pub skipped: Vec<SkippedRow>,
    pub rejected: Vec<RowRejection>,
    pub encode_failures: Vec<EmitFailure>,
    pub events_written: usize,
}

impl ConversionReport {
    fn log_summary(&self) {
        log::info!(
            "{} of {} table rows converted ({} skipped, {} rejected, {} failed to encode)",
            self.events_written,
            self.table_rows,
            self.skipped.len(),
            self.rejected.len(),
            self.encode_failures.len()
        );
    }
}

#[derive(Debug, Clone)]
pub struct Conversion {
    pub document: CalendarDocument,
    pub bytes: Vec<u8>,
    pub report: ConversionReport,
}

#[derive(Debug, Clone)]
pub struct Converter {
    extractor: RowExtractor,
    normalizer: Normalizer,
    emitter: Emitter,
    product_id: String,
}

impl Converter {
    pub fn new(config: &ConvertConfig) -> ConvertResult<Self> {
        config.validate()?;

        Ok(Converter {
            extractor: RowExtractor::new(config.max_events)
                .with_header_marker(config.header_marker()),
            normalizer: Normalizer::new(config)?,
            emitter: Emitter::from_config(config),
            product_id: config.product_id.clone(),
        })
    }

    /// Normalize every candidate row of `table`, recording what was dropped.
    pub fn normalize_table(
        &self,
        table: &[RawRow],
        report: &mut ConversionReport,
    ) -> Vec<NormalizedEvent> {
        let extraction = self.extractor.extract(table);

        for skipped in &extraction.skipped {
            log::debug!("Skipping row {}: {}", skipped.index + 1, skipped.reason);
        }
        report.table_rows = table.len();
        report.candidates = extraction.rows.len();
        report.skipped = extraction.skipped;

        let mut events = Vec::with_capacity(extraction.rows.len());
        for candidate in extraction.rows {
            match self.normalizer.normalize(&candidate.row) {
                Ok(event) => events.push(event),
                Err(reason) => {
                    log::warn!("Row {}: {reason}", candidate.index + 1);
                    report.rejected.push(RowRejection {
                        index: candidate.index,
                        reason,
                    });
                }
            }
        }

        events
    }

    /// Convert an in-memory table. Never fails; see the report for losses.
    pub fn convert(&self, table: &[RawRow]) -> Conversion {
        let mut report = ConversionReport::default();

        let events = self.normalize_table(table, &mut report);
        let document = CalendarDocument::build(self.product_id.clone(), events);

        let emitted = self.emitter.emit(&document);
        report.events_written = emitted.written;
        report.encode_failures = emitted.failures;
        report.log_summary();

        Conversion {
            document,
            bytes: emitted.bytes,
            report,
        }
    }

    /// Read `input` with the matching adapter and convert it.
    pub fn convert_file(&self, input: &Path, delimiter: Option<&str>) -> ConvertResult<Conversion> {
        let table = read_table(input, delimiter)?;
        log::debug!("Read {} rows from {}", table.len(), input.display());
        Ok(self.convert(&table))
    }
}

/// `<input>.ics` next to the input file.
pub fn default_output_path(input: &Path) -> PathBuf {
    let mut path: OsString = input.as_os_str().to_owned();
    path.push(".ics");
    PathBuf::from(path)
}
