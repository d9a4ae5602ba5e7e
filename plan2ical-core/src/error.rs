//! Error types for plan2ical.
//!
//! Only run-level failures live here. Row rejections and per-event encode
//! failures are ordinary values (see `normalize::Rejection` and
//! `ics::EmitError`) and never abort a conversion.

use thiserror::Error;

/// Errors that abort a conversion run before any output is written.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("Unsupported input type '{0}' (expected .csv, .tsv, .txt, .ods, .xlsx, .xls or .xlsb)")]
    UnsupportedInput(String),

    #[error("Invalid delimiter '{0}': expected a single ASCII character")]
    InvalidDelimiter(String),

    #[error("Input is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("Delimited text error: {0}")]
    Delimited(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for plan2ical operations.
pub type ConvertResult<T> = Result<T, ConvertError>;
