//! Input adapters: tables of text cells.
//!
//! A plan is a table whose first five columns are date, time,
//! location/category, title and minimum age. Adapters only produce text;
//! interpreting it is the normalizer's job.

mod delimited;
mod spreadsheet;

use std::path::Path;

pub use delimited::{parse_delimited, parse_delimiter, read_delimited};
pub use spreadsheet::{cell_text, read_spreadsheet};

use crate::error::{ConvertError, ConvertResult};

/// Number of columns a plan row is expected to have.
pub const COLUMN_COUNT: usize = 5;

/// One table row as text cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow(Vec<String>);

impl RawRow {
    pub fn new(cells: Vec<String>) -> Self {
        RawRow(cells)
    }

    pub fn cells(&self) -> &[String] {
        &self.0
    }

    /// Cell text at `index`, empty when the row is shorter.
    pub fn cell(&self, index: usize) -> &str {
        self.0.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every cell is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|c| c.trim().is_empty())
    }
}

impl From<Vec<String>> for RawRow {
    fn from(cells: Vec<String>) -> Self {
        RawRow(cells)
    }
}

impl<const N: usize> From<[&str; N]> for RawRow {
    fn from(cells: [&str; N]) -> Self {
        RawRow(cells.iter().map(|c| c.to_string()).collect())
    }
}

impl<S: Into<String>> FromIterator<S> for RawRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        RawRow(iter.into_iter().map(Into::into).collect())
    }
}

/// Which adapter reads a given file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Delimited { default_delimiter: u8 },
    Spreadsheet,
}

impl InputKind {
    /// Pick the adapter from the file extension.
    pub fn from_path(path: &Path) -> ConvertResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "csv" | "txt" => Ok(InputKind::Delimited {
                default_delimiter: b',',
            }),
            "tsv" => Ok(InputKind::Delimited {
                default_delimiter: b'\t',
            }),
            "ods" | "xlsx" | "xls" | "xlsb" => Ok(InputKind::Spreadsheet),
            _ => Err(ConvertError::UnsupportedInput(path.display().to_string())),
        }
    }
}

/// Read a plan table from `path`. `delimiter` only applies to delimited text.
pub fn read_table(path: &Path, delimiter: Option<&str>) -> ConvertResult<Vec<RawRow>> {
    if !path.is_file() {
        return Err(ConvertError::InputNotFound(path.display().to_string()));
    }

    match InputKind::from_path(path)? {
        InputKind::Delimited { default_delimiter } => {
            let delimiter = match delimiter {
                Some(arg) => parse_delimiter(arg)?,
                None => default_delimiter,
            };
            read_delimited(path, delimiter)
        }
        InputKind::Spreadsheet => {
            if delimiter.is_some() {
                log::debug!("Ignoring delimiter for spreadsheet input {}", path.display());
            }
            read_spreadsheet(path)
        }
    }
}

/// Join the lines of a multi-line cell with single spaces and trim it.
pub(crate) fn flatten_cell(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
