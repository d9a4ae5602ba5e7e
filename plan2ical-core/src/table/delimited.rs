//! Delimited text (CSV and friends).

use std::path::Path;

use super::{RawRow, flatten_cell};
use crate::error::{ConvertError, ConvertResult};

/// Parse a delimiter argument: one ASCII character, or `\t` / `tab`.
pub fn parse_delimiter(arg: &str) -> ConvertResult<u8> {
    match arg {
        "\\t" | "tab" | "TAB" => return Ok(b'\t'),
        _ => {}
    }

    let mut chars = arg.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => Err(ConvertError::InvalidDelimiter(arg.to_string())),
    }
}

/// Read a delimited text file. The bytes must be UTF-8.
pub fn read_delimited(path: &Path, delimiter: u8) -> ConvertResult<Vec<RawRow>> {
    let bytes = std::fs::read(path)?;
    let text = std::str::from_utf8(&bytes)
        .map_err(|e| ConvertError::Encoding(format!("{}: {e}", path.display())))?;

    parse_delimited(text, delimiter)
}

/// Split delimited text into rows. Ragged rows are kept as they are.
pub fn parse_delimited(text: &str, delimiter: u8) -> ConvertResult<Vec<RawRow>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(false)
        .from_reader(text.as_bytes());

    reader
        .records()
        .map(|result| {
            result
                .map(|record| record.iter().map(flatten_cell).collect::<RawRow>())
                .map_err(|e| ConvertError::Delimited(format!("Failed to read record: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert_eq!(parse_delimiter("\\t").unwrap(), b'\t');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert!(matches!(
            parse_delimiter(";;"),
            Err(ConvertError::InvalidDelimiter(_))
        ));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("§").is_err());
    }

    #[test]
    fn test_parse_semicolon_rows() {
        let text = "Datum;Uhrzeit;Ort;Thema;Alter\n\
                    01.08.2026;14:00 Uhr;Planetarium;Sternenhimmel;6\n\
                    ;;;;\n";
        let rows = parse_delimited(text, b';').unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].cells(), ["01.08.2026", "14:00 Uhr", "Planetarium", "Sternenhimmel", "6"]);
        assert!(rows[2].is_blank());
    }

    #[test]
    fn test_ragged_rows_and_quoted_newlines() {
        let text = "01.08.2026,20:00\n02.08.2026,,Wiese,\"Mond\nund Sterne\",\n";
        let rows = parse_delimited(text, b',').unwrap();

        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1].len(), 5);
        assert_eq!(rows[1].cell(3), "Mond und Sterne");
    }

    #[test]
    fn test_bom_is_dropped() {
        let rows = parse_delimited("\u{feff}01.08.2026;20:00", b';').unwrap();
        assert_eq!(rows[0].cell(0), "01.08.2026");
    }

    #[test]
    fn test_non_utf8_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.csv");
        // "Vortrag über" in Latin-1
        std::fs::write(&path, b"01.08.2026;10:00;Halle;Vortrag \xfcber;\n").unwrap();

        assert!(matches!(
            read_delimited(&path, b';'),
            Err(ConvertError::Encoding(_))
        ));
    }
}
