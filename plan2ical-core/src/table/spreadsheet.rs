//! Spreadsheet documents (ODS, XLSX, XLS) via calamine. Only the first sheet
//! is read.

use std::path::Path;

use calamine::{Data, ExcelDateTime, Range, Reader, open_workbook_auto};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use super::{COLUMN_COUNT, RawRow, flatten_cell};
use crate::error::{ConvertError, ConvertResult};

pub fn read_spreadsheet(path: &Path) -> ConvertResult<Vec<RawRow>> {
    log::info!("Reading spreadsheet: {}", path.display());

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ConvertError::Spreadsheet(format!("{}: {e}", path.display())))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| {
            ConvertError::Spreadsheet(format!("{}: workbook has no sheets", path.display()))
        })?
        .map_err(|e| ConvertError::Spreadsheet(format!("{}: {e}", path.display())))?;

    Ok(rows_from_range(&range))
}

/// Rows of the used range, cut or padded to the plan width, blank rows dropped.
fn rows_from_range(range: &Range<Data>) -> Vec<RawRow> {
    // calamine starts the range at the first used column; keep positions stable
    let first_col = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    range
        .rows()
        .filter_map(|cells| {
            let mut texts: Vec<String> = std::iter::repeat(String::new())
                .take(first_col)
                .chain(cells.iter().map(cell_text))
                .collect();
            texts.resize(COLUMN_COUNT, String::new());

            let row = RawRow::new(texts);
            (!row.is_blank()).then_some(row)
        })
        .collect()
}

/// The text a reader would see in a cell.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => flatten_cell(s),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_text(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => serial_text(dt),
        Data::DateTimeIso(s) => iso_datetime_text(s),
        Data::DurationIso(s) => iso_duration_text(s),
    }
}

fn float_text(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

/// Serial date-times: below 1.0 is a time of day, integral is a date.
fn serial_text(dt: &ExcelDateTime) -> String {
    let serial = dt.as_f64();
    match dt.as_datetime() {
        Some(datetime) if serial < 1.0 => clock_text(datetime),
        Some(datetime) if serial.fract() == 0.0 => datetime.format("%d.%m.%Y").to_string(),
        Some(datetime) => format!(
            "{} {}",
            datetime.format("%d.%m.%Y"),
            clock_text(datetime)
        ),
        None => float_text(serial),
    }
}

/// HH:MM rounded to the nearest minute; serial fractions drift by milliseconds.
fn clock_text(datetime: NaiveDateTime) -> String {
    (datetime + TimeDelta::seconds(30)).format("%H:%M").to_string()
}

/// ODS date cells come as ISO 8601 values.
fn iso_datetime_text(value: &str) -> String {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.format("%d.%m.%Y").to_string();
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return format!("{} {}", datetime.format("%d.%m.%Y"), clock_text(datetime));
    }
    value.to_string()
}

/// ODS time cells come as ISO 8601 durations, e.g. `PT14H00M00S`.
fn iso_duration_text(value: &str) -> String {
    parse_iso_clock(value)
        .map(|(hours, minutes)| format!("{hours:02}:{minutes:02}"))
        .unwrap_or_else(|| value.to_string())
}

fn parse_iso_clock(value: &str) -> Option<(u32, u32)> {
    let rest = value.strip_prefix("PT")?;
    let (hours, rest) = rest.split_once('H')?;
    let (minutes, _) = rest.split_once('M').unwrap_or(("0", rest));
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    (hours < 24 && minutes < 60).then_some((hours, minutes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn test_cell_text_variants() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String("  Sternenhimmel ".into())), "Sternenhimmel");
        assert_eq!(cell_text(&Data::String("Mond\nund Sterne".into())), "Mond und Sterne");
        assert_eq!(cell_text(&Data::Float(6.0)), "6");
        assert_eq!(cell_text(&Data::Float(6.5)), "6.5");
        assert_eq!(cell_text(&Data::Int(12)), "12");
        assert_eq!(cell_text(&Data::DateTimeIso("2026-08-01".into())), "01.08.2026");
        assert_eq!(
            cell_text(&Data::DateTimeIso("2026-08-01T14:00:00".into())),
            "01.08.2026 14:00"
        );
        assert_eq!(cell_text(&Data::DurationIso("PT14H00M00S".into())), "14:00");
        assert_eq!(cell_text(&Data::DurationIso("PT9H30M".into())), "09:30");
        assert_eq!(cell_text(&Data::DurationIso("PT36H00M00S".into())), "PT36H00M00S");
    }

    #[test]
    fn test_rows_keep_leading_empty_column() {
        let mut range: Range<Data> = Range::new((1, 1), (2, 3));
        range.set_value((1, 1), Data::String("14:00".into()));
        range.set_value((1, 3), Data::String("Sternenhimmel".into()));

        let rows = rows_from_range(&range);
        // Row 2 is entirely empty and dropped
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), COLUMN_COUNT);
        assert_eq!(rows[0].cell(0), "");
        assert_eq!(rows[0].cell(1), "14:00");
        assert_eq!(rows[0].cell(3), "Sternenhimmel");
    }

    #[test]
    fn test_read_first_sheet_of_xlsx() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Arbeitsplan 2026.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, text) in ["Datum", "Uhrzeit", "Typ", "Thema", "Alter", "Notiz"]
            .iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, *text).unwrap();
        }
        sheet.write_string(1, 0, "01.08.2026").unwrap();
        sheet.write_string(1, 1, "ab 20:00 Uhr").unwrap();
        sheet.write_string(1, 2, "Wiese").unwrap();
        sheet.write_string(1, 3, "Sternbeobachtung").unwrap();
        // row 2 left blank
        sheet.write_string(3, 0, "02.08.2026").unwrap();
        sheet.write_number(3, 4, 6.0).unwrap();

        let other = workbook.add_worksheet();
        other.write_string(0, 0, "ignored").unwrap();
        workbook.save(&path).unwrap();

        let rows = read_spreadsheet(&path).unwrap();
        assert_eq!(rows.len(), 3, "blank row should be dropped: {rows:?}");
        assert!(rows.iter().all(|r| r.len() == COLUMN_COUNT));
        assert_eq!(rows[0].cell(0), "Datum");
        assert_eq!(rows[1].cells(), ["01.08.2026", "ab 20:00 Uhr", "Wiese", "Sternbeobachtung", ""]);
        assert_eq!(rows[2].cell(4), "6");
    }

    #[test]
    fn test_unreadable_spreadsheet_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ods");
        std::fs::write(&path, "not a zip archive").unwrap();

        assert!(matches!(
            read_spreadsheet(&path),
            Err(ConvertError::Spreadsheet(_))
        ));
    }
}
