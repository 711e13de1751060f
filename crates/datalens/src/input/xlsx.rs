//! XLSX reader. Only the first worksheet is read; its first row is the header.

use std::io::Cursor;

use calamine::{Data, DataType, Reader, Xlsx};

use crate::error::{LensError, Result};
use super::format::DataFormat;
use super::source::normalize_headers;
use super::value::{RawRow, RawValue};

pub(super) fn read_first_sheet(bytes: &[u8]) -> Result<(Vec<String>, Vec<RawRow>)> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| LensError::parse(DataFormat::Xlsx, format!("failed to open workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LensError::parse(DataFormat::Xlsx, "workbook has no worksheets"))?
        .map_err(|e| LensError::parse(DataFormat::Xlsx, format!("failed to read worksheet: {}", e)))?;

    let mut sheet_rows = range.rows();
    let Some(header_row) = sheet_rows.next() else {
        return Ok((Vec::new(), Vec::new()));
    };

    let headers = normalize_headers(header_row.iter().map(header_text));

    let rows = sheet_rows
        .filter(|cells| !cells.iter().all(|c| c.is_empty()))
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .map(|(idx, name)| {
                    let value = cells.get(idx).map(cell_value).unwrap_or(RawValue::Null);
                    (name.clone(), value)
                })
                .collect()
        })
        .collect();

    Ok((headers, rows))
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        _ => cell_value(cell).to_string(),
    }
}

/// Convert one spreadsheet cell into a raw value.
pub(super) fn cell_value(cell: &Data) -> RawValue {
    match cell {
        Data::Empty | Data::Error(_) => RawValue::Null,
        Data::Int(i) => RawValue::Number(*i as f64),
        Data::Float(f) => RawValue::Number(*f),
        Data::Bool(b) => RawValue::Bool(*b),
        Data::String(s) => RawValue::Text(s.clone()),
        // Date cells surface as ISO dates so inference classifies them
        other => match other.as_date() {
            Some(date) => RawValue::Text(date.format("%Y-%m-%d").to_string()),
            None => RawValue::Text(
                other
                    .as_string()
                    .unwrap_or_else(|| other.to_string()),
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_mapping() {
        assert_eq!(cell_value(&Data::Empty), RawValue::Null);
        assert_eq!(cell_value(&Data::Int(7)), RawValue::Number(7.0));
        assert_eq!(cell_value(&Data::Float(1.5)), RawValue::Number(1.5));
        assert_eq!(cell_value(&Data::Bool(true)), RawValue::Bool(true));
        assert_eq!(
            cell_value(&Data::String("abc".to_string())),
            RawValue::from("abc")
        );
    }

    #[test]
    fn test_header_text() {
        assert_eq!(header_text(&Data::String("id".to_string())), "id");
        assert_eq!(header_text(&Data::Int(2024)), "2024");
        assert_eq!(header_text(&Data::Empty), "");
    }

    #[test]
    fn test_corrupt_workbook() {
        let err = read_first_sheet(b"PK\x03\x04 definitely not a zip").unwrap_err();
        assert!(matches!(err, LensError::Parse { format: DataFormat::Xlsx, .. }));
    }

    #[test]
    fn test_not_a_zip() {
        assert!(read_first_sheet(b"a,b\n1,2\n").is_err());
    }
}
