//! Format dispatch and the CSV reader with delimiter detection.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LensError, Result};
use super::format::DataFormat;
use super::source::{normalize_headers, ParsedDataset};
use super::value::{RawRow, RawValue};
use super::{json, xlsx};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// CSV delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// CSV quote character.
    pub quote: u8,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote: b'"',
            max_rows: None,
        }
    }
}

/// Turns uploaded bytes into columns and raw records.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse bytes of a known format.
    pub fn parse(&self, bytes: &[u8], format: DataFormat) -> Result<ParsedDataset> {
        let mut parsed = match format {
            DataFormat::Csv => {
                let (columns, rows) = self.parse_csv(bytes)?;
                ParsedDataset::new(bytes, format, columns, rows)
            }
            DataFormat::Json => {
                let doc = json::read_json(bytes)?;
                let mut parsed = ParsedDataset::new(bytes, format, doc.columns, doc.rows);
                parsed.dropped_keys = doc.dropped_keys;
                parsed
            }
            DataFormat::Xlsx => {
                let (columns, rows) = xlsx::read_first_sheet(bytes)?;
                ParsedDataset::new(bytes, format, columns, rows)
            }
        };

        if let Some(max) = self.config.max_rows {
            parsed.rows.truncate(max);
            parsed.source.row_count = parsed.rows.len();
        }

        debug!(
            format = %format,
            rows = parsed.row_count(),
            columns = parsed.column_count(),
            "parsed upload"
        );

        Ok(parsed)
    }

    /// Parse bytes, taking the format from the file name or the content.
    pub fn parse_auto(&self, bytes: &[u8], file_name: Option<&str>) -> Result<ParsedDataset> {
        let format = file_name
            .and_then(DataFormat::from_extension)
            .unwrap_or_else(|| DataFormat::sniff(bytes));

        let mut parsed = self.parse(bytes, format)?;
        if let Some(name) = file_name {
            parsed.source = parsed.source.with_file(name);
        }
        Ok(parsed)
    }

    /// Read and parse a file from disk.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ParsedDataset> {
        let path = path.as_ref();

        let contents = fs::read(path).map_err(|e| LensError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned());

        self.parse_auto(&contents, name.as_deref())
    }

    /// Parse delimited text. Cells stay as literal text.
    fn parse_csv(&self, bytes: &[u8]) -> Result<(Vec<String>, Vec<RawRow>)> {
        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(bytes),
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        // The first non-blank line is the header
        let mut record = csv::StringRecord::new();
        if !next_record(&mut reader, bytes, &mut record)? {
            return Ok((Vec::new(), Vec::new()));
        }
        let headers = normalize_headers(record.iter());

        let mut rows = Vec::new();
        while next_record(&mut reader, bytes, &mut record)? {
            // Missing trailing fields become null, extra fields are dropped
            let row: RawRow = headers
                .iter()
                .enumerate()
                .map(|(idx, name)| {
                    let value = match record.get(idx) {
                        Some(field) => RawValue::Text(field.to_string()),
                        None => RawValue::Null,
                    };
                    (name.clone(), value)
                })
                .collect();

            rows.push(row);
        }

        Ok((headers, rows))
    }
}

/// Read the next record that is not a whitespace-only line.
///
/// Blankness is judged on the raw bytes, so a quoted empty field is still
/// a record.
fn next_record(
    reader: &mut csv::Reader<&[u8]>,
    bytes: &[u8],
    record: &mut csv::StringRecord,
) -> Result<bool> {
    loop {
        let start = reader.position().byte() as usize;
        if !reader.read_record(record).map_err(csv_error)? {
            return Ok(false);
        }
        let end = reader.position().byte() as usize;

        let raw = bytes.get(start..end).unwrap_or_default();
        if record.len() <= 1 && is_blank_line(raw) {
            continue;
        }
        return Ok(true);
    }
}

fn is_blank_line(raw: &[u8]) -> bool {
    let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    raw.iter().all(u8::is_ascii_whitespace)
}

fn csv_error(err: csv::Error) -> LensError {
    LensError::parse(DataFormat::Csv, err.to_string())
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> u8 {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .map_while(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    // Count occurrences of each delimiter in each line
    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let Some(&first_count) = counts.first() else {
            continue;
        };
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        let variance = counts
            .iter()
            .map(|&c| (c as f64 - mean).powi(2))
            .sum::<f64>()
            / counts.len() as f64;

        // Higher count with lower variance wins; tab is rarer inside data
        let score = if consistent {
            first_count * 1000 + if delim == b'\t' { 100 } else { 0 }
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    best_delimiter
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter_csv() {
        let data = b"a,b,c\n1,2,3\n4,5,6";
        assert_eq!(detect_delimiter(data), b',');
    }

    #[test]
    fn test_detect_delimiter_tsv() {
        let data = b"a\tb\tc\n1\t2\t3\n4\t5\t6";
        assert_eq!(detect_delimiter(data), b'\t');
    }

    #[test]
    fn test_detect_delimiter_ignores_quoted() {
        let data = b"name;note\n\"Smith, J\";x\n\"Doe, A\";y";
        assert_eq!(detect_delimiter(data), b';');
    }

    #[test]
    fn test_parse_csv_keeps_literal_text() {
        let parser = Parser::new();
        let parsed = parser.parse(b"name,age\nAlice,30\nBob,25", DataFormat::Csv).unwrap();

        assert_eq!(parsed.columns, vec!["name", "age"]);
        assert_eq!(parsed.row_count(), 2);
        assert_eq!(parsed.get(0, "name"), Some(&RawValue::from("Alice")));
        assert_eq!(parsed.get(1, "age"), Some(&RawValue::from("25")));
    }

    #[test]
    fn test_parse_csv_ragged_rows() {
        let parser = Parser::new();
        let parsed = parser
            .parse(b"a,b,c\n1,2\n3,4,5,6\n", DataFormat::Csv)
            .unwrap();

        assert_eq!(parsed.row_count(), 2);
        assert_eq!(parsed.get(0, "c"), Some(&RawValue::Null));
        assert_eq!(parsed.rows[1].len(), 3);
        assert_eq!(parsed.get(1, "c"), Some(&RawValue::from("5")));
    }

    #[test]
    fn test_parse_csv_skips_blank_lines() {
        let parser = Parser::new();
        let parsed = parser
            .parse(b"a,b\n1,x\n\n   \n2,y\n", DataFormat::Csv)
            .unwrap();

        assert_eq!(parsed.row_count(), 2);
    }

    #[test]
    fn test_parse_csv_blank_first_line() {
        let parser = Parser::new();
        let parsed = parser
            .parse(b"   \na,b\n1,2\n3,4\n", DataFormat::Csv)
            .unwrap();

        assert_eq!(parsed.columns, vec!["a", "b"]);
        assert_eq!(parsed.row_count(), 2);
        assert_eq!(parsed.get(1, "b"), Some(&RawValue::from("4")));
    }

    #[test]
    fn test_parse_csv_quoted_empty_is_a_row() {
        let parser = Parser::new();
        let parsed = parser.parse(b"v\n1\n\"\"\n3\n", DataFormat::Csv).unwrap();

        assert_eq!(parsed.row_count(), 3);
        assert_eq!(parsed.get(1, "v"), Some(&RawValue::from("")));
        assert!(parsed.get(1, "v").is_some_and(RawValue::is_missing));
    }

    #[test]
    fn test_parse_csv_blank_only_input() {
        let parser = Parser::new();
        let parsed = parser.parse(b"\n  \n\t\n", DataFormat::Csv).unwrap();

        assert_eq!(parsed.column_count(), 0);
        assert_eq!(parsed.row_count(), 0);
    }

    #[test]
    fn test_parse_csv_empty_input() {
        let parser = Parser::new();
        let parsed = parser.parse(b"", DataFormat::Csv).unwrap();

        assert_eq!(parsed.column_count(), 0);
        assert_eq!(parsed.row_count(), 0);
    }

    #[test]
    fn test_parse_csv_header_only() {
        let parser = Parser::new();
        let parsed = parser.parse(b"a,b\n", DataFormat::Csv).unwrap();

        assert_eq!(parsed.columns, vec!["a", "b"]);
        assert_eq!(parsed.row_count(), 0);
    }

    #[test]
    fn test_parse_csv_invalid_utf8() {
        let parser = Parser::new();
        let err = parser.parse(b"a,b\n\xff\xfe,1\n", DataFormat::Csv).unwrap_err();

        assert!(matches!(
            err,
            LensError::Parse {
                format: DataFormat::Csv,
                ..
            }
        ));
    }

    #[test]
    fn test_max_rows() {
        let parser = Parser::with_config(ParserConfig {
            max_rows: Some(1),
            ..ParserConfig::default()
        });
        let parsed = parser.parse(b"a\n1\n2\n3\n", DataFormat::Csv).unwrap();

        assert_eq!(parsed.row_count(), 1);
        assert_eq!(parsed.source.row_count, 1);
    }

    #[test]
    fn test_parse_auto_uses_extension_then_content() {
        let parser = Parser::new();
        let parsed = parser.parse_auto(br#"[{"v":1}]"#, None).unwrap();
        assert_eq!(parsed.format, DataFormat::Json);

        let parsed = parser.parse_auto(b"v\n1\n", Some("data.csv")).unwrap();
        assert_eq!(parsed.format, DataFormat::Csv);
        assert_eq!(parsed.source.file.as_deref(), Some("data.csv"));
    }
}
