//! Tabular ingestion: turn uploaded file text into a `Dataset` of row records.
//!
//! Parsing is a pure, single-pass transform with no retry policy: a failed
//! parse is terminal for that upload attempt. The CSV branch is a naive
//! line/comma split with no quoting or escaping support; commas or newlines
//! inside quoted fields will corrupt parsing. That is a documented limitation
//! of the format contract, not a bug to silently fix.

use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::cli::{CompressionFormat, FileFormat};
use crate::error::ParseError;

/// One row: an ordered mapping from column name to scalar value.
/// Key order follows the source document (CSV header order, JSON key order).
pub type Record = serde_json::Map<String, Value>;

/// Ordered sequence of records parsed from one file. Insertion order is file
/// row order. Replaced wholesale on every upload; never merged across files.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    /// Column headers for display: the first record's keys, in key order.
    /// Later records may carry fewer keys (ragged CSV rows); consumers must
    /// tolerate missing keys.
    pub fn columns(&self) -> Vec<String> {
        self.first()
            .map(|record| record.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// The first `n` records (truncation, not sampling).
    pub fn head(&self, n: usize) -> &[Record] {
        &self.records[..self.records.len().min(n)]
    }
}

/// Stringify a cell value for table display and chart labels.
/// Missing keys are rendered by callers as `"null"`.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        // numbers, booleans, null, and nested values use their JSON text
        other => other.to_string(),
    }
}

/// Parse raw file text in the declared format.
pub fn parse_text(text: &str, format: FileFormat) -> Result<Dataset, ParseError> {
    match format {
        FileFormat::Json => parse_json(text),
        FileFormat::Csv => Ok(parse_csv(text)),
    }
}

fn record_from_value(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        // No per-element validation: a non-object element contributes an
        // empty record, which classifies to empty partitions downstream.
        _ => Record::new(),
    }
}

/// JSON branch.
///
/// An array becomes the dataset directly. A non-array object is searched, in
/// key order, for the first array-valued key, and that array becomes the
/// dataset; an object with no array-valued key wraps as a one-element
/// dataset. Scalars and null are rejected.
fn parse_json(text: &str) -> Result<Dataset, ParseError> {
    let parsed: Value = serde_json::from_str(text)?;

    match parsed {
        Value::Array(items) => Ok(Dataset::new(
            items.into_iter().map(record_from_value).collect(),
        )),
        Value::Object(map) => {
            if map.values().any(Value::is_array) {
                let items = map
                    .into_iter()
                    .find_map(|(_, value)| match value {
                        Value::Array(items) => Some(items),
                        _ => None,
                    })
                    .unwrap_or_default();
                Ok(Dataset::new(
                    items.into_iter().map(record_from_value).collect(),
                ))
            } else {
                Ok(Dataset::new(vec![map]))
            }
        }
        _ => Err(ParseError::UnrecognizedJsonShape),
    }
}

/// CSV branch. Cannot fail: malformed rows are tolerated rather than
/// rejected.
///
/// The first line is the header row. Each subsequent line is split on commas,
/// trimmed, and zipped positionally against the header names; values stay
/// strings (no numeric coercion at parse time). Extra values beyond the
/// header count are dropped; missing trailing values leave the key absent.
/// Rows whose every present field is empty are dropped (blank-line
/// tolerance).
fn parse_csv(text: &str) -> Dataset {
    let mut lines = text.split('\n');
    let headers: Vec<String> = lines
        .next()
        .unwrap_or_default()
        .split(',')
        .map(|header| header.trim().to_string())
        .collect();

    let records = lines
        .map(|line| {
            let values: Vec<&str> = line.split(',').map(str::trim).collect();
            let mut record = Record::new();
            for (index, header) in headers.iter().enumerate() {
                if let Some(value) = values.get(index) {
                    record.insert(header.clone(), Value::String(value.to_string()));
                }
            }
            record
        })
        .filter(|record| {
            record
                .values()
                .any(|value| matches!(value, Value::String(s) if !s.is_empty()))
        })
        .collect();

    Dataset::new(records)
}

fn open_reader(
    path: &Path,
    compression: Option<CompressionFormat>,
) -> Result<Box<dyn Read>, ParseError> {
    let file = File::open(path)?;
    let reader: Box<dyn Read> = match compression {
        None => Box::new(BufReader::new(file)),
        Some(CompressionFormat::Gzip) => {
            Box::new(flate2::read::GzDecoder::new(BufReader::new(file)))
        }
        Some(CompressionFormat::Zstd) => Box::new(zstd::Decoder::new(BufReader::new(file))?),
        Some(CompressionFormat::Bzip2) => {
            Box::new(bzip2::read::BzDecoder::new(BufReader::new(file)))
        }
        Some(CompressionFormat::Xz) => Box::new(xz2::read::XzDecoder::new(BufReader::new(file))),
    };
    Ok(reader)
}

/// Read and parse a file from disk.
///
/// Compression is detected from the final extension unless overridden
/// (`data.csv.gz` -> gzip), and the format from the remaining extension
/// unless overridden. An extension mapping to no supported format fails with
/// `UnsupportedExtension`.
pub fn load_path(
    path: &Path,
    format_override: Option<FileFormat>,
    compression_override: Option<CompressionFormat>,
) -> Result<(FileFormat, Dataset), ParseError> {
    let compression = compression_override.or_else(|| CompressionFormat::from_extension(path));

    let format = match format_override {
        Some(format) => format,
        None => {
            let detected = if compression.is_some() {
                path.file_stem()
                    .map(Path::new)
                    .and_then(FileFormat::from_path)
            } else {
                FileFormat::from_path(path)
            };
            detected.ok_or(ParseError::UnsupportedExtension)?
        }
    };

    let mut text = String::new();
    open_reader(path, compression)?.read_to_string(&mut text)?;
    let dataset = parse_text(&text, format)?;
    Ok((format, dataset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn string_record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect()
    }

    #[test]
    fn csv_basic_rows() {
        let dataset = parse_csv("a,b\n1,2\n3,4\n");
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0], string_record(&[("a", "1"), ("b", "2")]));
        assert_eq!(dataset.records()[1], string_record(&[("a", "3"), ("b", "4")]));
    }

    #[test]
    fn csv_blank_lines_dropped() {
        let dataset = parse_csv("a,b\n1,2\n\n3,4\n");
        assert_eq!(dataset.len(), 2);
        let all_blank = parse_csv("a,b\n,\n ,\n");
        assert!(all_blank.is_empty());
    }

    #[test]
    fn csv_header_and_fields_trimmed() {
        let dataset = parse_csv(" a , b \n 1 , 2 ");
        assert_eq!(dataset.columns(), vec!["a", "b"]);
        assert_eq!(dataset.records()[0], string_record(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn csv_crlf_line_endings() {
        let dataset = parse_csv("a,b\r\n1,2\r\n3,4\r\n");
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0], string_record(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn csv_ragged_rows_tolerated() {
        // Short row keeps only the fields it has; long row drops the extras.
        let dataset = parse_csv("a,b,c\n1\n1,2,3,4\n");
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0], string_record(&[("a", "1")]));
        assert_eq!(
            dataset.records()[1],
            string_record(&[("a", "1"), ("b", "2"), ("c", "3")])
        );
    }

    #[test]
    fn csv_values_stay_strings() {
        let dataset = parse_csv("n\n42\n");
        assert_eq!(
            dataset.records()[0].get("n"),
            Some(&Value::String("42".to_string()))
        );
    }

    #[test]
    fn csv_empty_text_gives_empty_dataset() {
        assert!(parse_csv("").is_empty());
        assert!(parse_csv("a,b\n").is_empty());
    }

    #[test]
    fn json_array_round_trip() {
        let source = json!([{"x": 1, "y": "a"}, {"x": 2, "y": "b"}]);
        let dataset = parse_json(&source.to_string()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0].get("x"), Some(&json!(1)));
        assert_eq!(dataset.records()[1].get("y"), Some(&json!("b")));
    }

    #[test]
    fn json_first_array_valued_key_wins() {
        let text = r#"{ "a": 1, "items": [{"x": 1}], "more": [{"y": 2}] }"#;
        let dataset = parse_json(text).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].get("x"), Some(&json!(1)));
    }

    #[test]
    fn json_object_without_arrays_wraps_as_single_record() {
        let dataset = parse_json(r#"{"region": "east", "revenue": 100}"#).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].get("region"), Some(&json!("east")));
    }

    #[test]
    fn json_scalar_and_null_rejected() {
        assert!(matches!(
            parse_json("\"42\""),
            Err(ParseError::UnrecognizedJsonShape)
        ));
        assert!(matches!(
            parse_json("null"),
            Err(ParseError::UnrecognizedJsonShape)
        ));
        assert!(matches!(
            parse_json("3.5"),
            Err(ParseError::UnrecognizedJsonShape)
        ));
    }

    #[test]
    fn json_malformed_rejected() {
        assert!(matches!(
            parse_json("{not json"),
            Err(ParseError::MalformedJson(_))
        ));
    }

    #[test]
    fn json_non_object_elements_become_empty_records() {
        let dataset = parse_json("[1, 2, 3]").unwrap();
        assert_eq!(dataset.len(), 3);
        assert!(dataset.records().iter().all(|r| r.is_empty()));
        assert!(dataset.columns().is_empty());
    }

    #[test]
    fn json_key_order_preserved() {
        let dataset = parse_json(r#"[{"z": 1, "a": 2, "m": 3}]"#).unwrap();
        assert_eq!(dataset.columns(), vec!["z", "a", "m"]);
    }

    #[test]
    fn display_string_forms() {
        assert_eq!(display_string(&json!("east")), "east");
        assert_eq!(display_string(&json!(1)), "1");
        assert_eq!(display_string(&json!(1.5)), "1.5");
        assert_eq!(display_string(&json!(true)), "true");
        assert_eq!(display_string(&Value::Null), "null");
        assert_eq!(display_string(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn head_truncates() {
        let dataset = parse_csv("a\n1\n2\n3\n");
        assert_eq!(dataset.head(2).len(), 2);
        assert_eq!(dataset.head(10).len(), 3);
    }
}
