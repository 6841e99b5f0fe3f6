//! Field classification: partition a dataset's columns into numeric and
//! categorical, sampled from the first record only.
//!
//! The single-record sample is observable behavior carried over from the
//! ingestion contract: a column whose first value happens to be numeric is
//! numeric, whatever the rest of the rows hold. Do not widen this to a full
//! scan without re-scoping the contract.

use serde_json::Value;

use crate::ingest::Dataset;

/// Partition of a dataset's column names. Every column of the first record
/// appears in exactly one partition, in that record's key order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldClassification {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

impl FieldClassification {
    /// Default chart category field: the first categorical column.
    pub fn default_category(&self) -> Option<&str> {
        self.categorical.first().map(String::as_str)
    }

    /// Default chart value field: the first numeric column.
    pub fn default_value(&self) -> Option<&str> {
        self.numeric.first().map(String::as_str)
    }

    /// Charting needs one field from each partition. When this is false the
    /// caller must degrade to an explicit "cannot chart" state.
    pub fn is_chartable(&self) -> bool {
        !self.numeric.is_empty() && !self.categorical.is_empty()
    }
}

/// Coerce a cell value to a number.
///
/// Numbers pass through, booleans coerce to 1/0, and strings parse as `f64`
/// after trimming (a parse yielding NaN does not count). Null, arrays, and
/// objects do not coerce.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) if !n.is_nan() => Some(n),
            _ => None,
        },
        _ => None,
    }
}

/// A field is numeric when its value is a number, or coerces to one and is
/// not the empty string. Everything else is categorical.
pub fn is_numeric_value(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.is_empty() && coerce_number(value).is_some(),
        _ => coerce_number(value).is_some(),
    }
}

/// Classify the dataset's columns from its first record.
///
/// An empty dataset, or an empty first record, yields two empty partitions;
/// that is a "cannot chart" state for callers, not an error.
pub fn classify(dataset: &Dataset) -> FieldClassification {
    let mut fields = FieldClassification::default();
    let Some(first) = dataset.first() else {
        return fields;
    };
    for (name, value) in first {
        if is_numeric_value(value) {
            fields.numeric.push(name.clone());
        } else {
            fields.categorical.push(name.clone());
        }
    }
    fields
}
