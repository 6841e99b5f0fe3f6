//! Prepare chart input from a dataset: pick the category/value columns,
//! truncate, and build the `{labels, datasets}` structure the external chart
//! renderer consumes.

use serde::Serialize;
use serde_json::Value;

use crate::classify::coerce_number;
use crate::cli::ChartKind;
use crate::ingest::{display_string, Dataset};

/// Charts draw a size-bounded prefix of the dataset (truncation, not
/// sampling) so rendered labels stay readable.
pub const CHART_RECORD_LIMIT: usize = 10;

const BAR_FILL: &str = "rgba(54, 162, 235, 0.6)";
const BAR_BORDER: &str = "rgb(54, 162, 235)";
const LINE_BORDER: &str = "rgb(75, 192, 192)";

/// Segment palette for pie charts, sliced to the label count.
const PIE_COLORS: [&str; 10] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40", "#7BC8A4", "#E7E9ED",
    "#8A2BE2", "#20B2AA",
];

/// A backgroundColor is a single color for bar series and a per-segment
/// array for pie series.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColorSpec {
    One(String),
    Many(Vec<String>),
}

/// One series in the renderer contract. Keys a kind does not carry are
/// omitted from the serialized form.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<ColorSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover_background_color: Option<ColorSpec>,
}

/// The `{labels, datasets}` shape required by the external chart renderer.
/// This is the only contract the ingestion core must honor exactly.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartInput {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartSeries>,
}

fn label_for(record_value: Option<&Value>) -> String {
    match record_value {
        Some(value) => display_string(value),
        None => "null".to_string(),
    }
}

/// Missing and non-coercible values zero-fill rather than erroring. This
/// collapses "missing" and "zero" at the chart boundary; consumers that need
/// the distinction must read the dataset, not the chart input.
fn value_for(record_value: Option<&Value>) -> f64 {
    record_value.and_then(coerce_number).unwrap_or(0.0)
}

/// Build chart input from the first `CHART_RECORD_LIMIT` records.
///
/// Guarantees `labels.len() == data.len() == min(10, dataset.len())`, in
/// dataset order.
pub fn chart_input(
    dataset: &Dataset,
    category_field: &str,
    value_field: &str,
    kind: ChartKind,
) -> ChartInput {
    let head = dataset.head(CHART_RECORD_LIMIT);
    let labels: Vec<String> = head
        .iter()
        .map(|record| label_for(record.get(category_field)))
        .collect();
    let data: Vec<f64> = head
        .iter()
        .map(|record| value_for(record.get(value_field)))
        .collect();

    let series = match kind {
        ChartKind::Bar => ChartSeries {
            label: Some(value_field.to_string()),
            data,
            background_color: Some(ColorSpec::One(BAR_FILL.to_string())),
            border_color: Some(BAR_BORDER.to_string()),
            border_width: Some(1),
            fill: None,
            tension: None,
            hover_background_color: None,
        },
        ChartKind::Line => ChartSeries {
            label: Some(value_field.to_string()),
            data,
            background_color: None,
            border_color: Some(LINE_BORDER.to_string()),
            border_width: None,
            fill: Some(false),
            tension: Some(0.1),
            hover_background_color: None,
        },
        ChartKind::Pie => {
            let colors: Vec<String> = PIE_COLORS
                .iter()
                .take(labels.len())
                .map(|c| c.to_string())
                .collect();
            ChartSeries {
                label: None,
                data,
                background_color: Some(ColorSpec::Many(colors.clone())),
                border_color: None,
                border_width: None,
                fill: None,
                tension: None,
                hover_background_color: Some(ColorSpec::Many(colors)),
            }
        }
    };

    ChartInput {
        labels,
        datasets: vec![series],
    }
}
