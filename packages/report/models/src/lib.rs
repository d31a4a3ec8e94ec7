#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report record and chart data types for regional health reports.
//!
//! A [`ReportRecord`] is the immutable result of one report generation:
//! the cleaned markdown returned by the model plus every chart that was
//! successfully extracted from its `CHART_DATA:` directives. The chart
//! types mirror what the rendering layer (Chart.js) consumes, so their
//! JSON field names are part of the API contract.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Maximum number of points a chart may carry.
///
/// Longer directives are truncated to this length; charts are meant for
/// compact display alongside the report text.
pub const MAX_CHART_POINTS: usize = 12;

/// Prefix carried by report markdown and follow-up answers when the
/// completion provider failed.
pub const ERROR_PREFIX: &str = "Error:";

/// Kind of chart a directive asks for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ChartType {
    /// Vertical bar chart.
    Bar,
    /// Line chart, usually a trend over time.
    Line,
    /// Pie chart.
    Pie,
    /// Doughnut chart.
    Doughnut,
}

/// A colour (or one colour per point) passed through to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    /// One colour for the whole dataset.
    Single(String),
    /// One colour per data point.
    PerPoint(Vec<String>),
}

/// One numeric series of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    /// Legend label: the chart title, optionally followed by
    /// `" (Source: <source>)"`.
    pub label: String,
    /// Values, one per chart label.
    pub data: Vec<f64>,
    /// Fill colour(s); not set by extraction.
    #[serde(
        rename = "backgroundColor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub background_color: Option<ColorSpec>,
    /// Border colour(s); not set by extraction.
    #[serde(rename = "borderColor", default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<ColorSpec>,
}

impl ChartDataset {
    /// Creates an uncoloured dataset.
    #[must_use]
    pub const fn new(label: String, data: Vec<f64>) -> Self {
        Self {
            label,
            data,
            background_color: None,
            border_color: None,
        }
    }
}

/// A renderable chart extracted from a `CHART_DATA:` directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    /// Chart kind.
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    /// Sanitized chart title.
    pub title: String,
    /// Category labels, between 1 and [`MAX_CHART_POINTS`] entries.
    pub labels: Vec<String>,
    /// Data series; each has exactly `labels.len()` values.
    pub datasets: Vec<ChartDataset>,
    /// Citation given by the directive's `SOURCE` field.
    pub source: Option<String>,
}

impl ChartData {
    /// Checks the shape invariant every emitted chart must satisfy.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.labels.is_empty()
            && self.labels.len() <= MAX_CHART_POINTS
            && !self.datasets.is_empty()
            && self
                .datasets
                .iter()
                .all(|dataset| dataset.data.len() == self.labels.len())
    }
}

/// A generated report for one area.
///
/// Created once per area fingerprint and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// 12-character hex fingerprint of the lower-cased area name.
    pub report_id: String,
    /// Area name as supplied by the caller, trimmed.
    pub area_name: String,
    /// Cleaned model output, or an `Error: ...` description.
    pub full_report_markdown: String,
    /// Charts in order of appearance in the markdown.
    #[serde(default)]
    pub charts: Vec<ChartData>,
    /// Context reused when answering follow-up questions.
    pub full_text_for_follow_up: String,
}

impl ReportRecord {
    /// Whether the report content is an error description rather than a
    /// generated report.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.full_report_markdown.starts_with(ERROR_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chart() -> ChartData {
        ChartData {
            chart_type: ChartType::Pie,
            title: "Age Distribution".to_string(),
            labels: vec!["0-14".to_string(), "15-64".to_string()],
            datasets: vec![ChartDataset::new(
                "Age Distribution (Source: Census, 2021)".to_string(),
                vec![25.0, 75.0],
            )],
            source: Some("Census, 2021".to_string()),
        }
    }

    #[test]
    fn chart_type_parses_case_insensitively() {
        assert_eq!("BAR".parse::<ChartType>().unwrap(), ChartType::Bar);
        assert_eq!("Doughnut".parse::<ChartType>().unwrap(), ChartType::Doughnut);
        assert!("scatter".parse::<ChartType>().is_err());
        assert_eq!(ChartType::Line.to_string(), "line");
    }

    #[test]
    fn chart_serializes_with_renderer_field_names() {
        let json = serde_json::to_value(sample_chart()).unwrap();
        assert_eq!(json["type"], "pie");
        assert_eq!(json["datasets"][0]["data"][1], 75.0);
        assert!(json["datasets"][0].get("backgroundColor").is_none());
        assert_eq!(json["source"], "Census, 2021");
    }

    #[test]
    fn dataset_accepts_colour_lists() {
        let dataset: ChartDataset = serde_json::from_value(serde_json::json!({
            "label": "x",
            "data": [1.0],
            "backgroundColor": ["#fff", "#000"],
            "borderColor": "#123456"
        }))
        .unwrap();
        assert_eq!(
            dataset.background_color,
            Some(ColorSpec::PerPoint(vec!["#fff".to_string(), "#000".to_string()]))
        );
        assert_eq!(dataset.border_color, Some(ColorSpec::Single("#123456".to_string())));
    }

    #[test]
    fn well_formed_requires_matching_lengths() {
        let mut chart = sample_chart();
        assert!(chart.is_well_formed());
        chart.datasets[0].data.push(1.0);
        assert!(!chart.is_well_formed());
        chart.labels.clear();
        chart.datasets[0].data.clear();
        assert!(!chart.is_well_formed());
    }

    #[test]
    fn error_records_are_detected_by_prefix() {
        let record = ReportRecord {
            report_id: "abcdef012345".to_string(),
            area_name: "Springfield".to_string(),
            full_report_markdown: "Error: API Key is not configured on the server.".to_string(),
            charts: Vec::new(),
            full_text_for_follow_up: String::new(),
        };
        assert!(record.is_error());
    }
}
