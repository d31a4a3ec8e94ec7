#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Extraction of `CHART_DATA:` directives from generated report text.
//!
//! The report prompt asks the model to put one directive line after each
//! paragraph that discusses chartable data:
//!
//! ```text
//! CHART_DATA: TYPE=bar TITLE="Beds per 1000" LABELS=["A","B"] DATA=[1.2,3.4] SOURCE="(WHO, 2022)"
//! ```
//!
//! [`extract_charts`] turns every valid directive into a [`ChartData`],
//! in order of appearance. Model output is unreliable, so each directive
//! is validated on its own: a bad one is logged and skipped, and the
//! scan carries on with the next. A chart is either emitted whole or not
//! at all.

pub mod coerce;
pub mod directive;
pub mod literal;

use health_report_models::{ChartData, ChartDataset, ChartType, MAX_CHART_POINTS};
use thiserror::Error;

use crate::coerce::{coerce_number, sanitize_title};
use crate::directive::{DirectiveField, DirectiveMatch, scan_directives};
use crate::literal::{LiteralError, LiteralValue, parse_list};

/// Why a directive did not produce a chart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    /// A required `KEY=` is not where the grammar expects it.
    #[error("missing {field}= field")]
    MissingField {
        /// The missing field.
        field: DirectiveField,
    },

    /// A field is present but its value is malformed.
    #[error("invalid {field} value: {reason}")]
    InvalidField {
        /// The malformed field.
        field: DirectiveField,
        /// What was wrong.
        reason: String,
    },

    /// `LABELS` or `DATA` is not a list literal.
    #[error("invalid {field} list: {source}")]
    InvalidList {
        /// `LABELS` or `DATA`.
        field: DirectiveField,
        /// Parser error.
        source: LiteralError,
    },

    /// `TYPE` is not one of bar, line, pie or doughnut.
    #[error("unsupported chart type '{kind}'")]
    UnknownChartType {
        /// The type as written.
        kind: String,
    },

    /// Labels and data differ in length.
    #[error("labels/data length mismatch: {labels} labels, {data} data points")]
    LengthMismatch {
        /// Number of labels.
        labels: usize,
        /// Number of data points.
        data: usize,
    },

    /// The chart has no points.
    #[error("chart has no data points")]
    Empty,

    /// A data entry could not be turned into a number.
    #[error("could not convert data point '{value}' to a number")]
    NonNumeric {
        /// The entry as written.
        value: String,
    },
}

/// A directive that was skipped, with its position among all
/// `CHART_DATA:` tokens of the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartWarning {
    /// Zero-based directive index.
    pub index: usize,
    /// Why it was skipped.
    pub error: DirectiveError,
}

/// Charts extracted from a text plus the directives that were skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartExtraction {
    /// Valid charts in order of appearance.
    pub charts: Vec<ChartData>,
    /// Skipped directives.
    pub warnings: Vec<ChartWarning>,
}

/// Extracts every valid chart from `text`, logging skipped directives.
#[must_use]
pub fn extract_charts(text: &str) -> Vec<ChartData> {
    extract_charts_with_warnings(text).charts
}

/// Extracts every valid chart from `text` and reports the skipped
/// directives alongside.
#[must_use]
pub fn extract_charts_with_warnings(text: &str) -> ChartExtraction {
    let mut extraction = ChartExtraction::default();

    for (index, scanned) in scan_directives(text).enumerate() {
        match scanned.and_then(|found| build_chart(&found)) {
            Ok(chart) => {
                log::debug!("Parsed chart {index}: '{}'", chart.title);
                extraction.charts.push(chart);
            }
            Err(error) => {
                log::warn!("Skipping CHART_DATA directive {index}: {error}");
                extraction.warnings.push(ChartWarning { index, error });
            }
        }
    }

    log::info!(
        "Charts parsed: {} ({} directives skipped)",
        extraction.charts.len(),
        extraction.warnings.len()
    );
    extraction
}

/// Validates one scanned directive and converts it into a chart.
///
/// # Errors
///
/// Returns [`DirectiveError`] describing the first problem found.
pub fn build_chart(found: &DirectiveMatch<'_>) -> Result<ChartData, DirectiveError> {
    let chart_type: ChartType =
        found
            .kind
            .to_lowercase()
            .parse()
            .map_err(|_| DirectiveError::UnknownChartType {
                kind: found.kind.to_string(),
            })?;
    let title = sanitize_title(found.title);

    let mut labels = parse_field(DirectiveField::Labels, found.labels)?;
    let mut raw_data = parse_field(DirectiveField::Data, found.data)?;

    if labels.len() != raw_data.len() {
        return Err(DirectiveError::LengthMismatch {
            labels: labels.len(),
            data: raw_data.len(),
        });
    }
    if labels.is_empty() {
        return Err(DirectiveError::Empty);
    }

    if labels.len() > MAX_CHART_POINTS {
        log::warn!(
            "Chart '{title}' has {} data points, truncating to {MAX_CHART_POINTS}",
            labels.len()
        );
        labels.truncate(MAX_CHART_POINTS);
        raw_data.truncate(MAX_CHART_POINTS);
    }

    let data = raw_data
        .iter()
        .map(coerce_number)
        .collect::<Result<Vec<_>, _>>()?;

    if data.is_empty() {
        return Err(DirectiveError::Empty);
    }
    if data.len() != labels.len() {
        return Err(DirectiveError::LengthMismatch {
            labels: labels.len(),
            data: data.len(),
        });
    }

    let source = found.source.map(str::to_string);
    let dataset_label = source.as_ref().map_or_else(
        || title.clone(),
        |source| format!("{title} (Source: {source})"),
    );

    Ok(ChartData {
        chart_type,
        title,
        labels: labels.iter().map(LiteralValue::display_text).collect(),
        datasets: vec![ChartDataset::new(dataset_label, data)],
        source,
    })
}

fn parse_field(field: DirectiveField, literal: &str) -> Result<Vec<LiteralValue>, DirectiveError> {
    parse_list(literal).map_err(|source| DirectiveError::InvalidList { field, source })
}
