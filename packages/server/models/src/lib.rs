#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the health report server.
//!
//! Field names are snake case on the wire; the report itself is returned
//! as a `health_report_models::ReportRecord`.

use serde::{Deserialize, Serialize};

/// Body of `POST /research`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResearchRequest {
    /// Area to report on.
    pub area: String,
}

/// Body of `POST /ask`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionRequest {
    /// Report the question is about.
    pub report_id: String,
    /// The question.
    pub question: String,
    /// Report text to answer from; the cached report is used when absent.
    #[serde(default)]
    pub report_context: Option<String>,
}

/// Response of `POST /ask`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnswerResponse {
    /// The answer, or an `Error: ...` description.
    pub answer: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Error body for rejected requests.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiErrorDetail {
    /// Human readable reason.
    pub detail: String,
}
