#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Regional health report generation.
//!
//! A report request flows through the cache, the report prompt, the
//! completion client and the chart extractor:
//!
//! ```text
//! area -> report_id -> cache hit? -> build_report_prompt -> CompletionClient
//!      -> extract_charts -> ReportRecord -> cache
//! ```
//!
//! [`ReportService`] ties these together and also answers follow-up
//! questions constrained to a report's text.

pub mod cache;
pub mod followup;
pub mod id;
pub mod prompt;
pub mod service;

pub use cache::{MemoryReportCache, ReportCache};
pub use id::report_id;
pub use service::{ReportConfig, ReportService};

use strum_macros::{AsRefStr, Display};
use thiserror::Error;

/// A request field that is validated before any work starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum InputField {
    /// The area name of a report request.
    Area,
    /// The question of a follow-up request.
    Question,
}

/// Errors returned to callers of [`ReportService`].
///
/// Provider failures are not errors at this level: they are carried in the
/// report text instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// A required field is empty or whitespace only.
    #[error("{field} cannot be empty.")]
    InvalidInput {
        /// The rejected field.
        field: InputField,
    },

    /// A follow-up question came without context and the report is not
    /// cached.
    #[error("Report context is missing and not found in cache.")]
    MissingContext {
        /// Report the question was about.
        report_id: String,
    },
}
