#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Completion client for the health report generator.
//!
//! Sends a system + user prompt pair to an LLM chat-completions endpoint
//! (Perplexity by default, or any `OpenAI`-compatible server via
//! `AI_BASE_URL`) and cleans the returned text: `<think>` blocks are
//! removed and any untagged preamble before the report title is cut.
//!
//! Transport failures never escape as panics or untyped errors. Every
//! failure path is an [`AiError`] variant, which callers that need the
//! legacy `"Error: ..."` text can render with [`AiError::to_report_text`].

pub mod cleanup;
pub mod client;
pub mod providers;

pub use client::{CompletionClient, CompletionRequest, DEFAULT_SYSTEM_PROMPT};

use health_report_models::ERROR_PREFIX;
use thiserror::Error;

/// Errors that can occur while obtaining a completion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiError {
    /// No API credential is configured; no request was attempted.
    #[error("API Key is not configured on the server.")]
    MissingCredential,

    /// The provider answered with a non-2xx status.
    #[error("AI API request failed (HTTP {status}). Details: {message}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Structured error message from the body, or the raw body.
        message: String,
    },

    /// The request did not complete within the configured timeout.
    #[error(
        "The AI API request timed out after {seconds}s. This can happen with very long report \
         requests. Please try a more focused area or try again later."
    )]
    Timeout {
        /// The timeout that elapsed.
        seconds: u64,
    },

    /// Connection, DNS or other network-level failure.
    #[error("AI API request failed due to a network issue: {message}")]
    Network {
        /// Transport error description.
        message: String,
    },

    /// The response did not have the expected shape.
    #[error("AI API returned an error: {message}")]
    MalformedResponse {
        /// The API's own error message, or a generic format error.
        message: String,
    },

    /// Anything else, including a provider that panicked.
    #[error("An unexpected error occurred: {message}")]
    Unexpected {
        /// Description.
        message: String,
    },
}

impl AiError {
    /// Renders the error the way it is stored in report markdown and
    /// follow-up answers: `"Error: <description>"`.
    #[must_use]
    pub fn to_report_text(&self) -> String {
        format!("{ERROR_PREFIX} {self}")
    }
}
