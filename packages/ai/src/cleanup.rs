//! Post-processing of raw model output.
//!
//! Reasoning models wrap their planning in `<think>...</think>` and
//! sometimes chat before the report proper. Cleanup runs two stages:
//!
//! 1. every think block is removed (case-insensitive, across newlines,
//!    non-greedy so repeated blocks are removed one by one);
//! 2. everything before the report title marker is cut.
//!
//! A missing marker is tolerated: the think-stripped text is kept as is
//! and the condition is only logged, since renamed or partial content is
//! still useful to the reader. Transport failures are handled elsewhere.

use std::sync::LazyLock;

use regex::Regex;

/// Literal prefix every report is instructed to start with.
pub const REPORT_TITLE_MARKER: &str = "Comprehensive Report on Healthcare in";

static THINK_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<think>.*?</think>").expect("valid regex"));

static TITLE_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i){}", regex::escape(REPORT_TITLE_MARKER))).expect("valid regex")
});

/// Where the title marker was found in the think-stripped text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreambleOutcome {
    /// The text already started with the marker.
    StartsAtMarker,
    /// Untagged preamble of `stripped_bytes` bytes was removed.
    Stripped {
        /// Length of the removed preamble.
        stripped_bytes: usize,
    },
    /// The marker does not appear; the text was kept unchanged.
    MarkerMissing,
}

/// Cleaned model text together with what the preamble stage did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedResponse {
    /// Final text, trimmed.
    pub text: String,
    /// Outcome of the preamble stage.
    pub preamble: PreambleOutcome,
}

/// Removes every `<think>...</think>` block and trims the result.
#[must_use]
pub fn strip_think_blocks(raw: &str) -> String {
    THINK_BLOCK_RE.replace_all(raw, "").trim().to_string()
}

/// Cuts everything before the first case-insensitive occurrence of
/// [`REPORT_TITLE_MARKER`].
#[must_use]
pub fn strip_preamble(text: &str) -> (&str, PreambleOutcome) {
    match TITLE_MARKER_RE.find(text) {
        Some(m) if m.start() == 0 => (text, PreambleOutcome::StartsAtMarker),
        Some(m) => (
            &text[m.start()..],
            PreambleOutcome::Stripped {
                stripped_bytes: m.start(),
            },
        ),
        None => (text, PreambleOutcome::MarkerMissing),
    }
}

/// Runs both cleanup stages and the final trim.
#[must_use]
pub fn clean_response(raw: &str) -> CleanedResponse {
    let without_thoughts = strip_think_blocks(raw);
    log::debug!(
        "Content after stripping <think> tags (length: {} chars)",
        without_thoughts.len()
    );

    let (text, preamble) = strip_preamble(&without_thoughts);
    match preamble {
        PreambleOutcome::StartsAtMarker => {
            log::debug!("Response starts with the report title");
        }
        PreambleOutcome::Stripped { stripped_bytes } => {
            log::warn!(
                "Untagged preamble of {stripped_bytes} bytes detected before the report title; \
                 stripping it"
            );
        }
        PreambleOutcome::MarkerMissing => {
            log::warn!(
                "Report start marker ('{REPORT_TITLE_MARKER}') not found after <think> removal; \
                 returning the think-stripped content as is"
            );
        }
    }

    CleanedResponse {
        text: text.trim().to_string(),
        preamble,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_think_block_before_title() {
        let cleaned = clean_response("<think>plan</think>Comprehensive Report on Healthcare in X...");
        assert_eq!(cleaned.text, "Comprehensive Report on Healthcare in X...");
        assert_eq!(cleaned.preamble, PreambleOutcome::StartsAtMarker);
    }

    #[test]
    fn strips_multiline_and_repeated_think_blocks() {
        let raw = "<THINK>line one\nline two</Think>\n\nComprehensive Report on Healthcare in Y\n\
                   body <think>aside</think>continues";
        let cleaned = clean_response(raw);
        assert_eq!(
            cleaned.text,
            "Comprehensive Report on Healthcare in Y\nbody continues"
        );
    }

    #[test]
    fn think_removal_is_non_greedy() {
        assert_eq!(
            strip_think_blocks("<think>a</think>keep<think>b</think>"),
            "keep"
        );
    }

    #[test]
    fn strips_untagged_preamble() {
        let cleaned = clean_response("Sure! Comprehensive Report on Healthcare in X...");
        assert_eq!(cleaned.text, "Comprehensive Report on Healthcare in X...");
        assert_eq!(
            cleaned.preamble,
            PreambleOutcome::Stripped { stripped_bytes: 6 }
        );
    }

    #[test]
    fn marker_match_ignores_case() {
        let cleaned = clean_response("## COMPREHENSIVE REPORT ON HEALTHCARE IN Kerala");
        assert_eq!(cleaned.text, "COMPREHENSIVE REPORT ON HEALTHCARE IN Kerala");
    }

    #[test]
    fn missing_marker_keeps_think_stripped_text() {
        let cleaned = clean_response("<think>x</think>  A report with another title.  ");
        assert_eq!(cleaned.text, "A report with another title.");
        assert_eq!(cleaned.preamble, PreambleOutcome::MarkerMissing);
    }

    #[test]
    fn unclosed_think_tag_is_left_alone() {
        let cleaned = clean_response("<think>never closed Comprehensive Report on Healthcare in Z");
        assert_eq!(cleaned.text, "Comprehensive Report on Healthcare in Z");
    }
}
