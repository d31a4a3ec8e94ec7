//! Title sanitizing and numeric coercion of chart values.

use crate::DirectiveError;
use crate::literal::LiteralValue;

/// Keeps letters, digits, underscore, whitespace, `-`, `(`, `)` and `%`,
/// then trims.
#[must_use]
pub fn sanitize_title(raw: &str) -> String {
    raw.chars()
        .filter(|&c| {
            c.is_alphanumeric() || c == '_' || c.is_whitespace() || matches!(c, '-' | '(' | ')' | '%')
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Turns one data entry into a number.
///
/// Percent signs are dropped, then every character other than ASCII
/// digits, `.`, `-`, `e` and `E` is removed, so `"12.5%"`, `"$450"` and
/// `"12.3 cases"` all coerce. An `e` left at either end by a unit word is
/// not an exponent and is dropped. Values with nothing numeric left
/// (`"N/A"`) fail, as do non-finite results.
///
/// # Errors
///
/// Returns [`DirectiveError::NonNumeric`] if no number can be recovered.
pub fn coerce_number(value: &LiteralValue) -> Result<f64, DirectiveError> {
    let text = value.display_text();
    let cleaned: String = text
        .trim()
        .replace('%', "")
        .chars()
        .filter(|&c| c.is_ascii_digit() || matches!(c, '.' | '-' | 'e' | 'E'))
        .collect();
    // Letters of trailing or leading words ("cases") leave stray exponents.
    let cleaned = cleaned.trim_matches(|c: char| matches!(c, 'e' | 'E'));

    let number = if cleaned.is_empty() {
        value.as_number()
    } else {
        cleaned.parse::<f64>().ok()
    };

    number
        .filter(|n| n.is_finite())
        .ok_or(DirectiveError::NonNumeric { value: text })
}
