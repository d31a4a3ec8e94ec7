//! Parser for the bracketed list literals in `LABELS=` and `DATA=`.
//!
//! Models are asked for JSON arrays, so a literal is first decoded with
//! `serde_json`. When that fails the Python-style fallback accepts:
//!
//! * single- or double-quoted strings with the common backslash escapes,
//! * numbers (`12`, `-3.5`, `+7`, `.5`),
//! * `True`/`False`/`None` as well as the JSON keywords,
//! * a trailing comma before the closing bracket.
//!
//! Nothing is evaluated: bare words, nested lists and anything else are
//! rejected with a [`LiteralError`].

use serde_json::Value;
use thiserror::Error;

/// One element of a list literal.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// A quoted string.
    Str(String),
    /// A number and the text it was written as.
    Number {
        /// Parsed value.
        value: f64,
        /// Text form, e.g. `2020` or `3.5`. Python-style literals keep
        /// their source spelling.
        raw: String,
    },
    /// A boolean.
    Bool(bool),
    /// `null` / `None`.
    Null,
}

impl LiteralValue {
    /// Text form of the value, used for labels and numeric coercion.
    ///
    /// Numbers keep their source spelling; booleans and null use the
    /// `True`/`False`/`None` spelling.
    #[must_use]
    pub fn display_text(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Number { raw, .. } => raw.clone(),
            Self::Bool(true) => "True".to_string(),
            Self::Bool(false) => "False".to_string(),
            Self::Null => "None".to_string(),
        }
    }

    /// The numeric value, when the literal was written as a number.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number { value, .. } => Some(*value),
            _ => None,
        }
    }
}

/// Why a list literal could not be parsed. Offsets are byte offsets
/// into the literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    /// The literal does not start with `[`.
    #[error("expected '[' at start of list")]
    MissingOpenBracket,
    /// Input ended before the closing `]`.
    #[error("list is not closed with ']'")]
    Unclosed,
    /// A quoted string is never closed.
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString {
        /// Offset of the opening quote.
        offset: usize,
    },
    /// A backslash escape that JSON does not allow.
    #[error("invalid escape sequence at offset {offset}")]
    InvalidEscape {
        /// Offset of the backslash.
        offset: usize,
    },
    /// A token that looks numeric but does not parse.
    #[error("invalid number '{token}'")]
    InvalidNumber {
        /// Offending token.
        token: String,
    },
    /// A bare word other than the boolean/null keywords.
    #[error("unquoted value '{token}'")]
    BareWord {
        /// Offending token.
        token: String,
    },
    /// Lists inside lists are not chart data.
    #[error("nested list at offset {offset}")]
    NestedList {
        /// Offset of the inner `[`.
        offset: usize,
    },
    /// Any other unexpected character.
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar {
        /// Offending character.
        ch: char,
        /// Its offset.
        offset: usize,
    },
}

/// Parses a complete list literal such as `["a", 'b', 3]`.
///
/// # Errors
///
/// Returns [`LiteralError`] if the input is not a flat list of literals.
pub fn parse_list(input: &str) -> Result<Vec<LiteralValue>, LiteralError> {
    if let Some(values) = parse_json_list(input) {
        return Ok(values);
    }
    parse_python_list(input)
}

/// Decodes `input` as a JSON array of scalars. `None` when it is not valid
/// JSON or holds nested arrays or objects, which the fallback reports.
fn parse_json_list(input: &str) -> Option<Vec<LiteralValue>> {
    let values: Vec<Value> = serde_json::from_str(input).ok()?;
    values
        .into_iter()
        .map(|value| match value {
            Value::String(s) => Some(LiteralValue::Str(s)),
            Value::Number(n) => n.as_f64().map(|value| LiteralValue::Number {
                value,
                raw: n.to_string(),
            }),
            Value::Bool(b) => Some(LiteralValue::Bool(b)),
            Value::Null => Some(LiteralValue::Null),
            Value::Array(_) | Value::Object(_) => None,
        })
        .collect()
}

fn parse_python_list(input: &str) -> Result<Vec<LiteralValue>, LiteralError> {
    let mut parser = Parser { input, pos: 0 };
    parser.skip_ws();
    if !parser.eat('[') {
        return Err(LiteralError::MissingOpenBracket);
    }

    let mut values = Vec::new();
    loop {
        parser.skip_ws();
        match parser.peek() {
            None => return Err(LiteralError::Unclosed),
            Some(']') => {
                parser.pos += 1;
                break;
            }
            Some(_) => {}
        }

        values.push(parser.value()?);

        parser.skip_ws();
        match parser.peek() {
            Some(',') => parser.pos += 1,
            Some(']') => {
                parser.pos += 1;
                break;
            }
            Some(ch) => {
                return Err(LiteralError::UnexpectedChar {
                    ch,
                    offset: parser.pos,
                });
            }
            None => return Err(LiteralError::Unclosed),
        }
    }

    parser.skip_ws();
    match parser.peek() {
        None => Ok(values),
        Some(ch) => Err(LiteralError::UnexpectedChar {
            ch,
            offset: parser.pos,
        }),
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while let Some(ch) = self.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            self.pos += ch.len_utf8();
        }
        &self.input[start..self.pos]
    }

    fn value(&mut self) -> Result<LiteralValue, LiteralError> {
        let offset = self.pos;
        match self.peek() {
            Some('"') => self.json_string().map(LiteralValue::Str),
            Some('\'') => self.python_string().map(LiteralValue::Str),
            Some('[') => Err(LiteralError::NestedList { offset }),
            Some(ch) if ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.') => self.number(),
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                let word = self.take_while(|c| c.is_alphanumeric() || c == '_');
                match word {
                    "true" | "True" => Ok(LiteralValue::Bool(true)),
                    "false" | "False" => Ok(LiteralValue::Bool(false)),
                    "null" | "None" => Ok(LiteralValue::Null),
                    other => Err(LiteralError::BareWord {
                        token: other.to_string(),
                    }),
                }
            }
            Some(ch) => Err(LiteralError::UnexpectedChar { ch, offset }),
            None => Err(LiteralError::Unclosed),
        }
    }

    fn number(&mut self) -> Result<LiteralValue, LiteralError> {
        let raw = self.take_while(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'));
        let digits = raw.strip_prefix('+').unwrap_or(raw);
        digits
            .parse::<f64>()
            .map(|value| LiteralValue::Number {
                value,
                raw: digits.to_string(),
            })
            .map_err(|_| LiteralError::InvalidNumber {
                token: raw.to_string(),
            })
    }

    fn json_string(&mut self) -> Result<String, LiteralError> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        loop {
            let ch = self
                .peek()
                .ok_or(LiteralError::UnterminatedString { offset: start })?;
            let at = self.pos;
            self.pos += ch.len_utf8();
            match ch {
                '"' => return Ok(out),
                '\\' => {
                    let esc = self
                        .peek()
                        .ok_or(LiteralError::UnterminatedString { offset: start })?;
                    self.pos += esc.len_utf8();
                    match esc {
                        '"' => out.push('"'),
                        '\\' => out.push('\\'),
                        '/' => out.push('/'),
                        'b' => out.push('\u{8}'),
                        'f' => out.push('\u{c}'),
                        'n' => out.push('\n'),
                        'r' => out.push('\r'),
                        't' => out.push('\t'),
                        'u' => out.push(self.unicode_escape(at)?),
                        _ => return Err(LiteralError::InvalidEscape { offset: at }),
                    }
                }
                _ => out.push(ch),
            }
        }
    }

    fn unicode_escape(&mut self, offset: usize) -> Result<char, LiteralError> {
        let hex = self
            .input
            .get(self.pos..self.pos + 4)
            .ok_or(LiteralError::InvalidEscape { offset })?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| LiteralError::InvalidEscape { offset })?;
        self.pos += 4;
        char::from_u32(code).ok_or(LiteralError::InvalidEscape { offset })
    }

    fn python_string(&mut self) -> Result<String, LiteralError> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        loop {
            let ch = self
                .peek()
                .ok_or(LiteralError::UnterminatedString { offset: start })?;
            self.pos += ch.len_utf8();
            match ch {
                '\'' => return Ok(out),
                '\\' => {
                    let esc = self
                        .peek()
                        .ok_or(LiteralError::UnterminatedString { offset: start })?;
                    self.pos += esc.len_utf8();
                    match esc {
                        '\'' | '"' | '\\' => out.push(esc),
                        'n' => out.push('\n'),
                        'r' => out.push('\r'),
                        't' => out.push('\t'),
                        other => {
                            out.push('\\');
                            out.push(other);
                        }
                    }
                }
                _ => out.push(ch),
            }
        }
    }
}
