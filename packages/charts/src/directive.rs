//! Scanner for `CHART_DATA:` directive lines.
//!
//! Grammar (whitespace between fields is optional):
//!
//! ```text
//! CHART_DATA: TYPE=<word> TITLE="<text>" LABELS=[...] DATA=[...] [SOURCE="<text>"]
//! ```
//!
//! `<word>` is one or more letters, digits or underscores; quoted text is
//! non-empty and cannot contain `"`; a list runs from `[` to the first
//! `]`. A malformed `SOURCE` is ignored rather than failing the directive.
//!
//! The scanner walks the text from one `CHART_DATA:` token to the next.
//! After a successful match it resumes behind the matched directive; after
//! a structural failure it resumes behind the failing token.

use std::ops::Range;

use strum_macros::{AsRefStr, Display};

use crate::DirectiveError;

/// Literal token that starts every directive.
pub const DIRECTIVE_TOKEN: &str = "CHART_DATA:";

/// The fields of a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum DirectiveField {
    /// `TYPE=`
    Type,
    /// `TITLE=`
    Title,
    /// `LABELS=`
    Labels,
    /// `DATA=`
    Data,
    /// `SOURCE=`
    Source,
}

/// Raw fields captured from one directive, borrowed from the report text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveMatch<'a> {
    /// Chart type as written.
    pub kind: &'a str,
    /// Title as written, without quotes.
    pub title: &'a str,
    /// Labels list literal including brackets.
    pub labels: &'a str,
    /// Data list literal including brackets.
    pub data: &'a str,
    /// Source citation, without quotes.
    pub source: Option<&'a str>,
    /// Byte range of the whole directive in the text.
    pub span: Range<usize>,
}

/// Iterator over the directives of a text, in order of appearance.
///
/// Yields `Err` for a `CHART_DATA:` token whose fields do not follow the
/// grammar; scanning continues with the next token.
pub struct DirectiveScanner<'a> {
    text: &'a str,
    pos: usize,
}

/// Scans `text` for directives.
#[must_use]
pub const fn scan_directives(text: &str) -> DirectiveScanner<'_> {
    DirectiveScanner { text, pos: 0 }
}

impl<'a> Iterator for DirectiveScanner<'a> {
    type Item = Result<DirectiveMatch<'a>, DirectiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.pos + self.text.get(self.pos..)?.find(DIRECTIVE_TOKEN)?;
        let mut cursor = Cursor {
            text: self.text,
            pos: start + DIRECTIVE_TOKEN.len(),
        };

        match cursor.directive(start) {
            Ok(found) => {
                self.pos = found.span.end;
                Some(Ok(found))
            }
            Err(e) => {
                self.pos = start + DIRECTIVE_TOKEN.len();
                Some(Err(e))
            }
        }
    }
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn key(&mut self, field: DirectiveField) -> Result<(), DirectiveError> {
        self.skip_ws();
        let key = field.as_ref();
        let rest = self.rest();
        if rest.starts_with(key) && rest[key.len()..].starts_with('=') {
            self.pos += key.len() + 1;
            Ok(())
        } else {
            Err(DirectiveError::MissingField { field })
        }
    }

    fn word(&mut self, field: DirectiveField) -> Result<&'a str, DirectiveError> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(DirectiveError::InvalidField {
                field,
                reason: "expected a word".to_string(),
            });
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn quoted(&mut self, field: DirectiveField) -> Result<&'a str, DirectiveError> {
        let rest = self.rest();
        let Some(body) = rest.strip_prefix('"') else {
            return Err(DirectiveError::InvalidField {
                field,
                reason: "expected a double-quoted string".to_string(),
            });
        };
        let end = body.find('"').ok_or_else(|| DirectiveError::InvalidField {
            field,
            reason: "unterminated string".to_string(),
        })?;
        if end == 0 {
            return Err(DirectiveError::InvalidField {
                field,
                reason: "empty string".to_string(),
            });
        }
        self.pos += end + 2;
        Ok(&body[..end])
    }

    fn bracketed(&mut self, field: DirectiveField) -> Result<&'a str, DirectiveError> {
        let rest = self.rest();
        if !rest.starts_with('[') {
            return Err(DirectiveError::InvalidField {
                field,
                reason: "expected '['".to_string(),
            });
        }
        let end = rest.find(']').ok_or_else(|| DirectiveError::InvalidField {
            field,
            reason: "list is not closed with ']'".to_string(),
        })?;
        self.pos += end + 1;
        Ok(&rest[..=end])
    }

    fn directive(&mut self, start: usize) -> Result<DirectiveMatch<'a>, DirectiveError> {
        self.key(DirectiveField::Type)?;
        let kind = self.word(DirectiveField::Type)?;
        self.key(DirectiveField::Title)?;
        let title = self.quoted(DirectiveField::Title)?;
        self.key(DirectiveField::Labels)?;
        let labels = self.bracketed(DirectiveField::Labels)?;
        self.key(DirectiveField::Data)?;
        let data = self.bracketed(DirectiveField::Data)?;

        let before_source = self.pos;
        let source = match self
            .key(DirectiveField::Source)
            .and_then(|()| self.quoted(DirectiveField::Source))
        {
            Ok(source) => Some(source),
            Err(_) => {
                self.pos = before_source;
                None
            }
        };

        Ok(DirectiveMatch {
            kind,
            title,
            labels,
            data,
            source,
            span: start..self.pos,
        })
    }
}
