//! RegexLint Error Types - Rich Parse Diagnostics
//!
//! Parse failures carry a machine-readable kind, the exact source offset,
//! the full input text, and an instructional hint. The formatted display
//! points a caret at the offending position; `to_lsp_diagnostic` converts
//! the error into an LSP-compatible JSON value for editor integrations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of parse-failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum ParseErrorKind {
    #[error("unexpected end of pattern")]
    UnexpectedEnd,
    #[error("unbalanced group")]
    UnbalancedGroup,
    #[error("unbalanced character class")]
    UnbalancedCharClass,
    #[error("invalid quantifier")]
    InvalidQuantifier,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("invalid POSIX class")]
    InvalidPosixClass,
    #[error("invalid group prefix")]
    InvalidGroupPrefix,
    #[error("invalid conditional")]
    InvalidConditional,
    #[error("invalid callout")]
    InvalidCallout,
    #[error("invalid unicode escape")]
    InvalidUnicodeEscape,
    #[error("invalid octal escape")]
    InvalidOctalEscape,
    #[error("duplicate flag")]
    DuplicateFlag,
    #[error("invalid flag")]
    InvalidFlag,
}

impl ParseErrorKind {
    /// Stable snake_case code used in LSP diagnostics and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            ParseErrorKind::UnexpectedEnd => "unexpected_end",
            ParseErrorKind::UnbalancedGroup => "unbalanced_group",
            ParseErrorKind::UnbalancedCharClass => "unbalanced_char_class",
            ParseErrorKind::InvalidQuantifier => "invalid_quantifier",
            ParseErrorKind::InvalidEscape => "invalid_escape",
            ParseErrorKind::InvalidPosixClass => "invalid_posix_class",
            ParseErrorKind::InvalidGroupPrefix => "invalid_group_prefix",
            ParseErrorKind::InvalidConditional => "invalid_conditional",
            ParseErrorKind::InvalidCallout => "invalid_callout",
            ParseErrorKind::InvalidUnicodeEscape => "invalid_unicode_escape",
            ParseErrorKind::InvalidOctalEscape => "invalid_octal_escape",
            ParseErrorKind::DuplicateFlag => "duplicate_flag",
            ParseErrorKind::InvalidFlag => "invalid_flag",
        }
    }
}

/// Rich parse error with position tracking and an instructional hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    /// Machine-readable failure category
    pub kind: ParseErrorKind,
    /// A concise description of what went wrong
    pub message: String,
    /// The character position (0-indexed) where the error occurred
    pub pos: usize,
    /// The full input text being parsed
    pub text: String,
    /// An instructional hint explaining how to fix the error
    pub hint: Option<String>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: String, pos: usize, text: String) -> Self {
        let hint = crate::core::hints::hint_for(kind);
        ParseError {
            kind,
            message,
            pos,
            text,
            hint,
        }
    }

    /// Locate the line and column of `pos` within `text`. Returns
    /// `(line_index, line_text, column)`, all 0-indexed.
    fn locate(&self) -> (usize, &str, usize) {
        let mut current = 0;
        for (i, line) in self.text.lines().enumerate() {
            let line_len = line.len() + 1;
            if current + line_len > self.pos {
                return (i, line, self.pos - current);
            }
            current += line_len;
        }
        // Error beyond the last line
        match self.text.lines().last() {
            Some(last) => (self.text.lines().count() - 1, last, last.len()),
            None => (0, "", 0),
        }
    }

    /// Format the error with source context and a caret under the position.
    fn format_error(&self) -> String {
        if self.text.is_empty() {
            return format!("{} at position {}", self.message, self.pos);
        }

        let (line_idx, line_text, col) = self.locate();

        let mut parts = vec![
            format!("Pattern parse error: {}", self.message),
            String::new(),
            format!("> {} | {}", line_idx + 1, line_text),
            format!(">   | {}^", " ".repeat(col)),
        ];

        if let Some(ref hint) = self.hint {
            parts.push(String::new());
            parts.push(format!("Hint: {}", hint));
        }

        parts.join("\n")
    }

    /// Convert the error to LSP Diagnostic format.
    ///
    /// The returned value follows the Language Server Protocol Diagnostic
    /// shape: a line/character range, severity 1 (error), the message with
    /// hint appended, and a stable error code.
    pub fn to_lsp_diagnostic(&self) -> serde_json::Value {
        let (line_idx, _, col) = if self.text.is_empty() {
            (0, "", self.pos)
        } else {
            self.locate()
        };

        let mut message = self.message.clone();
        if let Some(ref hint) = self.hint {
            message.push_str(&format!("\n\nHint: {}", hint));
        }

        serde_json::json!({
            "range": {
                "start": {"line": line_idx, "character": col},
                "end": {"line": line_idx, "character": col + 1}
            },
            "severity": 1,
            "message": message,
            "source": "RegexLint",
            "code": self.kind.code()
        })
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format_error())
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_carries_kind_and_position() {
        let err = ParseError::new(
            ParseErrorKind::UnbalancedGroup,
            "missing closing parenthesis".to_string(),
            4,
            "(abc".to_string(),
        );
        assert_eq!(err.kind, ParseErrorKind::UnbalancedGroup);
        assert_eq!(err.pos, 4);
        assert!(err.hint.is_some());
    }

    #[test]
    fn formatted_error_points_at_position() {
        let err = ParseError::new(
            ParseErrorKind::InvalidQuantifier,
            "nothing to repeat".to_string(),
            0,
            "*abc".to_string(),
        );
        let formatted = err.to_string();
        assert!(formatted.contains("nothing to repeat"));
        assert!(formatted.contains("> 1 | *abc"));
        assert!(formatted.contains("| ^"));
    }

    #[test]
    fn lsp_diagnostic_shape() {
        let err = ParseError::new(
            ParseErrorKind::InvalidFlag,
            "unknown flag 'q'".to_string(),
            6,
            "/abc/q".to_string(),
        );
        let diag = err.to_lsp_diagnostic();
        assert_eq!(diag["severity"], 1);
        assert_eq!(diag["source"], "RegexLint");
        assert_eq!(diag["code"], "invalid_flag");
        assert_eq!(diag["range"]["start"]["line"], 0);
    }

    #[test]
    fn empty_text_falls_back_to_simple_format() {
        let err = ParseError::new(
            ParseErrorKind::UnexpectedEnd,
            "pattern ended early".to_string(),
            0,
            String::new(),
        );
        assert_eq!(err.to_string(), "pattern ended early at position 0");
    }
}
