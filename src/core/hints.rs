//! RegexLint Hint Engine - Instructional Error Hints
//!
//! Maps every parse-error kind to a beginner-facing hint describing how to
//! fix the pattern. Hints ride on the [`ParseError`](crate::core::errors::ParseError)
//! itself and surface in formatted output and LSP diagnostics.

use crate::core::errors::ParseErrorKind;

/// Return the instructional hint for an error kind.
pub fn hint_for(kind: ParseErrorKind) -> Option<String> {
    let hint = match kind {
        ParseErrorKind::UnexpectedEnd => {
            "The pattern ended before the current construct was complete. \
             Check for a missing closing delimiter, ')' or ']'."
        }
        ParseErrorKind::UnbalancedGroup => {
            "Every '(' needs a matching ')'. Escape a literal parenthesis \
             as '\\(' or '\\)'."
        }
        ParseErrorKind::UnbalancedCharClass => {
            "This character class was opened with '[' but never closed. \
             Add a matching ']', or escape a literal '[' as '\\['."
        }
        ParseErrorKind::InvalidQuantifier => {
            "Quantifiers are '*', '+', '?', '{n}', '{n,}' or '{n,m}' with \
             n <= m, and must follow something repeatable."
        }
        ParseErrorKind::InvalidEscape => {
            "This backslash escape is not recognized. Double the backslash \
             for a literal '\\'."
        }
        ParseErrorKind::InvalidPosixClass => {
            "POSIX classes are written [:alpha:], [:digit:], [:space:] and \
             so on, and only work inside a character class."
        }
        ParseErrorKind::InvalidGroupPrefix => {
            "After '(?' the parser expects ':', '=', '!', '<', '>', '|', \
             '#', 'P', 'C', 'R', '(', a group number or inline flags."
        }
        ParseErrorKind::InvalidConditional => {
            "Conditional groups look like (?(1)yes|no), (?(<name>)...), \
             (?(R)...), (?(DEFINE)...) or (?(VERSION>=n)...)."
        }
        ParseErrorKind::InvalidCallout => {
            "Callouts are written (?C), (?C5) or (?C\"name\")."
        }
        ParseErrorKind::InvalidUnicodeEscape => {
            "Unicode escapes are written \\xHH, \\x{HHHH}, \\uHHHH, \
             \\u{HHHH}, \\N{NAME} or \\p{Property}."
        }
        ParseErrorKind::InvalidOctalEscape => {
            "Octal escapes are written \\o{nnn} or \\0nn with octal digits \
             only (0-7)."
        }
        ParseErrorKind::DuplicateFlag => {
            "Each flag may appear at most once after the closing delimiter."
        }
        ParseErrorKind::InvalidFlag => {
            "Valid flags are: i, m, s, x, u, U, J, D, A, S, X, n."
        }
    };
    Some(hint.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_hint() {
        let kinds = [
            ParseErrorKind::UnexpectedEnd,
            ParseErrorKind::UnbalancedGroup,
            ParseErrorKind::UnbalancedCharClass,
            ParseErrorKind::InvalidQuantifier,
            ParseErrorKind::InvalidEscape,
            ParseErrorKind::InvalidPosixClass,
            ParseErrorKind::InvalidGroupPrefix,
            ParseErrorKind::InvalidConditional,
            ParseErrorKind::InvalidCallout,
            ParseErrorKind::InvalidUnicodeEscape,
            ParseErrorKind::InvalidOctalEscape,
            ParseErrorKind::DuplicateFlag,
            ParseErrorKind::InvalidFlag,
        ];
        for kind in kinds {
            assert!(hint_for(kind).is_some(), "missing hint for {:?}", kind);
        }
    }

    #[test]
    fn flag_hint_lists_the_flag_set() {
        let hint = hint_for(ParseErrorKind::InvalidFlag).unwrap();
        assert!(hint.contains("i, m, s, x"));
    }
}
