//! RegexLint Parser - Recursive Descent Parser for the PCRE Dialect
//!
//! This module implements a hand-rolled recursive-descent parser that
//! transforms a PCRE pattern source into AST nodes. The parser handles:
//!   - Delimited sources (`/pat/imx`, including bracket delimiter pairs)
//!     and bare patterns
//!   - Alternation and sequencing, with literal-run coalescing
//!   - Groups of every kind (capturing, non-capturing, named, atomic,
//!     branch-reset, lookaround, inline flags), conditionals and DEFINE
//!     blocks, subroutine calls, callouts and control verbs
//!   - Character classes with ranges, POSIX classes and `&&` / `--`
//!     operations
//!   - The full escape grammar: character types, assertions, control
//!     characters, hex/octal/unicode literals, properties, backreferences
//!   - Quantifiers with greedy, lazy and possessive modes
//!   - Free-spacing mode (`x` flag) with `#`-to-end-of-line comments
//!
//! The parser produces the nodes defined in `nodes.rs` and fails with a
//! structured [`ParseError`] carrying the error kind, source offset and an
//! instructional hint. It never returns a partial tree.

mod classes;
mod escapes;
mod groups;
mod quantifiers;

use crate::core::errors::{ParseError, ParseErrorKind};
use crate::core::nodes::*;

/// Flags accepted after the closing delimiter.
pub const VALID_FLAGS: &str = "imsxuUJDASXn";

/// Whether the source carries delimiters around the pattern body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    /// `/pattern/flags` with any non-alphanumeric delimiter or a bracket pair
    Delimited,
    /// The pattern body alone
    Bare,
}

/// Cursor for tracking position in the pattern body.
#[derive(Debug, Clone)]
pub(crate) struct Cursor {
    chars: Vec<char>,
    i: usize,
    extended_mode: bool,
    in_class: usize,
}

impl Cursor {
    fn new(text: &str, extended_mode: bool) -> Self {
        Self {
            chars: text.chars().collect(),
            i: 0,
            extended_mode,
            in_class: 0,
        }
    }

    pub(crate) fn eof(&self) -> bool {
        self.i >= self.chars.len()
    }

    pub(crate) fn pos(&self) -> usize {
        self.i
    }

    pub(crate) fn peek_char(&self, n: usize) -> Option<char> {
        self.chars.get(self.i + n).copied()
    }

    pub(crate) fn take(&mut self) -> Option<char> {
        let ch = self.chars.get(self.i).copied();
        if ch.is_some() {
            self.i += 1;
        }
        ch
    }

    /// True when the upcoming input starts with `s`.
    pub(crate) fn starts_with(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(n, expected)| self.peek_char(n) == Some(expected))
    }

    /// Consume `s` when the upcoming input starts with it.
    pub(crate) fn match_str(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.i += s.chars().count();
            true
        } else {
            false
        }
    }

    /// In free-spacing mode, skip unescaped whitespace and `#`-to-EOL
    /// comments. No-op inside a character class.
    pub(crate) fn skip_ws_and_comments(&mut self) {
        if !self.extended_mode || self.in_class > 0 {
            return;
        }
        while let Some(ch) = self.peek_char(0) {
            if " \t\r\n".contains(ch) {
                self.i += 1;
                continue;
            }
            if ch == '#' {
                while let Some(c) = self.peek_char(0) {
                    if c == '\r' || c == '\n' {
                        break;
                    }
                    self.i += 1;
                }
                continue;
            }
            break;
        }
    }
}

/// Parser for the PCRE dialect.
pub struct Parser {
    /// The full original source, kept for error context
    full_text: String,
    /// Offset of the pattern body within `full_text`
    body_offset: usize,
    pub(crate) cur: Cursor,
    delimiter: char,
    flags: String,
}

impl Parser {
    /// Create a parser for a delimited source.
    pub fn new(source: &str) -> Result<Self, ParseError> {
        Self::with_mode(source, SourceMode::Delimited)
    }

    /// Create a parser, choosing whether delimiters are expected.
    pub fn with_mode(source: &str, mode: SourceMode) -> Result<Self, ParseError> {
        let (delimiter, body, body_offset, flags) = match mode {
            SourceMode::Delimited => split_delimited(source)?,
            SourceMode::Bare => ('/', source.to_string(), 0, String::new()),
        };

        let flags = validate_flags(source, &flags, body_offset + body.chars().count() + 1)?;
        let extended = flags.contains('x');

        Ok(Parser {
            full_text: source.to_string(),
            body_offset,
            cur: Cursor::new(&body, extended),
            delimiter,
            flags,
        })
    }

    /// Build an error at a position relative to the pattern body.
    pub(crate) fn error(
        &self,
        kind: ParseErrorKind,
        message: impl Into<String>,
        body_pos: usize,
    ) -> ParseError {
        ParseError::new(
            kind,
            message.into(),
            self.body_offset + body_pos,
            self.full_text.clone(),
        )
    }

    /// Error at the cursor's current position.
    pub(crate) fn error_here(
        &self,
        kind: ParseErrorKind,
        message: impl Into<String>,
    ) -> ParseError {
        self.error(kind, message, self.cur.pos())
    }

    /// Parse the entire source into a root `Regex` node.
    pub fn parse(&mut self) -> Result<Regex, ParseError> {
        let pattern = self.parse_alternation()?;
        self.cur.skip_ws_and_comments();

        if let Some(ch) = self.cur.peek_char(0) {
            if ch == ')' {
                return Err(self.error_here(
                    ParseErrorKind::UnbalancedGroup,
                    "unmatched closing parenthesis",
                ));
            }
            return Err(self.error_here(
                ParseErrorKind::UnexpectedEnd,
                format!("unexpected trailing input starting at '{}'", ch),
            ));
        }

        Ok(Regex {
            delimiter: self.delimiter,
            flags: self.flags.clone(),
            pattern: Box::new(pattern),
        })
    }

    /// `alternation := sequence ('|' sequence)*`
    ///
    /// A single branch collapses to the branch itself; empty branches are
    /// preserved as empty literals.
    pub(crate) fn parse_alternation(&mut self) -> Result<Node, ParseError> {
        let mut alternatives = vec![self.parse_sequence()?];

        while self.cur.peek_char(0) == Some('|') {
            self.cur.take();
            alternatives.push(self.parse_sequence()?);
        }

        if alternatives.len() == 1 {
            Ok(alternatives.pop().unwrap())
        } else {
            Ok(Node::Alternation(Alternation { alternatives }))
        }
    }

    /// `sequence := (atom quantifier?)*`
    ///
    /// Adjacent unquantified literal characters coalesce into a single
    /// `Literal` node; a quantifier binds to the immediately preceding atom
    /// only.
    pub(crate) fn parse_sequence(&mut self) -> Result<Node, ParseError> {
        let mut children: Vec<Node> = Vec::new();

        loop {
            self.cur.skip_ws_and_comments();

            match self.cur.peek_char(0) {
                None | Some('|') | Some(')') => break,
                _ => {}
            }

            let atom = self.parse_atom()?;

            self.cur.skip_ws_and_comments();
            if let Some((token, kind)) = self.try_parse_quantifier()? {
                children.push(Node::Quantifier(Quantifier {
                    kind,
                    quantifier: token,
                    child: Box::new(atom),
                }));
                continue;
            }

            // Coalesce adjacent literal characters into one run.
            if let Node::Literal(ref lit) = atom {
                if let Some(Node::Literal(prev)) = children.last_mut() {
                    prev.value.push_str(&lit.value);
                    continue;
                }
            }
            children.push(atom);
        }

        match children.len() {
            0 => Ok(Node::empty()),
            1 => Ok(children.pop().unwrap()),
            _ => Ok(Node::Sequence(Sequence { children })),
        }
    }

    /// Parse a single atom: group, class, escape, anchor, dot or literal.
    fn parse_atom(&mut self) -> Result<Node, ParseError> {
        let ch = match self.cur.peek_char(0) {
            Some(ch) => ch,
            None => {
                return Err(
                    self.error_here(ParseErrorKind::UnexpectedEnd, "unexpected end of pattern")
                )
            }
        };

        match ch {
            '.' => {
                self.cur.take();
                Ok(Node::Dot(Dot))
            }
            '^' => {
                self.cur.take();
                Ok(Node::Anchor(Anchor { value: '^' }))
            }
            '$' => {
                self.cur.take();
                Ok(Node::Anchor(Anchor { value: '$' }))
            }
            '(' => self.parse_group(),
            '[' => self.parse_char_class(),
            '\\' => self.parse_escape(false),
            '*' | '+' | '?' => Err(self.error_here(
                ParseErrorKind::InvalidQuantifier,
                format!("quantifier '{}' has nothing to repeat", ch),
            )),
            '{' => {
                // A brace that forms a valid quantifier here has nothing to
                // repeat; otherwise it is a literal '{'.
                if self.quantifier_token_ahead() {
                    Err(self.error_here(
                        ParseErrorKind::InvalidQuantifier,
                        "quantifier '{...}' has nothing to repeat",
                    ))
                } else {
                    self.cur.take();
                    Ok(Node::Literal(Literal {
                        value: "{".to_string(),
                    }))
                }
            }
            _ => {
                self.cur.take();
                Ok(Node::Literal(Literal {
                    value: ch.to_string(),
                }))
            }
        }
    }
}

/// Split a delimited source into `(delimiter, body, body_offset, flags)`.
fn split_delimited(source: &str) -> Result<(char, String, usize, String), ParseError> {
    let chars: Vec<char> = source.chars().collect();

    let open = match chars.first() {
        Some(&ch) => ch,
        None => {
            return Err(ParseError::new(
                ParseErrorKind::UnexpectedEnd,
                "empty pattern source".to_string(),
                0,
                source.to_string(),
            ))
        }
    };

    if open.is_alphanumeric() || open == '\\' || open.is_whitespace() {
        return Err(ParseError::new(
            ParseErrorKind::UnexpectedEnd,
            "delimiter must not be alphanumeric, backslash or whitespace".to_string(),
            0,
            source.to_string(),
        ));
    }

    let close = match open {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        '<' => '>',
        other => other,
    };

    let end = if open == close {
        // Last unescaped occurrence of the delimiter.
        let mut last = None;
        let mut escaped = false;
        for (i, &ch) in chars.iter().enumerate().skip(1) {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == close {
                last = Some(i);
            }
        }
        last
    } else {
        // Bracket pair: track nesting depth.
        let mut depth = 1usize;
        let mut escaped = false;
        let mut found = None;
        for (i, &ch) in chars.iter().enumerate().skip(1) {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                depth += 1;
            } else if ch == close {
                depth -= 1;
                if depth == 0 {
                    found = Some(i);
                    break;
                }
            }
        }
        found
    };

    let end = end.ok_or_else(|| {
        ParseError::new(
            ParseErrorKind::UnexpectedEnd,
            format!("no ending delimiter '{}' found", close),
            chars.len(),
            source.to_string(),
        )
    })?;

    let body: String = chars[1..end].iter().collect();
    let flags: String = chars[end + 1..].iter().collect();
    Ok((open, body, 1, flags))
}

/// Validate the trailing flag run: every character must belong to the flag
/// set and appear at most once.
fn validate_flags(source: &str, flags: &str, flags_offset: usize) -> Result<String, ParseError> {
    let mut seen = String::new();
    for (i, ch) in flags.chars().enumerate() {
        if !VALID_FLAGS.contains(ch) {
            return Err(ParseError::new(
                ParseErrorKind::InvalidFlag,
                format!("unknown flag '{}'", ch),
                flags_offset + i,
                source.to_string(),
            ));
        }
        if seen.contains(ch) {
            return Err(ParseError::new(
                ParseErrorKind::DuplicateFlag,
                format!("flag '{}' appears more than once", ch),
                flags_offset + i,
                source.to_string(),
            ));
        }
        seen.push(ch);
    }
    Ok(seen)
}

/// Parse a delimited PCRE source (`/pat/flags`, `#pat#`, `{pat}i`, ...)
/// into a root `Regex` node.
pub fn parse(source: &str) -> Result<Regex, ParseError> {
    Parser::new(source)?.parse()
}

/// Parse a bare pattern body with no delimiters and no flags. The root
/// node reports `/` as its delimiter.
pub fn parse_bare(source: &str) -> Result<Regex, ParseError> {
    Parser::with_mode(source, SourceMode::Bare)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_literal_run() {
        let regex = parse("/hello/").unwrap();
        assert_eq!(regex.delimiter, '/');
        match *regex.pattern {
            Node::Literal(ref lit) => assert_eq!(lit.value, "hello"),
            ref other => panic!("expected coalesced Literal, got {:?}", other),
        }
    }

    #[test]
    fn quantifier_binds_to_last_atom_only() {
        let regex = parse("/ab*/").unwrap();
        match *regex.pattern {
            Node::Sequence(ref seq) => {
                assert_eq!(seq.children.len(), 2);
                assert!(matches!(seq.children[0], Node::Literal(_)));
                assert!(matches!(seq.children[1], Node::Quantifier(_)));
            }
            ref other => panic!("expected Sequence, got {:?}", other),
        }
    }

    #[test]
    fn empty_alternative_is_preserved() {
        let regex = parse("/a||b/").unwrap();
        match *regex.pattern {
            Node::Alternation(ref alt) => {
                assert_eq!(alt.alternatives.len(), 3);
                assert_eq!(alt.alternatives[1], Node::empty());
            }
            ref other => panic!("expected Alternation, got {:?}", other),
        }
    }

    #[test]
    fn bracket_delimiters_pair_up() {
        let regex = parse("{a+}i").unwrap();
        assert_eq!(regex.delimiter, '{');
        assert_eq!(regex.flags, "i");
    }

    #[test]
    fn duplicate_flag_is_rejected() {
        let err = parse("/a/ii").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DuplicateFlag);
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = parse("/a/q").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidFlag);
    }

    #[test]
    fn unmatched_close_paren_is_reported() {
        let err = parse("/a)/").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnbalancedGroup);
    }

    #[test]
    fn quantifier_without_atom_is_rejected() {
        let err = parse("/*a/").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidQuantifier);
    }

    #[test]
    fn free_spacing_skips_whitespace_and_comments() {
        let regex = parse("/a b # trailing\nc/x").unwrap();
        match *regex.pattern {
            Node::Literal(ref lit) => assert_eq!(lit.value, "abc"),
            ref other => panic!("expected coalesced Literal, got {:?}", other),
        }
    }
}
