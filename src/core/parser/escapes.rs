//! Escape recognition: character types, assertions, control characters,
//! hex/octal/unicode character literals, properties, named references and
//! the legacy octal-versus-backreference policy.

use crate::core::errors::{ParseError, ParseErrorKind};
use crate::core::nodes::*;
use crate::core::parser::Parser;

impl Parser {
    /// Parse one escape sequence. The cursor sits on the backslash.
    /// `in_class` selects the character-class reading: class escapes keep
    /// their meaning, while assertion and reference escapes degrade to
    /// literals the way PCRE reads them inside `[...]`.
    pub(crate) fn parse_escape(&mut self, in_class: bool) -> Result<Node, ParseError> {
        let start = self.cur.pos();
        self.cur.take(); // '\'

        let ch = match self.cur.take() {
            Some(ch) => ch,
            None => {
                return Err(self.error(
                    ParseErrorKind::UnexpectedEnd,
                    "pattern ends with a trailing backslash",
                    start,
                ))
            }
        };

        match ch {
            // Character types. \R is only special outside a class.
            'd' | 'D' | 's' | 'S' | 'w' | 'W' | 'h' | 'H' | 'v' | 'V' => {
                Ok(Node::CharType(CharType { value: ch }))
            }
            'R' if !in_class => Ok(Node::CharType(CharType { value: 'R' })),

            // Assertions lose their meaning inside a class: \b becomes the
            // backspace character, the rest read as plain letters.
            'b' if in_class => Ok(Node::Literal(Literal {
                value: "\u{0008}".to_string(),
            })),
            'A' | 'z' | 'Z' | 'G' | 'b' | 'B' if !in_class => {
                Ok(Node::Assertion(Assertion { value: ch }))
            }

            'K' if !in_class => Ok(Node::Keep(Keep)),
            'X' if !in_class => Ok(Node::Unicode(Unicode {
                code: "X".to_string(),
            })),

            'c' => self.parse_control_char(start),
            'p' | 'P' => self.parse_unicode_property(start, ch == 'P'),
            'x' => self.parse_hex_escape(start),
            'u' => self.parse_u_escape(start),
            'N' => self.parse_named_char(start),
            'o' => self.parse_braced_octal(start),

            '0' => self.parse_legacy_octal(start, ch),
            '1'..='9' => self.parse_digit_escape(start, ch, in_class),

            'k' if !in_class => self.parse_k_backref(start),
            'g' if !in_class => self.parse_g_reference(start),

            // Control escapes resolve to the character they denote.
            'n' => Ok(literal_char('\n')),
            'r' => Ok(literal_char('\r')),
            't' => Ok(literal_char('\t')),
            'f' => Ok(literal_char('\u{000C}')),
            'a' => Ok(literal_char('\u{0007}')),
            'e' => Ok(literal_char('\u{001B}')),

            // Any other escaped character is that character, literally.
            other => Ok(literal_char(other)),
        }
    }

    /// `\cX` - control character.
    fn parse_control_char(&mut self, start: usize) -> Result<Node, ParseError> {
        match self.cur.take() {
            Some(ch) if ch.is_ascii() && !ch.is_ascii_control() => {
                Ok(Node::ControlChar(ControlChar { ch }))
            }
            Some(_) => Err(self.error(
                ParseErrorKind::InvalidEscape,
                "\\c must be followed by a printable ASCII character",
                start,
            )),
            None => Err(self.error(
                ParseErrorKind::UnexpectedEnd,
                "\\c at end of pattern",
                start,
            )),
        }
    }

    /// `\p{Prop}`, `\P{Prop}`, `\pL`. Negation normalizes to a leading `^`
    /// in the property text; `\P{^L}` cancels out to a positive match.
    fn parse_unicode_property(&mut self, start: usize, negated: bool) -> Result<Node, ParseError> {
        if self.cur.peek_char(0) == Some('{') {
            self.cur.take();
            let mut prop = String::new();
            loop {
                match self.cur.take() {
                    Some('}') => break,
                    Some(ch) => prop.push(ch),
                    None => {
                        return Err(self.error(
                            ParseErrorKind::InvalidUnicodeEscape,
                            "unterminated \\p{...} property",
                            start,
                        ))
                    }
                }
            }
            if prop.is_empty() || prop == "^" {
                return Err(self.error(
                    ParseErrorKind::InvalidUnicodeEscape,
                    "empty \\p{} property",
                    start,
                ));
            }
            let inner_negated = prop.starts_with('^');
            let bare = prop.trim_start_matches('^');
            let final_negated = negated != inner_negated;
            let prop = if final_negated {
                format!("^{}", bare)
            } else {
                bare.to_string()
            };
            Ok(Node::UnicodeProp(UnicodeProp {
                prop,
                has_braces: true,
            }))
        } else {
            match self.cur.take() {
                Some(ch) if ch.is_ascii_alphabetic() => {
                    let prop = if negated {
                        format!("^{}", ch)
                    } else {
                        ch.to_string()
                    };
                    Ok(Node::UnicodeProp(UnicodeProp {
                        prop,
                        has_braces: false,
                    }))
                }
                _ => Err(self.error(
                    ParseErrorKind::InvalidUnicodeEscape,
                    "\\p must be followed by a property letter or {...}",
                    start,
                )),
            }
        }
    }

    /// `\xHH` or `\x{H...}`. PCRE accepts zero, one or two bare hex digits.
    fn parse_hex_escape(&mut self, start: usize) -> Result<Node, ParseError> {
        if self.cur.peek_char(0) == Some('{') {
            let digits = self.read_braced_digits(start, 16, "\\x{...}")?;
            self.check_codepoint(start, &digits, 16)?;
            Ok(Node::CharLiteral(CharLiteral {
                kind: CharLiteralKind::Unicode,
                original: format!("\\x{{{}}}", digits),
            }))
        } else {
            let mut digits = String::new();
            for _ in 0..2 {
                match self.cur.peek_char(0) {
                    Some(ch) if ch.is_ascii_hexdigit() => {
                        digits.push(ch);
                        self.cur.take();
                    }
                    _ => break,
                }
            }
            Ok(Node::CharLiteral(CharLiteral {
                kind: CharLiteralKind::Unicode,
                original: format!("\\x{}", digits),
            }))
        }
    }

    /// `\uHHHH` or `\u{H...}`.
    fn parse_u_escape(&mut self, start: usize) -> Result<Node, ParseError> {
        if self.cur.peek_char(0) == Some('{') {
            let digits = self.read_braced_digits(start, 16, "\\u{...}")?;
            self.check_codepoint(start, &digits, 16)?;
            return Ok(Node::CharLiteral(CharLiteral {
                kind: CharLiteralKind::Unicode,
                original: format!("\\u{{{}}}", digits),
            }));
        }
        let mut digits = String::new();
        for _ in 0..4 {
            match self.cur.peek_char(0) {
                Some(ch) if ch.is_ascii_hexdigit() => {
                    digits.push(ch);
                    self.cur.take();
                }
                _ => break,
            }
        }
        if digits.len() != 4 {
            return Err(self.error(
                ParseErrorKind::InvalidUnicodeEscape,
                "\\u requires exactly four hex digits or {...}",
                start,
            ));
        }
        Ok(Node::CharLiteral(CharLiteral {
            kind: CharLiteralKind::Unicode,
            original: format!("\\u{}", digits),
        }))
    }

    /// `\N{NAME}` or `\N{U+HHHH}` - named or numbered unicode character.
    fn parse_named_char(&mut self, start: usize) -> Result<Node, ParseError> {
        if self.cur.peek_char(0) != Some('{') {
            return Err(self.error(
                ParseErrorKind::InvalidUnicodeEscape,
                "\\N must be followed by {name}",
                start,
            ));
        }
        self.cur.take();
        let mut name = String::new();
        loop {
            match self.cur.take() {
                Some('}') => break,
                Some(ch) => name.push(ch),
                None => {
                    return Err(self.error(
                        ParseErrorKind::InvalidUnicodeEscape,
                        "unterminated \\N{...} name",
                        start,
                    ))
                }
            }
        }
        if name.is_empty() {
            return Err(self.error(
                ParseErrorKind::InvalidUnicodeEscape,
                "empty \\N{} name",
                start,
            ));
        }
        Ok(Node::CharLiteral(CharLiteral {
            kind: CharLiteralKind::UnicodeNamed,
            original: format!("\\N{{{}}}", name),
        }))
    }

    /// `\o{nnn}` - braced octal.
    fn parse_braced_octal(&mut self, start: usize) -> Result<Node, ParseError> {
        if self.cur.peek_char(0) != Some('{') {
            return Err(self.error(
                ParseErrorKind::InvalidOctalEscape,
                "\\o must be followed by {octal digits}",
                start,
            ));
        }
        let digits = self.read_braced_digits(start, 8, "\\o{...}")?;
        self.check_codepoint(start, &digits, 8)?;
        Ok(Node::CharLiteral(CharLiteral {
            kind: CharLiteralKind::Octal,
            original: format!("\\o{{{}}}", digits),
        }))
    }

    /// `\0`, `\0n`, `\0nn` - legacy octal with a leading zero.
    fn parse_legacy_octal(&mut self, _start: usize, first: char) -> Result<Node, ParseError> {
        let mut digits = first.to_string();
        for _ in 0..2 {
            match self.cur.peek_char(0) {
                Some(ch) if ('0'..='7').contains(&ch) => {
                    digits.push(ch);
                    self.cur.take();
                }
                _ => break,
            }
        }
        Ok(Node::CharLiteral(CharLiteral {
            kind: CharLiteralKind::OctalLegacy,
            original: format!("\\{}", digits),
        }))
    }

    /// `\1`..`\9` and longer digit runs.
    ///
    /// Outside a class: one or two digits are always a backreference; a
    /// three-digit all-octal run is a legacy octal character. Inside a
    /// class backreferences are meaningless, so octal digits read as a
    /// legacy octal and `8`/`9` as plain literals.
    fn parse_digit_escape(
        &mut self,
        start: usize,
        first: char,
        in_class: bool,
    ) -> Result<Node, ParseError> {
        if in_class {
            if ('1'..='7').contains(&first) {
                return self.parse_legacy_octal(start, first);
            }
            return Ok(literal_char(first));
        }

        let mut digits = first.to_string();
        let mut n = 0;
        while digits.len() < 3 {
            match self.cur.peek_char(n) {
                Some(ch) if ch.is_ascii_digit() => {
                    digits.push(ch);
                    n += 1;
                }
                _ => break,
            }
        }

        if digits.len() == 3 && digits.chars().all(|ch| ('0'..='7').contains(&ch)) {
            // All-octal three-digit run: legacy octal character.
            self.cur.take();
            self.cur.take();
            return Ok(Node::CharLiteral(CharLiteral {
                kind: CharLiteralKind::OctalLegacy,
                original: format!("\\{}", digits),
            }));
        }

        // Backreference by number: at most two digits.
        let mut reference = first.to_string();
        if let Some(ch) = self.cur.peek_char(0) {
            if ch.is_ascii_digit() {
                reference.push(ch);
                self.cur.take();
            }
        }
        Ok(Node::Backref(Backref { reference }))
    }

    /// `\k<name>`, `\k'name'`, `\k{name}` - named backreference.
    fn parse_k_backref(&mut self, start: usize) -> Result<Node, ParseError> {
        let (close, label) = match self.cur.peek_char(0) {
            Some('<') => ('>', "\\k<...>"),
            Some('\'') => ('\'', "\\k'...'"),
            Some('{') => ('}', "\\k{...}"),
            _ => {
                return Err(self.error(
                    ParseErrorKind::InvalidEscape,
                    "\\k must be followed by <name>, 'name' or {name}",
                    start,
                ))
            }
        };
        self.cur.take();
        let name = self.read_reference_name(start, close, label)?;
        Ok(Node::Backref(Backref { reference: name }))
    }

    /// `\g` references: `\g1`, `\g{n}`, `\g{-n}`, `\g{name}` are
    /// backreferences; `\g<name>` / `\g'name'` with a non-numeric name are
    /// subroutine calls.
    fn parse_g_reference(&mut self, start: usize) -> Result<Node, ParseError> {
        match self.cur.peek_char(0) {
            Some('{') => {
                self.cur.take();
                let name = self.read_reference_name(start, '}', "\\g{...}")?;
                Ok(Node::Backref(Backref { reference: name }))
            }
            Some(open @ ('<' | '\'')) => {
                let close = if open == '<' { '>' } else { '\'' };
                self.cur.take();
                let name = self.read_reference_name(start, close, "\\g<...>")?;
                if is_numeric_reference(&name) {
                    Ok(Node::Backref(Backref { reference: name }))
                } else {
                    Ok(Node::Subroutine(Subroutine {
                        reference: name,
                        syntax: "g".to_string(),
                    }))
                }
            }
            Some(ch) if ch.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(ch) = self.cur.peek_char(0) {
                    if ch.is_ascii_digit() {
                        digits.push(ch);
                        self.cur.take();
                    } else {
                        break;
                    }
                }
                Ok(Node::Backref(Backref { reference: digits }))
            }
            _ => Err(self.error(
                ParseErrorKind::InvalidEscape,
                "\\g must be followed by digits, {...}, <...> or '...'",
                start,
            )),
        }
    }

    /// Read a reference name up to `close`. Accepts an optional sign
    /// followed by word characters.
    fn read_reference_name(
        &mut self,
        start: usize,
        close: char,
        label: &str,
    ) -> Result<String, ParseError> {
        let mut name = String::new();
        loop {
            match self.cur.take() {
                Some(ch) if ch == close => break,
                Some(ch) if ch.is_alphanumeric() || ch == '_' => name.push(ch),
                Some(ch) if (ch == '-' || ch == '+') && name.is_empty() => name.push(ch),
                Some(ch) => {
                    return Err(self.error(
                        ParseErrorKind::InvalidEscape,
                        format!("invalid character '{}' in {}", ch, label),
                        start,
                    ))
                }
                None => {
                    return Err(self.error(
                        ParseErrorKind::UnexpectedEnd,
                        format!("unterminated {}", label),
                        start,
                    ))
                }
            }
        }
        if name.is_empty() || name == "-" || name == "+" {
            return Err(self.error(
                ParseErrorKind::InvalidEscape,
                format!("empty reference in {}", label),
                start,
            ));
        }
        Ok(name)
    }

    /// Read digits of the given radix inside braces, starting at `{`.
    fn read_braced_digits(
        &mut self,
        start: usize,
        radix: u32,
        label: &str,
    ) -> Result<String, ParseError> {
        let kind = if radix == 8 {
            ParseErrorKind::InvalidOctalEscape
        } else {
            ParseErrorKind::InvalidUnicodeEscape
        };
        self.cur.take(); // '{'
        let mut digits = String::new();
        loop {
            match self.cur.take() {
                Some('}') => break,
                Some(ch) if ch.is_digit(radix) => digits.push(ch),
                Some(ch) => {
                    return Err(self.error(
                        kind,
                        format!("invalid digit '{}' in {}", ch, label),
                        start,
                    ))
                }
                None => {
                    return Err(self.error(kind, format!("unterminated {}", label), start))
                }
            }
        }
        if digits.is_empty() {
            return Err(self.error(kind, format!("empty {}", label), start));
        }
        Ok(digits)
    }

    /// Verify the digits form a valid Unicode scalar value.
    fn check_codepoint(&self, start: usize, digits: &str, radix: u32) -> Result<(), ParseError> {
        let kind = if radix == 8 {
            ParseErrorKind::InvalidOctalEscape
        } else {
            ParseErrorKind::InvalidUnicodeEscape
        };
        u32::from_str_radix(digits, radix)
            .ok()
            .and_then(char::from_u32)
            .map(|_| ())
            .ok_or_else(|| self.error(kind, format!("'{}' is not a valid code point", digits), start))
    }
}

fn literal_char(ch: char) -> Node {
    Node::Literal(Literal {
        value: ch.to_string(),
    })
}

fn is_numeric_reference(name: &str) -> bool {
    let digits = name.strip_prefix(['-', '+']).unwrap_or(name);
    !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use crate::core::errors::ParseErrorKind;
    use crate::core::nodes::*;
    use crate::core::parser::parse;

    fn root(source: &str) -> Node {
        *parse(source).unwrap().pattern
    }

    #[test]
    fn char_types() {
        for src in ["/\\d/", "/\\W/", "/\\h/", "/\\V/", "/\\R/"] {
            assert!(matches!(root(src), Node::CharType(_)), "{}", src);
        }
    }

    #[test]
    fn assertions_and_keep() {
        assert_eq!(root("/\\A/"), Node::Assertion(Assertion { value: 'A' }));
        assert_eq!(root("/\\B/"), Node::Assertion(Assertion { value: 'B' }));
        assert_eq!(root("/\\K/"), Node::Keep(Keep));
        assert_eq!(
            root("/\\X/"),
            Node::Unicode(Unicode {
                code: "X".to_string()
            })
        );
    }

    #[test]
    fn control_char() {
        assert_eq!(root("/\\cA/"), Node::ControlChar(ControlChar { ch: 'A' }));
    }

    #[test]
    fn unicode_properties() {
        assert_eq!(
            root("/\\p{L}/"),
            Node::UnicodeProp(UnicodeProp {
                prop: "L".to_string(),
                has_braces: true
            })
        );
        assert_eq!(
            root("/\\P{L}/"),
            Node::UnicodeProp(UnicodeProp {
                prop: "^L".to_string(),
                has_braces: true
            })
        );
        // Double negation cancels.
        assert_eq!(
            root("/\\P{^L}/"),
            Node::UnicodeProp(UnicodeProp {
                prop: "L".to_string(),
                has_braces: true
            })
        );
        assert_eq!(
            root("/\\pN/"),
            Node::UnicodeProp(UnicodeProp {
                prop: "N".to_string(),
                has_braces: false
            })
        );
    }

    #[test]
    fn hex_and_unicode_literals() {
        assert_eq!(
            root("/\\x41/"),
            Node::CharLiteral(CharLiteral {
                kind: CharLiteralKind::Unicode,
                original: "\\x41".to_string()
            })
        );
        assert_eq!(
            root("/\\x{1F600}/"),
            Node::CharLiteral(CharLiteral {
                kind: CharLiteralKind::Unicode,
                original: "\\x{1F600}".to_string()
            })
        );
        assert_eq!(
            root("/\\u0041/"),
            Node::CharLiteral(CharLiteral {
                kind: CharLiteralKind::Unicode,
                original: "\\u0041".to_string()
            })
        );
        assert_eq!(
            root("/\\N{U+0041}/"),
            Node::CharLiteral(CharLiteral {
                kind: CharLiteralKind::UnicodeNamed,
                original: "\\N{U+0041}".to_string()
            })
        );
    }

    #[test]
    fn octal_forms() {
        assert_eq!(
            root("/\\o{17}/"),
            Node::CharLiteral(CharLiteral {
                kind: CharLiteralKind::Octal,
                original: "\\o{17}".to_string()
            })
        );
        assert_eq!(
            root("/\\012/"),
            Node::CharLiteral(CharLiteral {
                kind: CharLiteralKind::OctalLegacy,
                original: "\\012".to_string()
            })
        );
    }

    #[test]
    fn digit_escape_policy() {
        // One or two digits: always a backreference.
        assert_eq!(
            root("/\\1/"),
            Node::Backref(Backref {
                reference: "1".to_string()
            })
        );
        assert_eq!(
            root("/\\12/"),
            Node::Backref(Backref {
                reference: "12".to_string()
            })
        );
        // Three all-octal digits: legacy octal.
        assert_eq!(
            root("/\\123/"),
            Node::CharLiteral(CharLiteral {
                kind: CharLiteralKind::OctalLegacy,
                original: "\\123".to_string()
            })
        );
        // Three digits with a non-octal digit: two-digit backref, rest literal.
        match root("/\\189/") {
            Node::Sequence(seq) => {
                assert_eq!(
                    seq.children[0],
                    Node::Backref(Backref {
                        reference: "18".to_string()
                    })
                );
                assert_eq!(
                    seq.children[1],
                    Node::Literal(Literal {
                        value: "9".to_string()
                    })
                );
            }
            other => panic!("expected Sequence, got {:?}", other),
        }
    }

    #[test]
    fn named_backrefs() {
        for src in ["/\\k<year>/", "/\\k'year'/", "/\\k{year}/", "/\\g{year}/"] {
            assert_eq!(
                root(src),
                Node::Backref(Backref {
                    reference: "year".to_string()
                }),
                "{}",
                src
            );
        }
        assert_eq!(
            root("/\\g{-2}/"),
            Node::Backref(Backref {
                reference: "-2".to_string()
            })
        );
        assert_eq!(
            root("/\\g<3>/"),
            Node::Backref(Backref {
                reference: "3".to_string()
            })
        );
    }

    #[test]
    fn g_subroutine_call() {
        assert_eq!(
            root("/\\g<word>/"),
            Node::Subroutine(Subroutine {
                reference: "word".to_string(),
                syntax: "g".to_string()
            })
        );
    }

    #[test]
    fn identity_escape_is_literal() {
        assert_eq!(
            root("/\\./"),
            Node::Literal(Literal {
                value: ".".to_string()
            })
        );
    }

    #[test]
    fn trailing_backslash_is_rejected() {
        let err = parse("/a\\/").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEnd);
    }

    #[test]
    fn invalid_unicode_brace_is_rejected() {
        let err = parse("/\\x{GG}/").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidUnicodeEscape);
    }
}
