//! Quantifier recognition: `*`, `+`, `?`, `{n}`, `{n,}`, `{n,m}` with the
//! optional lazy (`?`) and possessive (`+`) mode suffixes.

use crate::core::errors::ParseErrorKind;
use crate::core::nodes::QuantifierKind;
use crate::core::parser::Parser;
use crate::core::errors::ParseError;

/// Repetition counts above this many digits are rejected outright.
const MAX_COUNT_DIGITS: usize = 9;

impl Parser {
    /// Try to parse a quantifier at the cursor. Returns the raw token and
    /// the greediness mode, or `None` when the next input is not a
    /// quantifier (a stray `{` stays a literal).
    pub(crate) fn try_parse_quantifier(
        &mut self,
    ) -> Result<Option<(String, QuantifierKind)>, ParseError> {
        let token = match self.cur.peek_char(0) {
            Some('*') => {
                self.cur.take();
                "*".to_string()
            }
            Some('+') => {
                self.cur.take();
                "+".to_string()
            }
            Some('?') => {
                self.cur.take();
                "?".to_string()
            }
            Some('{') => match self.parse_brace_quantifier()? {
                Some(token) => token,
                None => return Ok(None),
            },
            _ => return Ok(None),
        };

        let kind = match self.cur.peek_char(0) {
            Some('?') => {
                self.cur.take();
                QuantifierKind::Lazy
            }
            Some('+') => {
                self.cur.take();
                QuantifierKind::Possessive
            }
            _ => QuantifierKind::Greedy,
        };

        Ok(Some((token, kind)))
    }

    /// True when the input at the cursor spells a `{n}`-style quantifier,
    /// without consuming anything.
    pub(crate) fn quantifier_token_ahead(&self) -> bool {
        if self.cur.peek_char(0) != Some('{') {
            return false;
        }
        let mut n = 1;
        let mut digits = 0;
        while let Some(ch) = self.cur.peek_char(n) {
            if ch.is_ascii_digit() {
                digits += 1;
                n += 1;
                continue;
            }
            break;
        }
        if digits == 0 {
            return false;
        }
        if self.cur.peek_char(n) == Some(',') {
            n += 1;
            while let Some(ch) = self.cur.peek_char(n) {
                if ch.is_ascii_digit() {
                    n += 1;
                    continue;
                }
                break;
            }
        }
        self.cur.peek_char(n) == Some('}')
    }

    /// Parse `{n}`, `{n,}` or `{n,m}`. Returns `None` (cursor untouched)
    /// when the braces do not form a quantifier.
    fn parse_brace_quantifier(&mut self) -> Result<Option<String>, ParseError> {
        if !self.quantifier_token_ahead() {
            return Ok(None);
        }

        let start = self.cur.pos();
        self.cur.take(); // '{'

        let min = self.read_count(start)?;
        let max = if self.cur.peek_char(0) == Some(',') {
            self.cur.take();
            if self.cur.peek_char(0) == Some('}') {
                None
            } else {
                Some(self.read_count(start)?)
            }
        } else {
            Some(min)
        };

        self.cur.take(); // '}'

        if let Some(max) = max {
            if min > max {
                return Err(self.error(
                    ParseErrorKind::InvalidQuantifier,
                    format!("quantifier range {{{},{}}} is reversed", min, max),
                    start,
                ));
            }
        }

        let token = match max {
            Some(max) if max == min => format!("{{{}}}", min),
            Some(max) => format!("{{{},{}}}", min, max),
            None => format!("{{{},}}", min),
        };
        Ok(Some(token))
    }

    fn read_count(&mut self, token_start: usize) -> Result<u64, ParseError> {
        let mut digits = String::new();
        while let Some(ch) = self.cur.peek_char(0) {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.cur.take();
            } else {
                break;
            }
        }
        if digits.len() > MAX_COUNT_DIGITS {
            return Err(self.error(
                ParseErrorKind::InvalidQuantifier,
                "repetition count too large",
                token_start,
            ));
        }
        digits.parse().map_err(|_| {
            self.error(
                ParseErrorKind::InvalidQuantifier,
                "malformed repetition count",
                token_start,
            )
        })
    }
}
