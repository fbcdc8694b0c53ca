//! Group parsing: every `(...)` construct. The first characters after the
//! parenthesis select between capturing and non-capturing groups, named
//! groups, lookarounds, atomic and branch-reset groups, inline flags,
//! comments, conditionals, DEFINE blocks, subroutine calls, callouts and
//! `(*...)` control verbs.

use crate::core::errors::{ParseError, ParseErrorKind};
use crate::core::nodes::*;
use crate::core::parser::{Parser, VALID_FLAGS};

impl Parser {
    /// Parse a group. The cursor sits on the opening `(`.
    pub(crate) fn parse_group(&mut self) -> Result<Node, ParseError> {
        let start = self.cur.pos();
        self.cur.take(); // '('

        match self.cur.peek_char(0) {
            Some('?') => {
                self.cur.take();
                self.parse_group_prefix(start)
            }
            Some('*') => {
                self.cur.take();
                self.parse_verb(start)
            }
            _ => {
                let child = self.parse_alternation()?;
                self.expect_group_close(start)?;
                Ok(plain_group(GroupType::Capturing, child))
            }
        }
    }

    /// Disambiguate everything that can follow `(?`.
    fn parse_group_prefix(&mut self, start: usize) -> Result<Node, ParseError> {
        let ch = match self.cur.peek_char(0) {
            Some(ch) => ch,
            None => {
                return Err(self.error(
                    ParseErrorKind::UnexpectedEnd,
                    "pattern ends inside '(?'",
                    start,
                ))
            }
        };

        match ch {
            ':' => {
                self.cur.take();
                self.parse_group_body(start, GroupType::NonCapturing)
            }
            '=' => {
                self.cur.take();
                self.parse_group_body(start, GroupType::LookaheadPositive)
            }
            '!' => {
                self.cur.take();
                self.parse_group_body(start, GroupType::LookaheadNegative)
            }
            '>' => {
                self.cur.take();
                self.parse_group_body(start, GroupType::Atomic)
            }
            '|' => {
                self.cur.take();
                self.parse_group_body(start, GroupType::BranchReset)
            }
            '<' => match self.cur.peek_char(1) {
                Some('=') => {
                    self.cur.take();
                    self.cur.take();
                    self.parse_group_body(start, GroupType::LookbehindPositive)
                }
                Some('!') => {
                    self.cur.take();
                    self.cur.take();
                    self.parse_group_body(start, GroupType::LookbehindNegative)
                }
                _ => {
                    self.cur.take();
                    self.parse_named_group(start, '>')
                }
            },
            '\'' => {
                self.cur.take();
                self.parse_named_group(start, '\'')
            }
            '#' => {
                self.cur.take();
                self.parse_comment(start)
            }
            '(' => {
                self.cur.take();
                self.parse_conditional(start)
            }
            'P' => match self.cur.peek_char(1) {
                Some('<') => {
                    self.cur.take();
                    self.cur.take();
                    self.parse_named_group(start, '>')
                }
                Some('>') => {
                    self.cur.take();
                    self.cur.take();
                    let name = self.read_group_name(start, ')', false)?;
                    Ok(Node::Subroutine(Subroutine {
                        reference: name,
                        syntax: "P>".to_string(),
                    }))
                }
                Some('=') => {
                    self.cur.take();
                    self.cur.take();
                    let name = self.read_group_name(start, ')', false)?;
                    Ok(Node::Backref(Backref { reference: name }))
                }
                _ => Err(self.error(
                    ParseErrorKind::InvalidGroupPrefix,
                    "'(?P' must be followed by '<', '>' or '='",
                    start,
                )),
            },
            'R' => {
                self.cur.take();
                match self.cur.take() {
                    Some(')') => Ok(Node::Subroutine(Subroutine {
                        reference: "R".to_string(),
                        syntax: "?".to_string(),
                    })),
                    _ => Err(self.error(
                        ParseErrorKind::InvalidGroupPrefix,
                        "'(?R' must be closed immediately",
                        start,
                    )),
                }
            }
            '&' => {
                self.cur.take();
                let name = self.read_group_name(start, ')', false)?;
                Ok(Node::Subroutine(Subroutine {
                    reference: name,
                    syntax: "&".to_string(),
                }))
            }
            'C' => {
                self.cur.take();
                self.parse_callout(start)
            }
            '0'..='9' | '-' | '+' => self.parse_numeric_subroutine_or_flags(start),
            _ => self.parse_inline_flags(start),
        }
    }

    /// Shared tail for group kinds without a name or flags.
    fn parse_group_body(&mut self, start: usize, kind: GroupType) -> Result<Node, ParseError> {
        let child = self.parse_alternation()?;
        self.expect_group_close(start)?;
        Ok(plain_group(kind, child))
    }

    /// `(?<name>...)`, `(?'name'...)`, `(?P<name>...)`.
    fn parse_named_group(&mut self, start: usize, close: char) -> Result<Node, ParseError> {
        let name = self.read_group_name(start, close, true)?;
        let child = self.parse_alternation()?;
        self.expect_group_close(start)?;
        Ok(Node::Group(Group {
            kind: GroupType::Named,
            name: Some(name),
            flags: None,
            child: Box::new(child),
        }))
    }

    /// Read a group or subroutine name up to `close`. With `strict` the
    /// name must be an identifier (no leading digit); otherwise digits and
    /// a leading sign are also accepted (subroutine references).
    fn read_group_name(
        &mut self,
        start: usize,
        close: char,
        strict: bool,
    ) -> Result<String, ParseError> {
        let mut name = String::new();
        loop {
            match self.cur.take() {
                Some(ch) if ch == close => break,
                Some(ch) if ch.is_alphanumeric() || ch == '_' => name.push(ch),
                Some(ch) if !strict && (ch == '-' || ch == '+') && name.is_empty() => {
                    name.push(ch)
                }
                Some(ch) => {
                    return Err(self.error(
                        ParseErrorKind::InvalidGroupPrefix,
                        format!("invalid character '{}' in group name", ch),
                        start,
                    ))
                }
                None => {
                    return Err(self.error(
                        ParseErrorKind::UnexpectedEnd,
                        "unterminated group name",
                        start,
                    ))
                }
            }
        }
        if name.is_empty() {
            return Err(self.error(
                ParseErrorKind::InvalidGroupPrefix,
                "empty group name",
                start,
            ));
        }
        if strict && name.chars().next().is_some_and(|ch| ch.is_ascii_digit()) {
            return Err(self.error(
                ParseErrorKind::InvalidGroupPrefix,
                "group name must not start with a digit",
                start,
            ));
        }
        Ok(name)
    }

    /// `(?#...)` - inline comment.
    fn parse_comment(&mut self, start: usize) -> Result<Node, ParseError> {
        let mut comment = String::new();
        loop {
            match self.cur.take() {
                Some(')') => break,
                Some(ch) => comment.push(ch),
                None => {
                    return Err(self.error(
                        ParseErrorKind::UnexpectedEnd,
                        "unterminated comment group",
                        start,
                    ))
                }
            }
        }
        Ok(Node::Comment(Comment { comment }))
    }

    /// `(?n)`, `(?-n)`, `(?+n)` subroutine calls, or inline flags when the
    /// `-` introduces flag removal.
    fn parse_numeric_subroutine_or_flags(&mut self, start: usize) -> Result<Node, ParseError> {
        let first = self.cur.peek_char(0).unwrap();
        if first == '-' || first == '+' {
            // `(?-i)` is flag removal, `(?-1)` is a relative call.
            match self.cur.peek_char(1) {
                Some(ch) if ch.is_ascii_digit() => {}
                _ => return self.parse_inline_flags(start),
            }
        }

        let mut reference = String::new();
        if first == '-' || first == '+' {
            reference.push(first);
            self.cur.take();
        }
        while let Some(ch) = self.cur.peek_char(0) {
            if ch.is_ascii_digit() {
                reference.push(ch);
                self.cur.take();
            } else {
                break;
            }
        }
        match self.cur.take() {
            Some(')') => Ok(Node::Subroutine(Subroutine {
                reference,
                syntax: "?".to_string(),
            })),
            _ => Err(self.error(
                ParseErrorKind::InvalidGroupPrefix,
                "subroutine call must be closed immediately",
                start,
            )),
        }
    }

    /// `(?flags)` and `(?flags:...)` - inline option setting.
    fn parse_inline_flags(&mut self, start: usize) -> Result<Node, ParseError> {
        let mut flags = String::new();
        loop {
            match self.cur.peek_char(0) {
                Some(')') => {
                    self.cur.take();
                    return Ok(Node::Group(Group {
                        kind: GroupType::InlineFlags,
                        name: None,
                        flags: Some(flags),
                        child: Box::new(Node::empty()),
                    }));
                }
                Some(':') => {
                    self.cur.take();
                    let child = self.parse_alternation()?;
                    self.expect_group_close(start)?;
                    return Ok(Node::Group(Group {
                        kind: GroupType::InlineFlags,
                        name: None,
                        flags: Some(flags),
                        child: Box::new(child),
                    }));
                }
                Some(ch) if VALID_FLAGS.contains(ch) || ch == '-' => {
                    flags.push(ch);
                    self.cur.take();
                }
                Some(ch) => {
                    return Err(self.error(
                        ParseErrorKind::InvalidGroupPrefix,
                        format!("unrecognized character '{}' after '(?'", ch),
                        start,
                    ))
                }
                None => {
                    return Err(self.error(
                        ParseErrorKind::UnexpectedEnd,
                        "pattern ends inside an inline-flags group",
                        start,
                    ))
                }
            }
        }
    }

    /// Conditional groups, `(?(cond)yes|no)`. The cursor has consumed
    /// `(?(`.
    fn parse_conditional(&mut self, start: usize) -> Result<Node, ParseError> {
        if self.cur.match_str("DEFINE)") {
            let content = self.parse_alternation()?;
            self.expect_group_close(start)?;
            return Ok(Node::Define(Define {
                content: Box::new(content),
            }));
        }

        if self.cur.starts_with("VERSION") {
            return self.parse_version_conditional(start);
        }

        let condition = self.parse_condition_head(start)?;
        let (yes, no) = self.parse_conditional_arms(start)?;
        Ok(Node::Conditional(Conditional {
            condition: Box::new(condition),
            yes: Box::new(yes),
            no: Box::new(no),
        }))
    }

    /// The condition between the inner parentheses.
    fn parse_condition_head(&mut self, start: usize) -> Result<Node, ParseError> {
        let ch = match self.cur.peek_char(0) {
            Some(ch) => ch,
            None => {
                return Err(self.error(
                    ParseErrorKind::UnexpectedEnd,
                    "pattern ends inside a conditional",
                    start,
                ))
            }
        };

        match ch {
            // Recursion checks: (?(R)...), (?(R2)...), (?(R&name)...).
            'R' => {
                let mut reference = String::from('R');
                self.cur.take();
                if self.cur.peek_char(0) == Some('&') {
                    reference.push('&');
                    self.cur.take();
                    while let Some(c) = self.cur.peek_char(0) {
                        if c.is_alphanumeric() || c == '_' {
                            reference.push(c);
                            self.cur.take();
                        } else {
                            break;
                        }
                    }
                } else {
                    while let Some(c) = self.cur.peek_char(0) {
                        if c.is_ascii_digit() {
                            reference.push(c);
                            self.cur.take();
                        } else {
                            break;
                        }
                    }
                }
                self.expect_condition_close(start)?;
                Ok(Node::Subroutine(Subroutine {
                    reference,
                    syntax: "?".to_string(),
                }))
            }
            // Assertion conditions: (?(?=...)...), (?(?<!...)...).
            '?' => {
                self.cur.take();
                let kind = if self.cur.match_str("=") {
                    GroupType::LookaheadPositive
                } else if self.cur.match_str("!") {
                    GroupType::LookaheadNegative
                } else if self.cur.match_str("<=") {
                    GroupType::LookbehindPositive
                } else if self.cur.match_str("<!") {
                    GroupType::LookbehindNegative
                } else {
                    return Err(self.error(
                        ParseErrorKind::InvalidConditional,
                        "conditional assertion must be a lookaround",
                        start,
                    ));
                };
                let child = self.parse_alternation()?;
                self.expect_condition_close(start)?;
                Ok(plain_group(kind, child))
            }
            // Group references: numeric, relative, <name>, 'name' or bare.
            '<' => {
                self.cur.take();
                let name = self.read_group_name(start, '>', true)?;
                self.expect_condition_close(start)?;
                Ok(Node::Backref(Backref { reference: name }))
            }
            '\'' => {
                self.cur.take();
                let name = self.read_group_name(start, '\'', true)?;
                self.expect_condition_close(start)?;
                Ok(Node::Backref(Backref { reference: name }))
            }
            '0'..='9' | '-' | '+' => {
                let mut reference = String::new();
                if ch == '-' || ch == '+' {
                    reference.push(ch);
                    self.cur.take();
                }
                while let Some(c) = self.cur.peek_char(0) {
                    if c.is_ascii_digit() {
                        reference.push(c);
                        self.cur.take();
                    } else {
                        break;
                    }
                }
                if reference.is_empty() || reference.ends_with(['-', '+']) {
                    return Err(self.error(
                        ParseErrorKind::InvalidConditional,
                        "malformed group number in conditional",
                        start,
                    ));
                }
                self.expect_condition_close(start)?;
                Ok(Node::Backref(Backref { reference }))
            }
            _ if ch.is_alphanumeric() || ch == '_' => {
                let mut name = String::new();
                while let Some(c) = self.cur.peek_char(0) {
                    if c.is_alphanumeric() || c == '_' {
                        name.push(c);
                        self.cur.take();
                    } else {
                        break;
                    }
                }
                self.expect_condition_close(start)?;
                Ok(Node::Backref(Backref { reference: name }))
            }
            _ => Err(self.error(
                ParseErrorKind::InvalidConditional,
                format!("unrecognized condition starting at '{}'", ch),
                start,
            )),
        }
    }

    /// `(?(VERSION>=n)yes|no)`.
    fn parse_version_conditional(&mut self, start: usize) -> Result<Node, ParseError> {
        self.cur.match_str("VERSION");
        let operator = if self.cur.match_str(">=") {
            ">=".to_string()
        } else if self.cur.match_str("=") {
            "=".to_string()
        } else {
            return Err(self.error(
                ParseErrorKind::InvalidConditional,
                "VERSION condition requires '=' or '>='",
                start,
            ));
        };
        let mut version = String::new();
        while let Some(ch) = self.cur.peek_char(0) {
            if ch.is_ascii_digit() || ch == '.' {
                version.push(ch);
                self.cur.take();
            } else {
                break;
            }
        }
        if version.is_empty() {
            return Err(self.error(
                ParseErrorKind::InvalidConditional,
                "VERSION condition requires a version number",
                start,
            ));
        }
        self.expect_condition_close(start)?;

        let condition = Node::VersionCondition(VersionCondition { operator, version });
        let (yes, no) = self.parse_conditional_arms(start)?;
        Ok(Node::Conditional(Conditional {
            condition: Box::new(condition),
            yes: Box::new(yes),
            no: Box::new(no),
        }))
    }

    /// The yes/no arms after a condition: at most two alternatives.
    fn parse_conditional_arms(&mut self, start: usize) -> Result<(Node, Node), ParseError> {
        let body = self.parse_alternation()?;
        self.expect_group_close(start)?;
        match body {
            Node::Alternation(mut alt) => {
                if alt.alternatives.len() > 2 {
                    return Err(self.error(
                        ParseErrorKind::InvalidConditional,
                        "conditional group has more than two branches",
                        start,
                    ));
                }
                let no = alt.alternatives.pop().unwrap();
                let yes = alt.alternatives.pop().unwrap();
                Ok((yes, no))
            }
            single => Ok((single, Node::empty())),
        }
    }

    /// `(?C)`, `(?C5)`, `(?C"tag")` - callouts.
    fn parse_callout(&mut self, start: usize) -> Result<Node, ParseError> {
        match self.cur.peek_char(0) {
            Some(')') => {
                self.cur.take();
                Ok(Node::Callout(Callout {
                    number: None,
                    name: None,
                }))
            }
            Some(ch) if ch.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(c) = self.cur.peek_char(0) {
                    if c.is_ascii_digit() {
                        digits.push(c);
                        self.cur.take();
                    } else {
                        break;
                    }
                }
                let number: u32 = digits.parse().map_err(|_| {
                    self.error(ParseErrorKind::InvalidCallout, "callout number too large", start)
                })?;
                match self.cur.take() {
                    Some(')') => Ok(Node::Callout(Callout {
                        number: Some(number),
                        name: None,
                    })),
                    _ => Err(self.error(
                        ParseErrorKind::InvalidCallout,
                        "callout must be closed after its number",
                        start,
                    )),
                }
            }
            Some(quote @ ('"' | '\'')) => {
                self.cur.take();
                let mut name = String::new();
                loop {
                    match self.cur.take() {
                        Some(ch) if ch == quote => break,
                        Some(ch) => name.push(ch),
                        None => {
                            return Err(self.error(
                                ParseErrorKind::InvalidCallout,
                                "unterminated callout string",
                                start,
                            ))
                        }
                    }
                }
                match self.cur.take() {
                    Some(')') => Ok(Node::Callout(Callout {
                        number: None,
                        name: Some(name),
                    })),
                    _ => Err(self.error(
                        ParseErrorKind::InvalidCallout,
                        "callout must be closed after its string",
                        start,
                    )),
                }
            }
            _ => Err(self.error(
                ParseErrorKind::InvalidCallout,
                "callout must be (?C), (?Cn) or (?C\"name\")",
                start,
            )),
        }
    }

    /// `(*...)` verbs, including the `SCRIPT_RUN` and `LIMIT_MATCH`
    /// specializations.
    fn parse_verb(&mut self, start: usize) -> Result<Node, ParseError> {
        let mut text = String::new();
        loop {
            match self.cur.take() {
                Some(')') => break,
                Some(ch) => text.push(ch),
                None => {
                    return Err(self.error(
                        ParseErrorKind::UnexpectedEnd,
                        "unterminated (*...) verb",
                        start,
                    ))
                }
            }
        }
        if text.is_empty() {
            return Err(self.error(
                ParseErrorKind::InvalidGroupPrefix,
                "empty (*) verb",
                start,
            ));
        }

        let upper = text.to_ascii_uppercase();
        if let Some(script) = upper
            .starts_with("SCRIPT_RUN:")
            .then(|| text.split_once(':').map(|(_, s)| s.to_string()))
            .flatten()
        {
            return Ok(Node::ScriptRun(ScriptRun { script }));
        }
        if upper.starts_with("LIMIT_MATCH=") {
            let value = &text[text.find('=').unwrap() + 1..];
            let limit: u64 = value.parse().map_err(|_| {
                self.error(
                    ParseErrorKind::InvalidGroupPrefix,
                    "LIMIT_MATCH requires a non-negative integer",
                    start,
                )
            })?;
            return Ok(Node::LimitMatch(LimitMatch { limit }));
        }
        Ok(Node::PcreVerb(PcreVerb { verb: text }))
    }

    /// Consume the `)` closing a group.
    pub(crate) fn expect_group_close(&mut self, start: usize) -> Result<(), ParseError> {
        match self.cur.take() {
            Some(')') => Ok(()),
            _ => Err(self.error(
                ParseErrorKind::UnbalancedGroup,
                "group is never closed",
                start,
            )),
        }
    }

    /// Consume the `)` closing a conditional's condition.
    fn expect_condition_close(&mut self, start: usize) -> Result<(), ParseError> {
        match self.cur.take() {
            Some(')') => Ok(()),
            _ => Err(self.error(
                ParseErrorKind::InvalidConditional,
                "condition is never closed",
                start,
            )),
        }
    }
}

fn plain_group(kind: GroupType, child: Node) -> Node {
    Node::Group(Group {
        kind,
        name: None,
        flags: None,
        child: Box::new(child),
    })
}
