//! RegexLint AST Node Definitions
//!
//! This module defines the complete set of Abstract Syntax Tree (AST) node
//! types that represent a parsed PCRE pattern. The AST is the direct output
//! of the parser and the sole input of every analysis and emitter.
//!
//! AST nodes are designed to:
//!   - Closely mirror the source pattern syntax
//!   - Be serializable to a tagged JSON representation
//!   - Stay immutable after construction (analyses never mutate, they
//!     produce new values)
//!
//! Ownership is strictly tree-shaped: each parent exclusively owns its
//! children. Backreferences and subroutine calls carry a name or index only,
//! never a link to the node they refer to.

use serde::{Deserialize, Serialize};

/// Enum representing all possible AST node types.
///
/// This enum encompasses every node variant, allowing for type-safe pattern
/// matching and easy traversal of the AST.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Regex(Regex),
    Alternation(Alternation),
    Sequence(Sequence),
    Group(Group),
    Quantifier(Quantifier),
    Literal(Literal),
    CharLiteral(CharLiteral),
    CharType(CharType),
    Unicode(Unicode),
    UnicodeProp(UnicodeProp),
    PosixClass(PosixClass),
    Dot(Dot),
    Anchor(Anchor),
    Assertion(Assertion),
    Keep(Keep),
    CharClass(CharClass),
    Range(Range),
    ClassOperation(ClassOperation),
    ControlChar(ControlChar),
    Backref(Backref),
    Subroutine(Subroutine),
    Conditional(Conditional),
    Define(Define),
    Comment(Comment),
    PcreVerb(PcreVerb),
    LimitMatch(LimitMatch),
    Callout(Callout),
    ScriptRun(ScriptRun),
    VersionCondition(VersionCondition),
}

impl Node {
    /// An empty literal, used for empty alternation branches and for the
    /// missing `no` arm of a conditional.
    pub fn empty() -> Node {
        Node::Literal(Literal {
            value: String::new(),
        })
    }

    /// True for nodes that consume no characters of the subject string.
    /// The character-set analyzer skips these when scanning a sequence.
    pub fn is_zero_width(&self) -> bool {
        matches!(
            self,
            Node::Anchor(_)
                | Node::Assertion(_)
                | Node::Keep(_)
                | Node::Comment(_)
                | Node::Callout(_)
                | Node::PcreVerb(_)
                | Node::LimitMatch(_)
                | Node::VersionCondition(_)
        )
    }
}

// ---- Root ----

/// Root node of a parsed pattern.
///
/// Holds the delimiter the source used, the flag characters, and the
/// top-level pattern node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regex {
    pub delimiter: char,
    pub flags: String,
    pub pattern: Box<Node>,
}

impl Regex {
    pub fn has_flag(&self, flag: char) -> bool {
        self.flags.contains(flag)
    }
}

// ---- Composition ----

/// Alternation node (`a|b|c`). Always holds two or more alternatives, in
/// source order. An empty alternative is an empty `Literal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternation {
    pub alternatives: Vec<Node>,
}

/// Sequence node: children matched one after another, in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub children: Vec<Node>,
}

/// The kind of a parenthesized group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupType {
    Capturing,
    NonCapturing,
    Named,
    LookaheadPositive,
    LookaheadNegative,
    LookbehindPositive,
    LookbehindNegative,
    Atomic,
    BranchReset,
    InlineFlags,
}

impl GroupType {
    /// Capturing groups participate in backreference numbering.
    pub fn is_capturing(&self) -> bool {
        matches!(
            self,
            GroupType::Capturing | GroupType::Named | GroupType::BranchReset
        )
    }

    pub fn is_lookaround(&self) -> bool {
        matches!(
            self,
            GroupType::LookaheadPositive
                | GroupType::LookaheadNegative
                | GroupType::LookbehindPositive
                | GroupType::LookbehindNegative
        )
    }
}

/// Group node. `name` is set iff `kind` is `Named`; `flags` is set iff
/// `kind` is `InlineFlags`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub kind: GroupType,
    pub name: Option<String>,
    pub flags: Option<String>,
    pub child: Box<Node>,
}

/// Greediness mode of a quantifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantifierKind {
    Greedy,
    Lazy,
    Possessive,
}

/// Quantifier node. `quantifier` is the raw token as written in the source:
/// `*`, `+`, `?`, `{n}`, `{n,}` or `{n,m}`. The numeric bounds are derived
/// on demand from the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantifier {
    pub kind: QuantifierKind,
    pub quantifier: String,
    pub child: Box<Node>,
}

impl Quantifier {
    /// Minimum and maximum repetition counts; `None` max means unbounded.
    pub fn bounds(&self) -> (u64, Option<u64>) {
        parse_quantifier_token(&self.quantifier)
    }

    /// `*`, `+` and `{n,}` have no finite upper bound. `{n,n}` is bounded.
    pub fn is_unbounded(&self) -> bool {
        self.bounds().1.is_none()
    }
}

/// Parse a raw quantifier token into `(min, max)` bounds.
///
/// The token has already been validated by the parser, so malformed input
/// degrades to the most conservative reading rather than failing.
pub fn parse_quantifier_token(token: &str) -> (u64, Option<u64>) {
    match token {
        "*" => (0, None),
        "+" => (1, None),
        "?" => (0, Some(1)),
        _ => {
            let inner = token.trim_start_matches('{').trim_end_matches('}');
            match inner.split_once(',') {
                Some((min, "")) => (min.parse().unwrap_or(0), None),
                Some((min, max)) => (
                    min.parse().unwrap_or(0),
                    Some(max.parse().unwrap_or(u64::MAX)),
                ),
                None => {
                    let n = inner.parse().unwrap_or(0);
                    (n, Some(n))
                }
            }
        }
    }
}

// ---- Leaves ----

/// Literal text node. May span several source characters (the parser
/// coalesces adjacent literals) and may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Literal {
    pub value: String,
}

/// The notation a [`CharLiteral`] was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharLiteralKind {
    /// `\xHH`, `\x{...}`, `\uHHHH`, `\u{...}`
    Unicode,
    /// `\N{NAME}` or `\N{U+HHHH}`
    UnicodeNamed,
    /// `\o{...}`
    Octal,
    /// `\0nn` / `\nnn`
    OctalLegacy,
}

/// A single character written as an escape. The original spelling is kept so
/// the stringifier can re-emit the pattern exactly as the author wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharLiteral {
    pub kind: CharLiteralKind,
    #[serde(rename = "originalRepresentation")]
    pub original: String,
}

impl CharLiteral {
    /// Decode the escape back to the character it denotes. `None` for named
    /// characters (`\N{GREEK ...}`), which would need a Unicode name table.
    pub fn decoded(&self) -> Option<char> {
        let body = self.original.strip_prefix('\\')?;
        let (digits, radix) = match self.kind {
            CharLiteralKind::Unicode => {
                let rest = body.strip_prefix(['x', 'u'])?;
                (trim_braces(rest), 16)
            }
            CharLiteralKind::UnicodeNamed => {
                let rest = trim_braces(body.strip_prefix('N')?);
                (rest.strip_prefix("U+")?, 16)
            }
            CharLiteralKind::Octal => (trim_braces(body.strip_prefix('o')?), 8),
            CharLiteralKind::OctalLegacy => (body, 8),
        };
        u32::from_str_radix(digits, radix)
            .ok()
            .and_then(char::from_u32)
    }
}

fn trim_braces(s: &str) -> &str {
    s.strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(s)
}

/// Character-type escape: one of `d D s S w W h H v V R`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharType {
    pub value: char,
}

/// `\X` - extended grapheme cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unicode {
    pub code: String,
}

/// Unicode property escape, `\p{L}` / `\P{L}` / `\pL`.
///
/// Negation is encoded as a leading `^` in `prop` (both `\P{...}` and
/// `\p{^...}` normalize to it). `has_braces` records the spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnicodeProp {
    pub prop: String,
    #[serde(rename = "hasBraces")]
    pub has_braces: bool,
}

/// POSIX class inside a character class, e.g. `[:alpha:]`. A leading `^`
/// in `class` marks negation (`[:^alpha:]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosixClass {
    pub class: String,
}

/// The `.` metacharacter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dot;

/// Line anchor, `^` or `$`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub value: char,
}

/// Escape assertion: one of `A z Z G b B`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    pub value: char,
}

/// `\K` - resets the reported match start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keep;

// ---- Character classes ----

/// Character class node, `[...]` / `[^...]`.
///
/// `expression` is a `Sequence` of members (or a single member, or a
/// `ClassOperation` when `&&` / `--` appear). Members are `Literal`,
/// `CharType`, `PosixClass`, `UnicodeProp`, `CharLiteral`, `Range`,
/// `ControlChar` or nested `ClassOperation` nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharClass {
    #[serde(rename = "isNegated")]
    pub negated: bool,
    pub expression: Box<Node>,
}

/// Character range inside a class, `a-z`. Both endpoints are single-character
/// nodes and the parser guarantees `ord(start) <= ord(end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub start: Box<Node>,
    pub end: Box<Node>,
}

/// Set operation inside a character class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassOperationKind {
    /// `&&`
    Intersection,
    /// `--`
    Subtraction,
}

/// `[a-z&&[^aeiou]]`-style class operation. Only valid inside a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassOperation {
    pub kind: ClassOperationKind,
    pub left: Box<Node>,
    pub right: Box<Node>,
}

/// Control character escape, `\cX`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlChar {
    #[serde(rename = "char")]
    pub ch: char,
}

impl ControlChar {
    /// The control code `\cX` denotes: bit 6 of the uppercased letter is
    /// flipped, so `\cA` is 0x01 and `\c[` is 0x1B.
    pub fn decoded(&self) -> Option<char> {
        if !self.ch.is_ascii() {
            return None;
        }
        char::from_u32((self.ch.to_ascii_uppercase() as u32) ^ 0x40)
    }
}

// ---- References ----

/// Backreference to a capturing group, by number or by name. The reference
/// is data only; it never owns the group it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backref {
    #[serde(rename = "ref")]
    pub reference: String,
}

/// Subroutine call site: `(?R)`, `(?1)`, `(?-1)`, `(?&name)`, `(?P>name)`,
/// `\g<name>` or `\g'name'`. `syntax` records which spelling was used:
/// `?`, `&`, `P>` or `g`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subroutine {
    pub reference: String,
    pub syntax: String,
}

// ---- Conditionals and definitions ----

/// Conditional group, `(?(cond)yes|no)`. A missing `no` arm is an empty
/// `Literal`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditional {
    pub condition: Box<Node>,
    pub yes: Box<Node>,
    pub no: Box<Node>,
}

/// `(?(DEFINE)...)` block: declares subpatterns without matching them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Define {
    pub content: Box<Node>,
}

/// Inline comment group, `(?#...)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub comment: String,
}

// ---- Verbs, callouts and version gates ----

/// PCRE control verb, `(*FAIL)`, `(*COMMIT)`, `(*SKIP)`, `(*PRUNE)`,
/// `(*THEN)`, `(*MARK:name)` and friends. The verb text is kept verbatim,
/// including any `:name` argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcreVerb {
    pub verb: String,
}

impl PcreVerb {
    /// Verbs that discard backtracking positions behind them.
    pub fn is_backtracking_control(&self) -> bool {
        let name = self.verb.split(':').next().unwrap_or("");
        matches!(name, "COMMIT" | "PRUNE" | "SKIP")
    }
}

/// `(*LIMIT_MATCH=n)` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitMatch {
    pub limit: u64,
}

/// Callout, `(?C)`, `(?C7)` or `(?C"tag")`. At most one of `number` / `name`
/// is set; neither for the bare `(?C)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callout {
    pub number: Option<u32>,
    pub name: Option<String>,
}

impl Callout {
    pub fn is_string_identifier(&self) -> bool {
        self.name.is_some()
    }
}

/// `(*script_run:...)` verb. The script text is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRun {
    pub script: String,
}

/// `(?(VERSION>=n)...)` condition head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionCondition {
    pub operator: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantifier_token_bounds() {
        assert_eq!(parse_quantifier_token("*"), (0, None));
        assert_eq!(parse_quantifier_token("+"), (1, None));
        assert_eq!(parse_quantifier_token("?"), (0, Some(1)));
        assert_eq!(parse_quantifier_token("{3}"), (3, Some(3)));
        assert_eq!(parse_quantifier_token("{2,}"), (2, None));
        assert_eq!(parse_quantifier_token("{2,5}"), (2, Some(5)));
    }

    #[test]
    fn exact_repetition_is_bounded() {
        let q = Quantifier {
            kind: QuantifierKind::Greedy,
            quantifier: "{4,4}".to_string(),
            child: Box::new(Node::empty()),
        };
        assert!(!q.is_unbounded());
    }

    #[test]
    fn group_type_classification() {
        assert!(GroupType::Named.is_capturing());
        assert!(GroupType::BranchReset.is_capturing());
        assert!(!GroupType::Atomic.is_capturing());
        assert!(GroupType::LookbehindNegative.is_lookaround());
        assert!(!GroupType::InlineFlags.is_lookaround());
    }

    #[test]
    fn verb_backtracking_control() {
        let commit = PcreVerb {
            verb: "COMMIT".to_string(),
        };
        let mark = PcreVerb {
            verb: "MARK:here".to_string(),
        };
        assert!(commit.is_backtracking_control());
        assert!(!mark.is_backtracking_control());
    }

    #[test]
    fn node_serializes_with_type_tag() {
        let node = Node::Literal(Literal {
            value: "abc".to_string(),
        });
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "Literal");
        assert_eq!(json["value"], "abc");
    }

    #[test]
    fn zero_width_nodes() {
        assert!(Node::Anchor(Anchor { value: '^' }).is_zero_width());
        assert!(Node::Keep(Keep).is_zero_width());
        assert!(!Node::Dot(Dot).is_zero_width());
    }
}
