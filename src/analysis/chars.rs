//! Character-set analysis: the possible first and last code points of a
//! subtree.
//!
//! Both [`first_chars`] and [`last_chars`] return an over-approximation: a
//! known set (explicit code points plus tagged character-type classes) or
//! the `Unknown` sentinel. `Unknown` is always safe; callers must assume
//! overlap. The analyzer is pure and total.
//!
//! The profiler uses these sets for two jobs: boundary exclusivity (a
//! quantifier separated from its neighbor by provably disjoint characters
//! cannot pivot backtracking) and alternation-overlap detection. Both only
//! act when sets are *known*, so every doubtful construct degrades to
//! `Unknown` rather than risking a false "disjoint" verdict.

use crate::core::nodes::*;
use std::collections::BTreeSet;

/// Explicit enumerations larger than this collapse to `Unknown`.
const MAX_ENUMERATED: usize = 128;

/// Tagged character-type classes with PCRE's default (ASCII) tables, plus
/// the extra code points `\h` / `\v` recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TypeClass {
    Digit,
    NotDigit,
    Word,
    NotWord,
    Space,
    NotSpace,
    HorizontalSpace,
    NotHorizontalSpace,
    VerticalSpace,
    NotVerticalSpace,
}

impl TypeClass {
    fn from_char_type(value: char) -> Option<TypeClass> {
        match value {
            'd' => Some(TypeClass::Digit),
            'D' => Some(TypeClass::NotDigit),
            'w' => Some(TypeClass::Word),
            'W' => Some(TypeClass::NotWord),
            's' => Some(TypeClass::Space),
            'S' => Some(TypeClass::NotSpace),
            'h' => Some(TypeClass::HorizontalSpace),
            'H' => Some(TypeClass::NotHorizontalSpace),
            'v' => Some(TypeClass::VerticalSpace),
            'V' => Some(TypeClass::NotVerticalSpace),
            // \R matches newline sequences; every character involved is
            // vertical whitespace.
            'R' => Some(TypeClass::VerticalSpace),
            _ => None,
        }
    }

    /// Membership test against the class definition.
    pub fn contains(&self, ch: char) -> bool {
        match self {
            TypeClass::Digit => ch.is_ascii_digit(),
            TypeClass::NotDigit => !ch.is_ascii_digit(),
            TypeClass::Word => ch.is_ascii_alphanumeric() || ch == '_',
            TypeClass::NotWord => !(ch.is_ascii_alphanumeric() || ch == '_'),
            TypeClass::Space => " \t\n\r\x0B\x0C".contains(ch),
            TypeClass::NotSpace => !" \t\n\r\x0B\x0C".contains(ch),
            TypeClass::HorizontalSpace => is_horizontal_space(ch),
            TypeClass::NotHorizontalSpace => !is_horizontal_space(ch),
            TypeClass::VerticalSpace => is_vertical_space(ch),
            TypeClass::NotVerticalSpace => !is_vertical_space(ch),
        }
    }
}

fn is_horizontal_space(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\t'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
    )
}

fn is_vertical_space(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\x0B' | '\x0C' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}

/// The sample universe used to decide whether two tagged classes can share
/// a member: all of ASCII plus every non-ASCII code point any class
/// definition mentions.
fn class_universe() -> impl Iterator<Item = char> {
    (0u32..=0x7F)
        .filter_map(char::from_u32)
        .chain([
            '\u{0085}', '\u{00A0}', '\u{1680}', '\u{2000}', '\u{200A}', '\u{2028}', '\u{2029}',
            '\u{202F}', '\u{205F}', '\u{3000}', '\u{00E9}',
        ])
}

/// A known set: explicit code points plus tagged classes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KnownSet {
    pub chars: BTreeSet<char>,
    pub classes: BTreeSet<TypeClass>,
}

impl KnownSet {
    fn singleton(ch: char) -> KnownSet {
        KnownSet {
            chars: BTreeSet::from([ch]),
            classes: BTreeSet::new(),
        }
    }

    fn class(class: TypeClass) -> KnownSet {
        KnownSet {
            chars: BTreeSet::new(),
            classes: BTreeSet::from([class]),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty() && self.classes.is_empty()
    }

    fn merge(&mut self, other: KnownSet) {
        self.chars.extend(other.chars);
        self.classes.extend(other.classes);
    }

    fn intersects(&self, other: &KnownSet) -> bool {
        if self.chars.intersection(&other.chars).next().is_some() {
            return true;
        }
        let char_in_classes = |chars: &BTreeSet<char>, classes: &BTreeSet<TypeClass>| {
            chars
                .iter()
                .any(|&ch| classes.iter().any(|class| class.contains(ch)))
        };
        if char_in_classes(&self.chars, &other.classes)
            || char_in_classes(&other.chars, &self.classes)
        {
            return true;
        }
        // Class-versus-class overlap, decided over the sample universe.
        if !self.classes.is_empty() && !other.classes.is_empty() {
            return class_universe().any(|ch| {
                self.classes.iter().any(|a| a.contains(ch))
                    && other.classes.iter().any(|b| b.contains(ch))
            });
        }
        false
    }
}

/// Result of the analysis: a known over-approximation or the sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharSet {
    Known(KnownSet),
    Unknown,
}

impl CharSet {
    fn empty() -> CharSet {
        CharSet::Known(KnownSet::default())
    }

    fn singleton(ch: char) -> CharSet {
        CharSet::Known(KnownSet::singleton(ch))
    }

    fn class(class: TypeClass) -> CharSet {
        CharSet::Known(KnownSet::class(class))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, CharSet::Unknown)
    }

    pub fn is_known(&self) -> bool {
        !self.is_unknown()
    }

    /// True when the set is known to contain nothing (zero-width subtree).
    pub fn is_known_empty(&self) -> bool {
        matches!(self, CharSet::Known(set) if set.is_empty())
    }

    /// Union; `Unknown` absorbs, and oversized enumerations degrade.
    fn union(self, other: CharSet) -> CharSet {
        match (self, other) {
            (CharSet::Known(mut a), CharSet::Known(b)) => {
                a.merge(b);
                if a.chars.len() > MAX_ENUMERATED {
                    CharSet::Unknown
                } else {
                    CharSet::Known(a)
                }
            }
            _ => CharSet::Unknown,
        }
    }

    /// False only when both sets are known and provably disjoint.
    pub fn intersects(&self, other: &CharSet) -> bool {
        match (self, other) {
            (CharSet::Known(a), CharSet::Known(b)) => a.intersects(b),
            _ => true,
        }
    }
}

/// Convenience mirror of [`CharSet::intersects`].
pub fn intersects(a: &CharSet, b: &CharSet) -> bool {
    a.intersects(b)
}

/// Which end of the subtree is being asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    First,
    Last,
}

/// The set of possible first code points of a subtree.
pub fn first_chars(node: &Node) -> CharSet {
    chars_at(node, End::First)
}

/// The set of possible last code points of a subtree.
pub fn last_chars(node: &Node) -> CharSet {
    chars_at(node, End::Last)
}

/// True when a sequence child can contribute a first/last character.
/// Zero-width nodes and lookarounds are skipped.
fn consumes(node: &Node) -> bool {
    match node {
        Node::Group(group) => !group.kind.is_lookaround(),
        Node::Define(_) => false,
        other => !other.is_zero_width(),
    }
}

fn chars_at(node: &Node, end: End) -> CharSet {
    match node {
        Node::Regex(regex) => chars_at(&regex.pattern, end),

        Node::Literal(lit) => {
            let ch = match end {
                End::First => lit.value.chars().next(),
                End::Last => lit.value.chars().last(),
            };
            match ch {
                Some(ch) => CharSet::singleton(ch),
                None => CharSet::empty(),
            }
        }
        Node::CharLiteral(cl) => match cl.decoded() {
            Some(ch) => CharSet::singleton(ch),
            None => CharSet::Unknown,
        },
        Node::ControlChar(cc) => match cc.decoded() {
            Some(ch) => CharSet::singleton(ch),
            None => CharSet::Unknown,
        },
        Node::CharType(ct) => match TypeClass::from_char_type(ct.value) {
            Some(class) => CharSet::class(class),
            None => CharSet::Unknown,
        },
        Node::PosixClass(pc) => posix_chars(&pc.class),

        Node::Alternation(alt) => alt
            .alternatives
            .iter()
            .fold(CharSet::empty(), |acc, branch| {
                acc.union(chars_at(branch, end))
            }),

        Node::Sequence(seq) => {
            let found = match end {
                End::First => seq.children.iter().find(|child| consumes(child)),
                End::Last => seq.children.iter().rev().find(|child| consumes(child)),
            };
            match found {
                Some(child) => chars_at(child, end),
                None => CharSet::empty(),
            }
        }

        Node::Group(group) => chars_at(&group.child, end),

        Node::Quantifier(quant) => {
            // A min-0 quantifier can match empty, so the first character may
            // come from whatever follows; give up rather than guess.
            let (min, _) = quant.bounds();
            if min == 0 {
                CharSet::Unknown
            } else {
                chars_at(&quant.child, end)
            }
        }

        Node::CharClass(cc) => {
            if cc.negated {
                // Complements are effectively unbounded.
                CharSet::Unknown
            } else {
                class_chars(&cc.expression, end)
            }
        }
        Node::Range(range) => range_chars(range),

        // Everything else either consumes nothing or cannot be decided:
        // dot, unicode properties and graphemes, references, conditionals,
        // verbs, anchors. Unknown is the safe answer for all of them.
        _ => CharSet::Unknown,
    }
}

/// Union over the members of a character-class expression.
fn class_chars(expression: &Node, end: End) -> CharSet {
    match expression {
        Node::Sequence(seq) => seq
            .children
            .iter()
            .fold(CharSet::empty(), |acc, member| {
                acc.union(class_chars(member, end))
            }),
        // Intersection and subtraction results are subsets of the left
        // operand, so the left side alone is a sound over-approximation.
        Node::ClassOperation(op) => class_chars(&op.left, end),
        other => chars_at(other, end),
    }
}

/// Enumerate a class range when it is small enough.
fn range_chars(range: &Range) -> CharSet {
    let endpoints = (single_char(&range.start), single_char(&range.end));
    match endpoints {
        (Some(from), Some(to)) if from <= to => {
            let span = (to as usize).saturating_sub(from as usize) + 1;
            if span > MAX_ENUMERATED {
                return CharSet::Unknown;
            }
            let chars: BTreeSet<char> = (from as u32..=to as u32)
                .filter_map(char::from_u32)
                .collect();
            CharSet::Known(KnownSet {
                chars,
                classes: BTreeSet::new(),
            })
        }
        _ => CharSet::Unknown,
    }
}

fn single_char(node: &Node) -> Option<char> {
    match node {
        Node::Literal(lit) => {
            let mut chars = lit.value.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Some(ch),
                _ => None,
            }
        }
        Node::CharLiteral(cl) => cl.decoded(),
        Node::ControlChar(cc) => cc.decoded(),
        _ => None,
    }
}

/// POSIX classes map to tagged classes where one exists and to explicit
/// ASCII enumerations otherwise. Negated classes are complements, hence
/// Unknown.
fn posix_chars(class: &str) -> CharSet {
    if class.starts_with('^') {
        return CharSet::Unknown;
    }
    match class {
        "digit" => CharSet::class(TypeClass::Digit),
        "space" => CharSet::class(TypeClass::Space),
        "word" => CharSet::class(TypeClass::Word),
        "blank" => CharSet::class(TypeClass::HorizontalSpace),
        "alpha" => enumerate(|ch| ch.is_ascii_alphabetic()),
        "alnum" => enumerate(|ch| ch.is_ascii_alphanumeric()),
        "upper" => enumerate(|ch| ch.is_ascii_uppercase()),
        "lower" => enumerate(|ch| ch.is_ascii_lowercase()),
        "xdigit" => enumerate(|ch| ch.is_ascii_hexdigit()),
        "punct" => enumerate(|ch| ch.is_ascii_punctuation()),
        "graph" => enumerate(|ch| ch.is_ascii_graphic()),
        "print" => enumerate(|ch| ch.is_ascii_graphic() || ch == ' '),
        "cntrl" => enumerate(|ch| ch.is_ascii_control()),
        "ascii" => enumerate(|ch| ch.is_ascii()),
        _ => CharSet::Unknown,
    }
}

fn enumerate(predicate: impl Fn(char) -> bool) -> CharSet {
    let chars: BTreeSet<char> = (0u32..=0x7F)
        .filter_map(char::from_u32)
        .filter(|&ch| predicate(ch))
        .collect();
    if chars.len() > MAX_ENUMERATED {
        CharSet::Unknown
    } else {
        CharSet::Known(KnownSet {
            chars,
            classes: BTreeSet::new(),
        })
    }
}
