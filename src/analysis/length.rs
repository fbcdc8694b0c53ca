//! Match-length inference: the `[min, max]` number of characters a subtree
//! can consume, with `None` standing for unbounded. The profiler uses this
//! to find variable-length capturing groups, the precondition for
//! backreference-driven backtracking loops.

use crate::core::nodes::*;

/// Inclusive length range; `max == None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthRange {
    pub min: u64,
    pub max: Option<u64>,
}

impl LengthRange {
    pub const ZERO: LengthRange = LengthRange {
        min: 0,
        max: Some(0),
    };

    fn exact(n: u64) -> LengthRange {
        LengthRange {
            min: n,
            max: Some(n),
        }
    }

    pub fn is_variable(&self) -> bool {
        match self.max {
            Some(max) => self.min != max,
            None => true,
        }
    }

    /// Componentwise sum; unbounded absorbs.
    fn plus(self, other: LengthRange) -> LengthRange {
        LengthRange {
            min: self.min.saturating_add(other.min),
            max: match (self.max, other.max) {
                (Some(a), Some(b)) => Some(a.saturating_add(b)),
                _ => None,
            },
        }
    }

    /// Union of alternatives: min of mins, max of maxes, unbounded absorbs.
    fn or(self, other: LengthRange) -> LengthRange {
        LengthRange {
            min: self.min.min(other.min),
            max: match (self.max, other.max) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            },
        }
    }

    /// Repetition: `[min*qmin, max*qmax]`, unbounded absorbs except when
    /// the child consumes nothing.
    fn repeat(self, qmin: u64, qmax: Option<u64>) -> LengthRange {
        LengthRange {
            min: self.min.saturating_mul(qmin),
            max: match (self.max, qmax) {
                (Some(0), _) => Some(0),
                (Some(max), Some(qmax)) => Some(max.saturating_mul(qmax)),
                _ => None,
            },
        }
    }
}

/// Compute the length range of a subtree.
pub fn length_range(node: &Node) -> LengthRange {
    match node {
        Node::Regex(regex) => length_range(&regex.pattern),

        Node::Literal(lit) => LengthRange::exact(lit.value.chars().count() as u64),
        Node::CharType(_)
        | Node::Dot(_)
        | Node::CharClass(_)
        | Node::Range(_)
        | Node::ClassOperation(_)
        | Node::Unicode(_)
        | Node::UnicodeProp(_)
        | Node::CharLiteral(_)
        | Node::PosixClass(_)
        | Node::ControlChar(_) => LengthRange::exact(1),

        Node::Anchor(_)
        | Node::Assertion(_)
        | Node::Keep(_)
        | Node::PcreVerb(_)
        | Node::Comment(_)
        | Node::Callout(_)
        | Node::LimitMatch(_)
        | Node::ScriptRun(_)
        | Node::VersionCondition(_)
        | Node::Define(_) => LengthRange::ZERO,

        Node::Sequence(seq) => seq
            .children
            .iter()
            .fold(LengthRange::ZERO, |acc, child| {
                acc.plus(length_range(child))
            }),

        Node::Alternation(alt) => {
            let mut ranges = alt.alternatives.iter().map(length_range);
            match ranges.next() {
                Some(first) => ranges.fold(first, LengthRange::or),
                None => LengthRange::ZERO,
            }
        }

        Node::Group(group) => {
            if group.kind.is_lookaround() {
                LengthRange::ZERO
            } else {
                length_range(&group.child)
            }
        }

        Node::Quantifier(quant) => {
            let (qmin, qmax) = quant.bounds();
            length_range(&quant.child).repeat(qmin, qmax)
        }

        Node::Conditional(cond) => {
            length_range(&cond.yes).or(length_range(&cond.no))
        }

        // References re-match arbitrary previously bound text.
        Node::Backref(_) | Node::Subroutine(_) => LengthRange {
            min: 0,
            max: None,
        },
    }
}

/// True when the pattern contains a backreference anywhere.
pub fn contains_backref(node: &Node) -> bool {
    any_node(node, &mut |n| matches!(n, Node::Backref(_)))
}

/// True when the pattern contains a capturing group whose contents can
/// match at more than one length.
pub fn has_variable_length_capture(node: &Node) -> bool {
    any_node(node, &mut |n| {
        matches!(n, Node::Group(group)
            if group.kind.is_capturing() && length_range(&group.child).is_variable())
    })
}

/// Depth-first search for any node matching the predicate.
fn any_node(node: &Node, predicate: &mut dyn FnMut(&Node) -> bool) -> bool {
    if predicate(node) {
        return true;
    }
    match node {
        Node::Regex(regex) => any_node(&regex.pattern, predicate),
        Node::Alternation(alt) => alt
            .alternatives
            .iter()
            .any(|branch| any_node(branch, predicate)),
        Node::Sequence(seq) => seq.children.iter().any(|child| any_node(child, predicate)),
        Node::Group(group) => any_node(&group.child, predicate),
        Node::Quantifier(quant) => any_node(&quant.child, predicate),
        Node::CharClass(cc) => any_node(&cc.expression, predicate),
        Node::Range(range) => {
            any_node(&range.start, predicate) || any_node(&range.end, predicate)
        }
        Node::ClassOperation(op) => {
            any_node(&op.left, predicate) || any_node(&op.right, predicate)
        }
        Node::Conditional(cond) => {
            any_node(&cond.condition, predicate)
                || any_node(&cond.yes, predicate)
                || any_node(&cond.no, predicate)
        }
        Node::Define(def) => any_node(&def.content, predicate),
        _ => false,
    }
}
