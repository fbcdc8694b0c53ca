//! Complexity scoring: a single integer summarizing how much work a
//! pattern can ask of a backtracking engine. The score is a supporting
//! signal next to the profiler, not a vulnerability verdict.
//!
//! Unbounded quantifiers dominate the score, and nesting them multiplies
//! the penalty. Lookarounds, references, conditionals and verbs carry a
//! flat complexity charge; ordinary atoms cost their size.

use crate::analysis::visitor::Analyze;
use crate::core::nodes::*;

/// Cost of an ordinary atom.
pub const BASE: u64 = 1;
/// Cost of an unbounded quantifier before nesting multipliers.
pub const UNBOUNDED: u64 = 10;
/// Cost of engine features beyond plain matching.
pub const COMPLEX: u64 = 5;
/// Multiplier applied per level of unbounded nesting.
pub const NESTING: u64 = 2;

/// Scoring visitor. `depth` counts enclosing unbounded quantifiers; the
/// one-slot cache remembers the last raw quantifier token classified.
#[derive(Default)]
pub struct ComplexityScorer {
    depth: u64,
    cache: Option<(String, bool)>,
}

impl ComplexityScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score a parsed pattern. The depth counter resets per run.
    pub fn score(&mut self, regex: &Regex) -> u64 {
        self.depth = 0;
        self.visit(&regex.pattern)
    }

    fn is_unbounded(&mut self, token: &str) -> bool {
        if let Some((cached_token, unbounded)) = &self.cache {
            if cached_token == token {
                return *unbounded;
            }
        }
        let unbounded = parse_quantifier_token(token).1.is_none();
        self.cache = Some((token.to_string(), unbounded));
        unbounded
    }
}

impl Analyze for ComplexityScorer {
    type Output = u64;

    fn default_output(&mut self) -> u64 {
        BASE
    }

    fn visit_regex(&mut self, node: &Regex) -> u64 {
        self.depth = 0;
        self.visit(&node.pattern)
    }

    fn visit_alternation(&mut self, node: &Alternation) -> u64 {
        BASE + node
            .alternatives
            .iter()
            .map(|alt| self.visit(alt))
            .sum::<u64>()
    }

    fn visit_sequence(&mut self, node: &Sequence) -> u64 {
        node.children.iter().map(|child| self.visit(child)).sum()
    }

    fn visit_group(&mut self, node: &Group) -> u64 {
        let charge = if node.kind.is_lookaround() {
            COMPLEX
        } else {
            BASE
        };
        charge + self.visit(&node.child)
    }

    fn visit_quantifier(&mut self, node: &Quantifier) -> u64 {
        if self.is_unbounded(&node.quantifier) {
            let penalty = if self.depth > 0 {
                UNBOUNDED * NESTING * self.depth
            } else {
                UNBOUNDED
            };
            self.depth += 1;
            let child = self.visit(&node.child);
            self.depth -= 1;
            penalty + child
        } else {
            BASE + self.visit(&node.child)
        }
    }

    fn visit_literal(&mut self, node: &Literal) -> u64 {
        BASE * node.value.chars().count() as u64
    }

    fn visit_char_class(&mut self, node: &CharClass) -> u64 {
        BASE + self.visit(&node.expression)
    }

    fn visit_range(&mut self, node: &Range) -> u64 {
        BASE + self.visit(&node.start) + self.visit(&node.end)
    }

    fn visit_class_operation(&mut self, node: &ClassOperation) -> u64 {
        BASE + self.visit(&node.left) + self.visit(&node.right)
    }

    fn visit_backref(&mut self, _node: &Backref) -> u64 {
        COMPLEX
    }

    fn visit_pcre_verb(&mut self, _node: &PcreVerb) -> u64 {
        COMPLEX
    }

    fn visit_limit_match(&mut self, _node: &LimitMatch) -> u64 {
        COMPLEX
    }

    fn visit_callout(&mut self, _node: &Callout) -> u64 {
        COMPLEX
    }

    fn visit_script_run(&mut self, _node: &ScriptRun) -> u64 {
        COMPLEX
    }

    fn visit_version_condition(&mut self, _node: &VersionCondition) -> u64 {
        COMPLEX
    }

    fn visit_subroutine(&mut self, _node: &Subroutine) -> u64 {
        2 * COMPLEX
    }

    fn visit_conditional(&mut self, node: &Conditional) -> u64 {
        2 * COMPLEX
            + self.visit(&node.condition)
            + self.visit(&node.yes)
            + self.visit(&node.no)
    }

    fn visit_define(&mut self, node: &Define) -> u64 {
        COMPLEX + self.visit(&node.content)
    }

    fn visit_comment(&mut self, _node: &Comment) -> u64 {
        0
    }
}

/// Score a parsed pattern with a fresh scorer.
pub fn score(regex: &Regex) -> u64 {
    ComplexityScorer::new().score(regex)
}
