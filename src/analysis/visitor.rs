//! The visitor seam shared by every analysis and renderer.
//!
//! [`Analyze`] offers one method per node variant; each defaults to
//! [`Analyze::default_output`], so partial analyses only override what they
//! care about. [`Analyze::visit`] is the single dispatch point that matches
//! on the variant, and [`accept`] is the public entry used by external
//! consumers (renderers, generators) as well as this crate's own emitter and
//! scorer. Visitors never mutate the tree; they produce values.

use crate::core::nodes::*;

/// A polymorphic analysis over the AST, returning `Output` per node.
pub trait Analyze {
    type Output;

    /// Base value returned by every variant method that is not overridden.
    fn default_output(&mut self) -> Self::Output;

    /// Dispatch on the node variant.
    fn visit(&mut self, node: &Node) -> Self::Output {
        match node {
            Node::Regex(n) => self.visit_regex(n),
            Node::Alternation(n) => self.visit_alternation(n),
            Node::Sequence(n) => self.visit_sequence(n),
            Node::Group(n) => self.visit_group(n),
            Node::Quantifier(n) => self.visit_quantifier(n),
            Node::Literal(n) => self.visit_literal(n),
            Node::CharLiteral(n) => self.visit_char_literal(n),
            Node::CharType(n) => self.visit_char_type(n),
            Node::Unicode(n) => self.visit_unicode(n),
            Node::UnicodeProp(n) => self.visit_unicode_prop(n),
            Node::PosixClass(n) => self.visit_posix_class(n),
            Node::Dot(n) => self.visit_dot(n),
            Node::Anchor(n) => self.visit_anchor(n),
            Node::Assertion(n) => self.visit_assertion(n),
            Node::Keep(n) => self.visit_keep(n),
            Node::CharClass(n) => self.visit_char_class(n),
            Node::Range(n) => self.visit_range(n),
            Node::ClassOperation(n) => self.visit_class_operation(n),
            Node::ControlChar(n) => self.visit_control_char(n),
            Node::Backref(n) => self.visit_backref(n),
            Node::Subroutine(n) => self.visit_subroutine(n),
            Node::Conditional(n) => self.visit_conditional(n),
            Node::Define(n) => self.visit_define(n),
            Node::Comment(n) => self.visit_comment(n),
            Node::PcreVerb(n) => self.visit_pcre_verb(n),
            Node::LimitMatch(n) => self.visit_limit_match(n),
            Node::Callout(n) => self.visit_callout(n),
            Node::ScriptRun(n) => self.visit_script_run(n),
            Node::VersionCondition(n) => self.visit_version_condition(n),
        }
    }

    fn visit_regex(&mut self, node: &Regex) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_alternation(&mut self, node: &Alternation) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_sequence(&mut self, node: &Sequence) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_group(&mut self, node: &Group) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_quantifier(&mut self, node: &Quantifier) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_literal(&mut self, node: &Literal) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_char_literal(&mut self, node: &CharLiteral) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_char_type(&mut self, node: &CharType) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_unicode(&mut self, node: &Unicode) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_unicode_prop(&mut self, node: &UnicodeProp) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_posix_class(&mut self, node: &PosixClass) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_dot(&mut self, node: &Dot) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_anchor(&mut self, node: &Anchor) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_assertion(&mut self, node: &Assertion) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_keep(&mut self, node: &Keep) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_char_class(&mut self, node: &CharClass) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_range(&mut self, node: &Range) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_class_operation(&mut self, node: &ClassOperation) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_control_char(&mut self, node: &ControlChar) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_backref(&mut self, node: &Backref) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_subroutine(&mut self, node: &Subroutine) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_conditional(&mut self, node: &Conditional) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_define(&mut self, node: &Define) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_comment(&mut self, node: &Comment) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_pcre_verb(&mut self, node: &PcreVerb) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_limit_match(&mut self, node: &LimitMatch) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_callout(&mut self, node: &Callout) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_script_run(&mut self, node: &ScriptRun) -> Self::Output {
        let _ = node;
        self.default_output()
    }
    fn visit_version_condition(&mut self, node: &VersionCondition) -> Self::Output {
        let _ = node;
        self.default_output()
    }
}

/// Run a visitor over a node. This is the extension seam: renderers and
/// generators outside this crate consume the AST exclusively through it.
pub fn accept<V: Analyze>(node: &Node, visitor: &mut V) -> V::Output {
    visitor.visit(node)
}

/// Run a visitor over a whole parsed pattern, starting at the root.
pub fn accept_regex<V: Analyze>(regex: &Regex, visitor: &mut V) -> V::Output {
    visitor.visit_regex(regex)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts consumed leaf nodes, leaving everything else at the default.
    struct LeafCounter;

    impl Analyze for LeafCounter {
        type Output = usize;

        fn default_output(&mut self) -> usize {
            0
        }

        fn visit_literal(&mut self, node: &Literal) -> usize {
            node.value.chars().count()
        }

        fn visit_dot(&mut self, _node: &Dot) -> usize {
            1
        }

        fn visit_sequence(&mut self, node: &Sequence) -> usize {
            node.children.iter().map(|child| self.visit(child)).sum()
        }
    }

    #[test]
    fn default_methods_fall_back() {
        let mut counter = LeafCounter;
        let anchor = Node::Anchor(Anchor { value: '^' });
        assert_eq!(accept(&anchor, &mut counter), 0);
    }

    #[test]
    fn overridden_methods_compose() {
        let mut counter = LeafCounter;
        let seq = Node::Sequence(Sequence {
            children: vec![
                Node::Literal(Literal {
                    value: "ab".to_string(),
                }),
                Node::Dot(Dot),
                Node::Anchor(Anchor { value: '$' }),
            ],
        });
        assert_eq!(accept(&seq, &mut counter), 3);
    }
}
