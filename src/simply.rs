//! Fluent builder helpers for constructing AST `Node`s by hand.
//!
//! These constructors keep tests and examples concise when a tree is easier
//! to state directly than to parse. They mirror what the parser would
//! produce for the equivalent source.

use crate::core::nodes::*;

/// A literal string.
pub fn literal(s: &str) -> Node {
    Node::Literal(Literal {
        value: s.to_string(),
    })
}

/// The `^` anchor.
pub fn start() -> Node {
    Node::Anchor(Anchor { value: '^' })
}

/// The `$` anchor.
pub fn end() -> Node {
    Node::Anchor(Anchor { value: '$' })
}

/// The `.` metacharacter.
pub fn dot() -> Node {
    Node::Dot(Dot)
}

/// A character-type escape such as `\d` or `\w`.
pub fn char_type(value: char) -> Node {
    Node::CharType(CharType { value })
}

/// A sequence of parts matched in order.
pub fn seq(children: Vec<Node>) -> Node {
    Node::Sequence(Sequence { children })
}

/// An alternation over two or more branches.
pub fn alt(alternatives: Vec<Node>) -> Node {
    Node::Alternation(Alternation { alternatives })
}

/// A plain capturing group.
pub fn capture(child: Node) -> Node {
    group(GroupType::Capturing, child)
}

/// A named capturing group.
pub fn named(name: &str, child: Node) -> Node {
    Node::Group(Group {
        kind: GroupType::Named,
        name: Some(name.to_string()),
        flags: None,
        child: Box::new(child),
    })
}

/// An atomic group, `(?>...)`.
pub fn atomic(child: Node) -> Node {
    group(GroupType::Atomic, child)
}

/// Any group kind without name or flags.
pub fn group(kind: GroupType, child: Node) -> Node {
    Node::Group(Group {
        kind,
        name: None,
        flags: None,
        child: Box::new(child),
    })
}

/// `child*`.
pub fn zero_or_more(child: Node) -> Node {
    quantified(child, "*")
}

/// `child+`.
pub fn one_or_more(child: Node) -> Node {
    quantified(child, "+")
}

/// `child?`.
pub fn optional(child: Node) -> Node {
    quantified(child, "?")
}

/// `child{min,max}`.
pub fn repeated(child: Node, min: u64, max: u64) -> Node {
    quantified(child, &format!("{{{},{}}}", min, max))
}

/// A greedy quantifier with a raw token.
pub fn quantified(child: Node, token: &str) -> Node {
    Node::Quantifier(Quantifier {
        kind: QuantifierKind::Greedy,
        quantifier: token.to_string(),
        child: Box::new(child),
    })
}

/// A numbered or named backreference.
pub fn backref(reference: &str) -> Node {
    Node::Backref(Backref {
        reference: reference.to_string(),
    })
}

/// A character class over the given single-character members.
pub fn any_of(chars: &str) -> Node {
    let members = chars
        .chars()
        .map(|ch| {
            Node::Literal(Literal {
                value: ch.to_string(),
            })
        })
        .collect();
    Node::CharClass(CharClass {
        negated: false,
        expression: Box::new(Node::Sequence(Sequence { children: members })),
    })
}

/// Wrap a pattern node in a root `Regex` with `/` delimiters.
pub fn regex(pattern: Node) -> Regex {
    Regex {
        delimiter: '/',
        flags: String::new(),
        pattern: Box::new(pattern),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitters::pcre::stringify;
    use crate::{profile, score, Severity};

    #[test]
    fn builders_mirror_parsed_trees() {
        let built = seq(vec![start(), capture(one_or_more(char_type('d'))), end()]);
        let parsed = crate::parse("/^(\\d+)$/").unwrap();
        assert_eq!(built, *parsed.pattern);
    }

    #[test]
    fn built_trees_feed_the_analyses() {
        let tree = regex(quantified(capture(one_or_more(literal("a"))), "*"));
        assert_eq!(profile(&tree).severity, Severity::Critical);
        assert!(score(&tree) > 20);
    }

    #[test]
    fn built_trees_stringify() {
        let tree = seq(vec![literal("ab"), optional(any_of("xyz"))]);
        assert_eq!(stringify(&tree), "ab[xyz]?");
    }
}
