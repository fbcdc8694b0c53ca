//! PCRE Emitter - canonical re-emission of AST subtrees.
//!
//! The emitter turns any subtree back into PCRE source. The profiler uses it
//! to quote offending fragments, the CLI exposes it as `emit`, and the test
//! suites rely on its round-trip property: emitting a parsed pattern and
//! parsing the result yields a structurally equal tree.
//!
//! Canonical choices: character literals keep their original spelling,
//! negated properties render as `\P{...}`, named groups as `(?<name>...)`,
//! named backreferences as `\k<name>`. Literal text is escaped so that it
//! survives re-parsing even in free-spacing mode.

use crate::analysis::visitor::Analyze;
use crate::core::nodes::*;

/// Stateful stringifier. The only state is whether emission is currently
/// inside a character class, which changes literal escaping.
#[derive(Default)]
pub struct PcreEmitter {
    in_class: bool,
}

impl PcreEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit canonical source for a subtree.
    pub fn emit(&mut self, node: &Node) -> String {
        self.visit(node)
    }

    /// Escape one character for the current context.
    fn escape_char(&self, ch: char) -> String {
        if self.in_class {
            match ch {
                ']' | '\\' | '^' | '-' | '[' | '&' => format!("\\{}", ch),
                '\n' => "\\n".to_string(),
                '\r' => "\\r".to_string(),
                '\t' => "\\t".to_string(),
                '\u{000C}' => "\\f".to_string(),
                '\u{0008}' => "\\b".to_string(),
                _ => ch.to_string(),
            }
        } else {
            match ch {
                '.' | '*' | '+' | '?' | '^' | '$' | '|' | '(' | ')' | '[' | ']' | '{' | '}'
                | '\\' | '/' => format!("\\{}", ch),
                // Escaped so the text survives free-spacing mode.
                ' ' => "\\ ".to_string(),
                '#' => "\\#".to_string(),
                '\n' => "\\n".to_string(),
                '\r' => "\\r".to_string(),
                '\t' => "\\t".to_string(),
                '\u{000C}' => "\\f".to_string(),
                '\u{0007}' => "\\a".to_string(),
                '\u{001B}' => "\\e".to_string(),
                _ => ch.to_string(),
            }
        }
    }

    fn escape_text(&self, text: &str) -> String {
        text.chars().map(|ch| self.escape_char(ch)).collect()
    }

    /// A quantifier child that is not a single atom needs a group to keep
    /// the quantifier bound to the whole subtree. Parsed trees already
    /// satisfy this; hand-built trees may not.
    fn emit_quantifier_child(&mut self, node: &Node) -> String {
        let needs_group = match node {
            Node::Literal(lit) => lit.value.chars().count() != 1,
            Node::Sequence(_) | Node::Alternation(_) => true,
            _ => false,
        };
        let body = self.visit(node);
        if needs_group {
            format!("(?:{})", body)
        } else {
            body
        }
    }

    fn condition_text(&mut self, condition: &Node) -> String {
        match condition {
            Node::Backref(backref) => {
                let numeric = backref
                    .reference
                    .chars()
                    .all(|ch| ch.is_ascii_digit() || ch == '-' || ch == '+');
                if numeric {
                    backref.reference.clone()
                } else {
                    format!("<{}>", backref.reference)
                }
            }
            Node::Subroutine(sub) => sub.reference.clone(),
            Node::VersionCondition(vc) => format!("VERSION{}{}", vc.operator, vc.version),
            Node::Group(group) => {
                let prefix = match group.kind {
                    GroupType::LookaheadPositive => "?=",
                    GroupType::LookaheadNegative => "?!",
                    GroupType::LookbehindPositive => "?<=",
                    GroupType::LookbehindNegative => "?<!",
                    _ => "?:",
                };
                format!("{}{}", prefix, self.visit(&group.child))
            }
            other => self.visit(other),
        }
    }
}

impl Analyze for PcreEmitter {
    type Output = String;

    fn default_output(&mut self) -> String {
        String::new()
    }

    fn visit_regex(&mut self, node: &Regex) -> String {
        let close = match node.delimiter {
            '(' => ')',
            '[' => ']',
            '{' => '}',
            '<' => '>',
            other => other,
        };
        format!(
            "{}{}{}{}",
            node.delimiter,
            self.visit(&node.pattern),
            close,
            node.flags
        )
    }

    fn visit_alternation(&mut self, node: &Alternation) -> String {
        node.alternatives
            .iter()
            .map(|alt| self.visit(alt))
            .collect::<Vec<_>>()
            .join("|")
    }

    fn visit_sequence(&mut self, node: &Sequence) -> String {
        node.children.iter().map(|child| self.visit(child)).collect()
    }

    fn visit_group(&mut self, node: &Group) -> String {
        let child = self.visit(&node.child);
        match node.kind {
            GroupType::Capturing => format!("({})", child),
            GroupType::NonCapturing => format!("(?:{})", child),
            GroupType::Named => {
                format!("(?<{}>{})", node.name.as_deref().unwrap_or(""), child)
            }
            GroupType::LookaheadPositive => format!("(?={})", child),
            GroupType::LookaheadNegative => format!("(?!{})", child),
            GroupType::LookbehindPositive => format!("(?<={})", child),
            GroupType::LookbehindNegative => format!("(?<!{})", child),
            GroupType::Atomic => format!("(?>{})", child),
            GroupType::BranchReset => format!("(?|{})", child),
            GroupType::InlineFlags => {
                let flags = node.flags.as_deref().unwrap_or("");
                if child.is_empty() {
                    format!("(?{})", flags)
                } else {
                    format!("(?{}:{})", flags, child)
                }
            }
        }
    }

    fn visit_quantifier(&mut self, node: &Quantifier) -> String {
        let child = self.emit_quantifier_child(&node.child);
        let suffix = match node.kind {
            QuantifierKind::Greedy => "",
            QuantifierKind::Lazy => "?",
            QuantifierKind::Possessive => "+",
        };
        format!("{}{}{}", child, node.quantifier, suffix)
    }

    fn visit_literal(&mut self, node: &Literal) -> String {
        self.escape_text(&node.value)
    }

    fn visit_char_literal(&mut self, node: &CharLiteral) -> String {
        node.original.clone()
    }

    fn visit_char_type(&mut self, node: &CharType) -> String {
        format!("\\{}", node.value)
    }

    fn visit_unicode(&mut self, node: &Unicode) -> String {
        format!("\\{}", node.code)
    }

    fn visit_unicode_prop(&mut self, node: &UnicodeProp) -> String {
        let (letter, prop) = match node.prop.strip_prefix('^') {
            Some(bare) => ('P', bare),
            None => ('p', node.prop.as_str()),
        };
        if node.has_braces {
            format!("\\{}{{{}}}", letter, prop)
        } else {
            format!("\\{}{}", letter, prop)
        }
    }

    fn visit_posix_class(&mut self, node: &PosixClass) -> String {
        format!("[:{}:]", node.class)
    }

    fn visit_dot(&mut self, _node: &Dot) -> String {
        ".".to_string()
    }

    fn visit_anchor(&mut self, node: &Anchor) -> String {
        node.value.to_string()
    }

    fn visit_assertion(&mut self, node: &Assertion) -> String {
        format!("\\{}", node.value)
    }

    fn visit_keep(&mut self, _node: &Keep) -> String {
        "\\K".to_string()
    }

    fn visit_char_class(&mut self, node: &CharClass) -> String {
        let was_in_class = self.in_class;
        self.in_class = true;
        let body = self.visit(&node.expression);
        self.in_class = was_in_class;
        if node.negated {
            format!("[^{}]", body)
        } else {
            format!("[{}]", body)
        }
    }

    fn visit_range(&mut self, node: &Range) -> String {
        format!("{}-{}", self.visit(&node.start), self.visit(&node.end))
    }

    fn visit_class_operation(&mut self, node: &ClassOperation) -> String {
        let op = match node.kind {
            ClassOperationKind::Intersection => "&&",
            ClassOperationKind::Subtraction => "--",
        };
        format!("{}{}{}", self.visit(&node.left), op, self.visit(&node.right))
    }

    fn visit_control_char(&mut self, node: &ControlChar) -> String {
        format!("\\c{}", node.ch)
    }

    fn visit_backref(&mut self, node: &Backref) -> String {
        let reference = &node.reference;
        if reference.chars().all(|ch| ch.is_ascii_digit()) {
            format!("\\{}", reference)
        } else if reference.starts_with(['-', '+']) {
            format!("\\g{{{}}}", reference)
        } else {
            format!("\\k<{}>", reference)
        }
    }

    fn visit_subroutine(&mut self, node: &Subroutine) -> String {
        match node.syntax.as_str() {
            "&" => format!("(?&{})", node.reference),
            "P>" => format!("(?P>{})", node.reference),
            "g" => format!("\\g<{}>", node.reference),
            _ => format!("(?{})", node.reference),
        }
    }

    fn visit_conditional(&mut self, node: &Conditional) -> String {
        let condition = self.condition_text(&node.condition);
        let yes = self.visit(&node.yes);
        if *node.no == Node::empty() {
            format!("(?({}){})", condition, yes)
        } else {
            format!("(?({}){}|{})", condition, yes, self.visit(&node.no))
        }
    }

    fn visit_define(&mut self, node: &Define) -> String {
        format!("(?(DEFINE){})", self.visit(&node.content))
    }

    fn visit_comment(&mut self, node: &Comment) -> String {
        format!("(?#{})", node.comment)
    }

    fn visit_pcre_verb(&mut self, node: &PcreVerb) -> String {
        format!("(*{})", node.verb)
    }

    fn visit_limit_match(&mut self, node: &LimitMatch) -> String {
        format!("(*LIMIT_MATCH={})", node.limit)
    }

    fn visit_callout(&mut self, node: &Callout) -> String {
        match (&node.number, &node.name) {
            (Some(number), _) => format!("(?C{})", number),
            (_, Some(name)) => format!("(?C\"{}\")", name),
            _ => "(?C)".to_string(),
        }
    }

    fn visit_script_run(&mut self, node: &ScriptRun) -> String {
        format!("(*script_run:{})", node.script)
    }

    fn visit_version_condition(&mut self, node: &VersionCondition) -> String {
        format!("VERSION{}{}", node.operator, node.version)
    }
}

/// Emit canonical source for a subtree with a fresh emitter.
pub fn stringify(node: &Node) -> String {
    PcreEmitter::new().emit(node)
}
