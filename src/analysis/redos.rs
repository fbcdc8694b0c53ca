//! ReDoS profiler: static detection of catastrophic-backtracking risks.
//!
//! The profiler walks the AST with an explicit context record carrying the
//! unbounded- and total-quantifier nesting depths, whether the current
//! subtree is shielded by atomicity, and the immediate siblings of the node
//! under analysis. Severities flow back up the recursion; findings
//! accumulate on the profiler and are aggregated into a [`ProfileResult`].
//!
//! The rules, in brief:
//!   - atomic groups, possessive quantifiers and trailing backtracking
//!     verbs (`(*COMMIT)`, `(*PRUNE)`, `(*SKIP)`) shield their subtree and
//!     cap its severity at LOW
//!   - an unbounded quantifier is MEDIUM on its own, LOW when a provably
//!     disjoint neighbor removes the backtracking pivot, CRITICAL when
//!     nested inside another unbounded quantifier
//!   - alternations with overlapping branches inside an unbounded
//!     quantifier are CRITICAL
//!   - a backreference together with a variable-length capture under
//!     unbounded repetition is CRITICAL
//!   - large bounded repetitions and nested bounded repetitions are LOW
//!
//! The profiler is total: it never fails, and unanalyzable constructs
//! degrade toward the conservative side.

use serde::{Deserialize, Serialize};

use crate::analysis::chars::{first_chars, last_chars, CharSet};
use crate::analysis::length::{contains_backref, has_variable_length_capture};
use crate::core::nodes::*;
use crate::emitters::pcre::stringify;

/// Severity scale, ordered. `UNKNOWN` sits between LOW and MEDIUM: worse
/// than a known-minor issue, better than a known-moderate one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Safe,
    Low,
    Unknown,
    Medium,
    High,
    Critical,
}

/// How certain the profiler is about a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// One reported vulnerability or observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
    /// Canonical source of the offending subtree
    pub pattern: Option<String>,
    /// Short descriptor: "quantifier *", "alternation", "subroutine", ...
    pub trigger: String,
    /// Suggested rewrite, when one exists
    pub suggestion: Option<String>,
    pub confidence: Confidence,
    #[serde(rename = "falsePositiveRisk")]
    pub false_positive_risk: Option<String>,
}

/// Aggregated result of a profiling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileResult {
    pub severity: Severity,
    /// Deduplicated messages (with rewrites) in insertion order
    pub recommendations: Vec<String>,
    #[serde(rename = "vulnerablePattern")]
    pub vulnerable_pattern: Option<String>,
    pub trigger: Option<String>,
    pub confidence: Option<Confidence>,
    #[serde(rename = "falsePositiveRisk")]
    pub false_positive_risk: Option<String>,
    pub findings: Vec<Finding>,
}

/// Tunables. The findings vector is capped so pathological inputs cannot
/// grow it without bound; the cap is announced with a summary finding.
#[derive(Debug, Clone)]
pub struct ProfilerConfig {
    pub max_findings: usize,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self { max_findings: 64 }
    }
}

/// Per-traversal state, threaded explicitly through the recursion so the
/// profiler is re-entrant and resets are visible at the call sites.
#[derive(Clone, Copy, Default)]
struct Ctx<'a> {
    unbounded_depth: u32,
    total_depth: u32,
    in_atomic: bool,
    prev: Option<&'a Node>,
    next: Option<&'a Node>,
}

/// The profiler itself. One instance per analyzed tree.
pub struct Profiler {
    config: ProfilerConfig,
    findings: Vec<Finding>,
    backref_loop_detected: bool,
    pattern_has_backref_loop: bool,
    findings_capped: bool,
}

impl Profiler {
    pub fn new() -> Self {
        Self::with_config(ProfilerConfig::default())
    }

    pub fn with_config(config: ProfilerConfig) -> Self {
        Profiler {
            config,
            findings: Vec::new(),
            backref_loop_detected: false,
            pattern_has_backref_loop: false,
            findings_capped: false,
        }
    }

    /// Profile a parsed pattern.
    pub fn profile(mut self, regex: &Regex) -> ProfileResult {
        self.pattern_has_backref_loop =
            contains_backref(&regex.pattern) && has_variable_length_capture(&regex.pattern);
        self.scan(&regex.pattern, Ctx::default());
        self.into_result()
    }

    fn push_finding(&mut self, finding: Finding) {
        if self.findings.len() < self.config.max_findings {
            self.findings.push(finding);
            return;
        }
        if !self.findings_capped {
            self.findings_capped = true;
            self.findings.push(Finding {
                severity: Severity::Unknown,
                message: format!(
                    "finding limit of {} reached; further findings suppressed",
                    self.config.max_findings
                ),
                pattern: None,
                trigger: "finding limit".to_string(),
                suggestion: None,
                confidence: Confidence::High,
                false_positive_risk: None,
            });
        }
    }

    /// Recursive severity scan.
    fn scan(&mut self, node: &Node, ctx: Ctx<'_>) -> Severity {
        match node {
            Node::Regex(regex) => self.scan(&regex.pattern, ctx),

            Node::Sequence(seq) => self.scan_sequence(seq, ctx),
            Node::Alternation(alt) => self.scan_alternation(alt, ctx),
            Node::Quantifier(quant) => self.scan_quantifier(quant, ctx),
            Node::Group(group) => self.scan_group(group, ctx),

            Node::Subroutine(sub) => {
                self.push_finding(Finding {
                    severity: Severity::Medium,
                    message: "recursion or subroutine call; verify the called pattern is bounded"
                        .to_string(),
                    pattern: Some(stringify(node)),
                    trigger: "subroutine".to_string(),
                    suggestion: Some(format!(
                        "ensure the pattern called by '{}' cannot recurse without consuming input",
                        sub.reference
                    )),
                    confidence: Confidence::Medium,
                    false_positive_risk: Some(
                        "bounded recursion over fixed-length subpatterns is harmless".to_string(),
                    ),
                });
                Severity::Medium
            }

            Node::Define(def) => self.scan(
                &def.content,
                Ctx {
                    prev: None,
                    next: None,
                    ..ctx
                },
            ),

            Node::Conditional(cond) => {
                let inner = Ctx {
                    prev: None,
                    next: None,
                    ..ctx
                };
                let condition = self.scan(&cond.condition, inner);
                let yes = self.scan(&cond.yes, inner);
                let no = self.scan(&cond.no, inner);
                condition.max(yes).max(no)
            }

            // Leaves cannot backtrack by themselves.
            _ => Severity::Safe,
        }
    }

    fn scan_sequence(&mut self, seq: &Sequence, ctx: Ctx<'_>) -> Severity {
        // A trailing backtracking verb shields the whole run before it.
        let shielded = ctx.in_atomic || ends_with_control_verb_node(seq.children.last());

        let mut worst = Severity::Safe;
        for (i, child) in seq.children.iter().enumerate() {
            let prev = if i == 0 {
                ctx.prev
            } else {
                seq.children.get(i - 1)
            };
            let next = match seq.children.get(i + 1) {
                Some(next) => Some(next),
                None => ctx.next,
            };
            let child_ctx = Ctx {
                in_atomic: shielded,
                prev,
                next,
                ..ctx
            };
            worst = worst.max(self.scan(child, child_ctx));
        }
        worst
    }

    fn scan_alternation(&mut self, alt: &Alternation, ctx: Ctx<'_>) -> Severity {
        if ctx.unbounded_depth > 0 && branches_overlap(&alt.alternatives) {
            self.push_finding(Finding {
                severity: Severity::Critical,
                message: "overlapping alternation branches inside a quantifier".to_string(),
                pattern: Some(stringify(&Node::Alternation(alt.clone()))),
                trigger: "alternation".to_string(),
                suggestion: Some(
                    "remove the overlap between branches or factor the shared prefix out of the \
                     alternation"
                        .to_string(),
                ),
                confidence: Confidence::High,
                false_positive_risk: None,
            });
            return Severity::Critical;
        }

        alt.alternatives
            .iter()
            .map(|branch| self.scan(branch, ctx))
            .max()
            .unwrap_or(Severity::Safe)
    }

    fn scan_group(&mut self, group: &Group, ctx: Ctx<'_>) -> Severity {
        match group.kind {
            GroupType::Atomic => {
                let child_ctx = Ctx {
                    in_atomic: true,
                    prev: None,
                    next: None,
                    ..ctx
                };
                self.scan(&group.child, child_ctx).min(Severity::Low)
            }
            GroupType::LookaheadPositive
            | GroupType::LookaheadNegative
            | GroupType::LookbehindPositive
            | GroupType::LookbehindNegative => {
                // Lookarounds match in their own window; neighbors do not
                // carry over.
                let child_ctx = Ctx {
                    prev: None,
                    next: None,
                    ..ctx
                };
                self.scan(&group.child, child_ctx)
            }
            _ => self.scan(&group.child, ctx),
        }
    }

    fn scan_quantifier(&mut self, quant: &Quantifier, ctx: Ctx<'_>) -> Severity {
        let child = &quant.child;
        let is_possessive = quant.kind == QuantifierKind::Possessive;
        let verb_shield = ends_with_control_verb(child);

        let boundary_separated =
            self.boundary_separated_prev(ctx, child) || self.boundary_separated_next(ctx, child);

        // Possessive repetition and a trailing control verb are atomic for
        // backtracking purposes.
        if ctx.in_atomic || is_possessive || verb_shield {
            let child_ctx = Ctx {
                in_atomic: true,
                prev: None,
                next: None,
                ..ctx
            };
            return self.scan(child, child_ctx).min(Severity::Low);
        }

        let is_unbounded = quant.is_unbounded();
        let is_target_atomic =
            matches!(child.as_ref(), Node::Group(group) if group.kind == GroupType::Atomic);
        let enters_unbounded = is_unbounded && !is_target_atomic;

        let total_depth = ctx.total_depth + 1;
        let mut unbounded_depth = ctx.unbounded_depth;
        let trigger = format!("quantifier {}", quant.quantifier);
        let mut local = Severity::Safe;

        if enters_unbounded {
            unbounded_depth += 1;

            if self.pattern_has_backref_loop && !self.backref_loop_detected {
                self.backref_loop_detected = true;
                self.push_finding(Finding {
                    severity: Severity::Critical,
                    message: "backreference to a variable-length capture under unbounded \
                              repetition can force exponential backtracking"
                        .to_string(),
                    pattern: Some(stringify(&Node::Quantifier(quant.clone()))),
                    trigger: trigger.clone(),
                    suggestion: Some(
                        "bound the referenced capture to a fixed length, or make the repetition \
                         possessive"
                            .to_string(),
                    ),
                    confidence: Confidence::High,
                    false_positive_risk: None,
                });
                local = Severity::Critical;
            }

            if unbounded_depth > 1 {
                if boundary_separated {
                    local = local.max(Severity::Low);
                } else {
                    self.push_finding(Finding {
                        severity: Severity::Critical,
                        message: "nested unbounded quantifiers".to_string(),
                        pattern: Some(stringify(&Node::Quantifier(quant.clone()))),
                        trigger: trigger.clone(),
                        suggestion: Some(
                            "make the inner repetition atomic ((?>...)) or possessive so the \
                             engine cannot redistribute matches between the levels"
                                .to_string(),
                        ),
                        confidence: Confidence::High,
                        false_positive_risk: None,
                    });
                    local = Severity::Critical;
                }
            } else if boundary_separated {
                self.push_finding(Finding {
                    severity: Severity::Low,
                    message: "unbounded quantifier isolated by disjoint neighboring characters"
                        .to_string(),
                    pattern: Some(stringify(&Node::Quantifier(quant.clone()))),
                    trigger: trigger.clone(),
                    suggestion: None,
                    confidence: Confidence::Medium,
                    false_positive_risk: Some(
                        "the disjoint boundary removes the usual backtracking pivot".to_string(),
                    ),
                });
                local = local.max(Severity::Low);
            } else {
                self.push_finding(Finding {
                    severity: Severity::Medium,
                    message: "unbounded quantifier; may backtrack on mismatch".to_string(),
                    pattern: Some(stringify(&Node::Quantifier(quant.clone()))),
                    trigger: trigger.clone(),
                    suggestion: Some(
                        "consider a possessive quantifier or an atomic group if backtracking \
                         into this repetition is never wanted"
                            .to_string(),
                    ),
                    confidence: Confidence::Medium,
                    false_positive_risk: Some(
                        "a single unbounded quantifier backtracks linearly, not exponentially"
                            .to_string(),
                    ),
                });
                local = local.max(Severity::Medium);
            }
        } else {
            let (_, max) = quant.bounds();
            if max.is_some_and(|m| m > 1000) {
                self.push_finding(Finding {
                    severity: Severity::Low,
                    message: "large bounded quantifier".to_string(),
                    pattern: Some(stringify(&Node::Quantifier(quant.clone()))),
                    trigger: trigger.clone(),
                    suggestion: Some(
                        "check whether the repetition ceiling can be lowered".to_string(),
                    ),
                    confidence: Confidence::Low,
                    false_positive_risk: Some(
                        "bounded repetition is at worst polynomial".to_string(),
                    ),
                });
                local = Severity::Low;
            } else if total_depth > 1 && unbounded_depth == 0 {
                self.push_finding(Finding {
                    severity: Severity::Low,
                    message: "nested bounded quantifiers".to_string(),
                    pattern: Some(stringify(&Node::Quantifier(quant.clone()))),
                    trigger: trigger.clone(),
                    suggestion: None,
                    confidence: Confidence::Low,
                    false_positive_risk: Some(
                        "the repetition count is finite; cost grows with the product of the \
                         bounds"
                            .to_string(),
                    ),
                });
                local = Severity::Low;
            }
        }

        let child_ctx = Ctx {
            unbounded_depth,
            total_depth,
            in_atomic: false,
            prev: None,
            next: None,
        };
        let child_severity = self.scan(child, child_ctx);
        let mut result = local.max(child_severity);

        if enters_unbounded && !boundary_separated && child_severity == Severity::High {
            self.push_finding(Finding {
                severity: Severity::Critical,
                message: "star height greater than one".to_string(),
                pattern: Some(stringify(&Node::Quantifier(quant.clone()))),
                trigger,
                suggestion: Some(
                    "flatten the nested repetitions or make the inner ones atomic".to_string(),
                ),
                confidence: Confidence::High,
                false_positive_risk: None,
            });
            result = Severity::Critical;
        }

        result
    }

    fn boundary_separated_prev(&self, ctx: Ctx<'_>, child: &Node) -> bool {
        ctx.prev.is_some_and(|prev| {
            let last = last_chars(prev);
            let first = first_chars(child);
            last.is_known() && first.is_known() && !last.intersects(&first)
        })
    }

    fn boundary_separated_next(&self, ctx: Ctx<'_>, child: &Node) -> bool {
        ctx.next.is_some_and(|next| {
            let last = last_chars(child);
            let first = first_chars(next);
            last.is_known() && first.is_known() && !last.intersects(&first)
        })
    }

    /// Aggregate findings into the result record.
    fn into_result(self) -> ProfileResult {
        let mut severity = self
            .findings
            .iter()
            .map(|finding| finding.severity)
            .max()
            .unwrap_or(Severity::Safe);

        if self.backref_loop_detected {
            severity = severity.max(Severity::Critical);
        }

        let top = self
            .findings
            .iter()
            .find(|finding| finding.severity == severity);

        let mut recommendations: Vec<String> = Vec::new();
        for finding in &self.findings {
            let recommendation = match &finding.suggestion {
                Some(suggestion) => format!("{} ({})", finding.message, suggestion),
                None => finding.message.clone(),
            };
            if !recommendations.contains(&recommendation) {
                recommendations.push(recommendation);
            }
        }

        let vulnerable_pattern = top.and_then(|finding| finding.pattern.clone());
        let trigger = top.map(|finding| finding.trigger.clone());
        let confidence = top.map(|finding| finding.confidence);
        let false_positive_risk = top.and_then(|finding| finding.false_positive_risk.clone());

        ProfileResult {
            severity,
            recommendations,
            vulnerable_pattern,
            trigger,
            confidence,
            false_positive_risk,
            findings: self.findings,
        }
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Branch overlap: any Unknown branch, any zero-width branch, or any pair
/// of intersecting known first-character sets. Quadratic in the branch
/// count, which the caller accepts for realistic patterns.
fn branches_overlap(alternatives: &[Node]) -> bool {
    if alternatives.len() < 2 {
        return false;
    }
    let sets: Vec<CharSet> = alternatives.iter().map(first_chars).collect();
    // An empty alternative matches everywhere, so it overlaps everything.
    if sets
        .iter()
        .any(|set| set.is_unknown() || set.is_known_empty())
    {
        return true;
    }
    for (i, a) in sets.iter().enumerate() {
        for b in &sets[i + 1..] {
            if a.intersects(b) {
                return true;
            }
        }
    }
    false
}

/// True when the subtree's trailing element is a backtracking-control verb.
fn ends_with_control_verb(node: &Node) -> bool {
    match node {
        Node::PcreVerb(verb) => verb.is_backtracking_control(),
        Node::Sequence(seq) => ends_with_control_verb_node(seq.children.last()),
        Node::Group(group) => ends_with_control_verb(&group.child),
        _ => false,
    }
}

fn ends_with_control_verb_node(node: Option<&Node>) -> bool {
    node.is_some_and(ends_with_control_verb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::parse;

    fn profile_of(source: &str) -> ProfileResult {
        Profiler::new().profile(&parse(source).unwrap())
    }

    #[test]
    fn plain_literal_is_safe() {
        let result = profile_of("/abc/");
        assert_eq!(result.severity, Severity::Safe);
        assert!(result.findings.is_empty());
        assert!(result.trigger.is_none());
    }

    #[test]
    fn single_unbounded_quantifier_is_medium() {
        let result = profile_of("/a*/");
        assert_eq!(result.severity, Severity::Medium);
        assert_eq!(result.trigger.as_deref(), Some("quantifier *"));
    }

    #[test]
    fn nested_unbounded_quantifiers_are_critical() {
        let result = profile_of("/(a+)+$/");
        assert_eq!(result.severity, Severity::Critical);
        assert!(result
            .findings
            .iter()
            .any(|f| f.message.contains("nested unbounded quantifiers")));
        assert!(!result
            .findings
            .iter()
            .any(|f| f.message.contains("backreference")));
    }

    #[test]
    fn atomic_group_caps_severity() {
        let result = profile_of("/(?>a+)+/");
        assert!(result.severity <= Severity::Low);
    }

    #[test]
    fn overlapping_alternation_in_quantifier_is_critical() {
        let result = profile_of("/(a|a)*/");
        assert_eq!(result.severity, Severity::Critical);
        assert!(result
            .findings
            .iter()
            .any(|f| f.message.contains("overlapping alternation")));
    }

    #[test]
    fn boundary_separated_quantifier_is_low() {
        let result = profile_of("/a*b/");
        assert!(result.severity <= Severity::Low);
    }

    #[test]
    fn backref_loop_is_critical() {
        let result = profile_of("/^(\\w+)\\s+\\1$/");
        assert!(result.severity >= Severity::Critical);
        assert!(result
            .findings
            .iter()
            .any(|f| f.message.contains("backreference")));
    }

    #[test]
    fn large_bounded_quantifier_is_low() {
        let result = profile_of("/a{1,10000}/");
        assert_eq!(result.severity, Severity::Low);
        assert!(result
            .findings
            .iter()
            .any(|f| f.message.contains("large bounded quantifier")));
    }

    #[test]
    fn exact_repetition_is_bounded() {
        let result = profile_of("/(a{3,3})*(b{4,4})/");
        // {n,n} never counts as unbounded nesting.
        assert!(result
            .findings
            .iter()
            .all(|f| !f.message.contains("nested unbounded")));
    }

    #[test]
    fn possessive_quantifier_is_shielded() {
        let result = profile_of("/(a|a)*+/");
        assert!(result.severity <= Severity::Low);
    }

    #[test]
    fn trailing_commit_shields_quantifier() {
        let result = profile_of("/(a(*COMMIT))*/");
        assert!(result.severity <= Severity::Low);
    }

    #[test]
    fn subroutine_is_medium() {
        let result = profile_of("/(?&word)(?(DEFINE)(?<word>\\w))/");
        assert_eq!(result.severity, Severity::Medium);
        assert_eq!(result.trigger.as_deref(), Some("subroutine"));
    }

    #[test]
    fn nested_bounded_quantifiers_are_low() {
        let result = profile_of("/(a{2}){3}/");
        assert_eq!(result.severity, Severity::Low);
        assert!(result
            .findings
            .iter()
            .any(|f| f.message.contains("nested bounded")));
    }

    #[test]
    fn profiling_is_deterministic() {
        let regex = parse("/(a+)+|(b|b)*/").unwrap();
        let first = Profiler::new().profile(&regex);
        let second = Profiler::new().profile(&regex);
        assert_eq!(first, second);
    }

    #[test]
    fn findings_are_capped_with_summary() {
        let branches: Vec<String> = (0..40).map(|_| "x*".to_string()).collect();
        let source = format!("/{}/", branches.join("y"));
        let result = Profiler::with_config(ProfilerConfig { max_findings: 5 })
            .profile(&parse(&source).unwrap());
        assert_eq!(result.findings.len(), 6);
        assert!(result
            .findings
            .last()
            .unwrap()
            .message
            .contains("finding limit"));
    }

    #[test]
    fn severity_order_is_strict() {
        assert!(Severity::Safe < Severity::Low);
        assert!(Severity::Low < Severity::Unknown);
        assert!(Severity::Unknown < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn severity_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"CRITICAL\""
        );
        assert_eq!(serde_json::to_string(&Severity::Safe).unwrap(), "\"SAFE\"");
    }

    #[test]
    fn result_serializes_normative_field_names() {
        let result = profile_of("/(a+)+/");
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("vulnerablePattern").is_some());
        assert!(json.get("falsePositiveRisk").is_some());
        assert!(json.get("recommendations").is_some());
        assert_eq!(json["severity"], "CRITICAL");
    }
}
