//! Analysis-level tests: profiler severities, scorer values, character-set
//! soundness, and the interplay between them.

use relint_core::analysis::chars::{first_chars, last_chars};
use relint_core::analysis::complexity;
use relint_core::{parse, profile, Profiler, Severity};

fn severity_of(source: &str) -> Severity {
    profile(&parse(source).unwrap()).severity
}

fn score_of(source: &str) -> u64 {
    complexity::score(&parse(source).unwrap())
}

// ============================================================================
// SEED SCENARIOS
// ============================================================================

mod seeds {
    use super::*;

    #[test]
    fn plain_literal() {
        assert_eq!(severity_of("/abc/"), Severity::Safe);
        assert_eq!(score_of("/abc/"), 3);
    }

    #[test]
    fn lone_unbounded_quantifier() {
        let result = profile(&parse("/a*/").unwrap());
        assert_eq!(result.severity, Severity::Medium);
        assert_eq!(result.trigger.as_deref(), Some("quantifier *"));
        assert_eq!(score_of("/a*/"), 11);
    }

    #[test]
    fn nested_unbounded_quantifiers() {
        let result = profile(&parse("/(a+)+$/").unwrap());
        assert_eq!(result.severity, Severity::Critical);
        assert_eq!(result.trigger.as_deref(), Some("quantifier +"));
        assert!(result
            .recommendations
            .iter()
            .any(|rec| rec.contains("nested unbounded quantifiers")));
    }

    #[test]
    fn atomic_target_quantifier() {
        assert!(severity_of("/(?>a+)+/") <= Severity::Low);
    }

    #[test]
    fn overlapping_alternation_under_star() {
        let result = profile(&parse("/(a|a)*/").unwrap());
        assert_eq!(result.severity, Severity::Critical);
        assert!(result
            .recommendations
            .iter()
            .any(|rec| rec.contains("overlapping alternation")));
    }

    #[test]
    fn boundary_separated_star() {
        assert!(severity_of("/a*b/") <= Severity::Low);
    }

    #[test]
    fn classic_backref_trap() {
        assert!(severity_of("/^(\\w+)\\s+\\1$/") >= Severity::Critical);
    }

    #[test]
    fn large_bounded_counter() {
        let result = profile(&parse("/a{1,10000}/").unwrap());
        assert_eq!(result.severity, Severity::Low);
        assert!(result
            .recommendations
            .iter()
            .any(|rec| rec.contains("large bounded quantifier")));
    }
}

// ============================================================================
// PROFILER BOUNDARIES
// ============================================================================

mod profiler {
    use super::*;

    #[test]
    fn exact_count_is_never_unbounded() {
        assert_eq!(severity_of("/(a{3,3})+$/x"), severity_of("/(a{3})+$/"));
        let result = profile(&parse("/(a{2,2}){3,3}/").unwrap());
        assert!(result
            .findings
            .iter()
            .all(|f| !f.message.contains("unbounded")));
    }

    #[test]
    fn overlap_detection_sees_dot_branches() {
        // A dot-headed branch overlaps every other branch.
        assert_eq!(severity_of("/(.|a)*/"), Severity::Critical);
    }

    #[test]
    fn overlap_detection_sees_empty_branches() {
        assert_eq!(severity_of("/(a|)*/"), Severity::Critical);
    }

    #[test]
    fn disjoint_branches_under_star_stay_noncritical() {
        assert!(severity_of("/(a|b)*/") < Severity::Critical);
    }

    #[test]
    fn unknown_branch_forces_overlap() {
        assert_eq!(severity_of("/(\\1|a)*/"), Severity::Critical);
    }

    #[test]
    fn alternation_outside_quantifier_is_not_overlap_checked() {
        assert_eq!(severity_of("/a|a/"), Severity::Safe);
    }

    #[test]
    fn lookaround_contents_are_still_analyzed() {
        assert_eq!(severity_of("/(?=(a+)+)b/"), Severity::Critical);
    }

    #[test]
    fn possessive_nesting_is_shielded() {
        assert!(severity_of("/(a+)*+/") <= Severity::Low);
    }

    #[test]
    fn commit_verb_shields_preceding_quantifier() {
        assert!(severity_of("/a*(*COMMIT)/") <= Severity::Low);
    }

    #[test]
    fn mark_verb_does_not_shield() {
        assert_eq!(severity_of("/(a(*MARK:m))*/"), Severity::Medium);
    }

    #[test]
    fn deep_nesting_is_still_critical() {
        assert_eq!(severity_of("/(((a*)*)*)$/"), Severity::Critical);
    }

    #[test]
    fn subroutine_call_reports_medium() {
        let result = profile(&parse("/(?(DEFINE)(?<w>\\w))(?&w)/").unwrap());
        assert_eq!(result.severity, Severity::Medium);
        assert_eq!(result.trigger.as_deref(), Some("subroutine"));
    }

    #[test]
    fn define_contents_are_analyzed() {
        assert_eq!(severity_of("/(?(DEFINE)(?<w>(a+)+))/"), Severity::Critical);
    }

    #[test]
    fn conditional_arms_are_analyzed() {
        assert_eq!(severity_of("/(?(1)(a+)+|b)/"), Severity::Critical);
    }

    #[test]
    fn fixed_length_backref_is_not_a_loop() {
        assert!(severity_of("/(ab)c*\\1/") < Severity::Critical);
    }

    #[test]
    fn vulnerable_pattern_quotes_the_trigger() {
        // The nested-unbounded finding is reported at the inner quantifier.
        let result = profile(&parse("/x(a+)+y/").unwrap());
        assert_eq!(result.vulnerable_pattern.as_deref(), Some("a+"));
    }

    #[test]
    fn recommendations_are_deduplicated() {
        let result = profile(&parse("/a*x|b*x/").unwrap());
        let mut seen = result.recommendations.clone();
        seen.dedup();
        assert_eq!(seen, result.recommendations);
    }

    #[test]
    fn severity_is_monotonic_under_safer_substitution() {
        // Replacing the inner a+ with the strictly safer literal drops the
        // severity; it can never raise it.
        let worse = severity_of("/(a+)+$/");
        let better = severity_of("/(a)+$/");
        assert!(better <= worse);
    }

    #[test]
    fn repeated_profiling_is_stable() {
        let regex = parse("/^(\\w+)\\s+\\1$|(x|y.)*z{2000}/").unwrap();
        assert_eq!(
            Profiler::new().profile(&regex),
            Profiler::new().profile(&regex)
        );
    }
}

// ============================================================================
// REALISTIC PATTERNS
// ============================================================================

mod realistic {
    use super::*;

    #[test]
    fn email_validator_stays_low() {
        // Every repetition is fenced by a disjoint separator character.
        let severity = severity_of("/^[a-z0-9._%+-]+@[a-z0-9.-]+\\.[a-z]{2,}$/i");
        assert!(severity <= Severity::Low);
    }

    #[test]
    fn greedy_log_capture_is_medium() {
        assert_eq!(severity_of("/^(\\d{4})-(\\d{2}) (.*)$/"), Severity::Medium);
    }

    #[test]
    fn classic_star_of_dot_star_is_critical() {
        assert_eq!(severity_of("/^(.*)*$/"), Severity::Critical);
    }

    #[test]
    fn csv_field_with_overlap_is_critical() {
        // The quoted-field branch and the bare branch both admit '"...'
        // lookalikes; dot makes the overlap undecidable, hence assumed.
        assert_eq!(severity_of("/(.+|\"[^\"]*\")*,/"), Severity::Critical);
    }

    #[test]
    fn hex_color_is_safe() {
        assert_eq!(severity_of("/^#[0-9a-fA-F]{6}$/"), Severity::Safe);
    }

    #[test]
    fn iso_date_is_safe() {
        assert_eq!(severity_of("/^\\d{4}-\\d{2}-\\d{2}$/"), Severity::Safe);
    }
}

// ============================================================================
// SCORER
// ============================================================================

mod scorer {
    use super::*;

    #[test]
    fn scores_are_nonnegative_and_pure() {
        for source in [
            "//",
            "/abc/",
            "/(a+)+/",
            "/(?(1)x|y)/",
            "/[a-z&&b]/",
            "/(?#c)/",
        ] {
            let regex = parse(source).unwrap();
            assert_eq!(complexity::score(&regex), complexity::score(&regex));
        }
    }

    #[test]
    fn unbounded_dominates_bounded() {
        assert!(score_of("/a*/") > score_of("/a{100}/"));
    }

    #[test]
    fn nesting_grows_the_score() {
        assert!(score_of("/((a+)+)+/") > score_of("/(a+)+/"));
        assert!(score_of("/(a+)+/") > score_of("/a+a+/"));
    }

    #[test]
    fn lookarounds_cost_more_than_plain_groups() {
        assert!(score_of("/(?=a)/") > score_of("/(?:a)/"));
    }

    #[test]
    fn score_tracks_pattern_size() {
        assert!(score_of("/abcdef/") > score_of("/abc/"));
    }
}

// ============================================================================
// CHARACTER SETS
// ============================================================================

mod charsets {
    use super::*;

    fn firsts(source: &str) -> relint_core::analysis::chars::CharSet {
        first_chars(&parse(source).unwrap().pattern)
    }

    #[test]
    fn soundness_on_shared_first_char() {
        // "ab" and "ac" share 'a'; a false "disjoint" here would be a bug.
        assert!(firsts("/ab/").intersects(&firsts("/ac/")));
    }

    #[test]
    fn disjoint_literals() {
        assert!(!firsts("/ab/").intersects(&firsts("/cd/")));
    }

    #[test]
    fn last_chars_of_sequences() {
        let last = last_chars(&parse("/foo(bar|baz)/").unwrap().pattern);
        assert!(last.intersects(&firsts("/r/")));
        assert!(last.intersects(&firsts("/z/")));
        assert!(!last.intersects(&firsts("/o/")));
    }

    #[test]
    fn quantified_head_is_undecidable() {
        assert!(firsts("/a*b/").is_unknown());
    }

    #[test]
    fn class_with_unknown_member_is_unknown() {
        assert!(firsts("/[\\p{L}a]/").is_unknown());
    }

    #[test]
    fn conditional_is_undecidable() {
        assert!(firsts("/(?(1)a|b)/").is_unknown());
    }
}
