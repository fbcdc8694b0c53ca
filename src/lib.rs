//! RegexLint Core Library
//!
//! A PCRE-dialect pattern parser and the static analyses that run on its
//! AST: a ReDoS (catastrophic backtracking) profiler, a complexity scorer,
//! and the character-set analysis supporting both. Matching itself is out
//! of scope; this crate answers "what could this pattern cost?", not
//! "does it match?".
//!
//! # Modules
//!
//! - `core`: AST nodes, parse errors with hints, and the parser
//! - `analysis`: the visitor seam, charset/length inference, profiler and
//!   scorer
//! - `emitters`: canonical re-emission of subtrees as PCRE source
//!
//! # Example
//!
//! ```
//! use relint_core::{parse, profile, score, Severity};
//!
//! let regex = parse("/(a+)+$/").unwrap();
//! let result = profile(&regex);
//! assert_eq!(result.severity, Severity::Critical);
//! assert!(score(&regex) > 30);
//! ```

pub mod analysis;
pub mod core;
pub mod emitters;
pub mod simply;

pub use crate::analysis::redos::{
    Confidence, Finding, ProfileResult, Profiler, ProfilerConfig, Severity,
};
pub use crate::analysis::visitor::{accept, accept_regex, Analyze};
pub use crate::core::errors::{ParseError, ParseErrorKind};
pub use crate::core::nodes::{Node, Regex};
pub use crate::core::parser::{parse, parse_bare, SourceMode};
pub use crate::emitters::pcre::{stringify, PcreEmitter};

/// Profile a parsed pattern for ReDoS risk.
pub fn profile(regex: &Regex) -> ProfileResult {
    Profiler::new().profile(regex)
}

/// Score a parsed pattern's complexity.
pub fn score(regex: &Regex) -> u64 {
    crate::analysis::complexity::score(regex)
}
