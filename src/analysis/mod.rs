//! Static analyses over the AST: the visitor seam, character-set and
//! length inference, the ReDoS profiler and the complexity scorer.

pub mod chars;
pub mod complexity;
pub mod length;
pub mod redos;
pub mod visitor;
