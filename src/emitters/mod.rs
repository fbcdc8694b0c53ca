//! Emitters re-create source text from AST subtrees.

pub mod pcre;
