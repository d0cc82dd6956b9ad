//! Table-generation back end for a rule-based lexer generator.
//!
//! Given a prioritized list of named token rules, each a regular
//! expression, the crate compiles every rule into a Thompson NFA, unions
//! them under one start state, determinizes and minimizes the result, and
//! compacts the minimal DFA into three tables that drive a table-based
//! scanner: a character classifier, a `(state, class)` transition matrix,
//! and a token-type table naming each accepting state. When several rules
//! match the same input, the rule with the smallest priority value wins;
//! ties go to the rule listed first.

pub mod config;
pub mod core;
pub mod errors;

pub use crate::config::{Config, Rule};
pub use crate::core::tables::Tables;
pub use crate::core::{CompileArtifacts, CompileOptions, compile, compile_artifacts, compile_with};
pub use crate::errors::CompileError;
