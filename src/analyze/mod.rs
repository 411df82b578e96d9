// src/analyze/mod.rs

//! Stateless analyzers: integration-pattern recognition and embedded-SQL
//! structural analysis. Both are pure text/IR-in, struct-out functions with
//! no I/O, so the orchestrator can run them concurrently per unit.

pub mod pattern;
pub mod sql;

pub use pattern::{analyze as analyze_pattern, Complexity, FlowAnalysis, PatternMatch, PatternTag};
pub use sql::{analyze as analyze_sql, SqlAnalysis, SqlOperation};
