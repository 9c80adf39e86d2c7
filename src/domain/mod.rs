//! Domain layer for ruleset governance
//!
//! CDD Principle: Domain Model - Pure values for rulesets, rules and violations
//! - Contains the content model and the error taxonomy shared by every operation
//! - Independent of the evaluator binding, the file system and the CLI

pub mod ruleset;
pub mod violations;

// Re-export main domain types for convenience
pub use ruleset::*;
pub use violations::*;
