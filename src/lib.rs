//! Ruleset Governance - validation engine for declarative governance rulesets
//!
//! Architecture: Clean Architecture - Library interface serves as the application layer
//! - Pure domain values separated from the evaluator binding
//! - The rule evaluator is an external collaborator behind a trait boundary
//! - The engine API validates rulesets, extracts rules and evaluates documents

pub mod config;
pub mod domain;
pub mod engine;
pub mod evaluator;
pub mod extractor;
pub mod report;
pub mod scanner;

// Re-export main types for convenient access
pub use domain::ruleset::{
    ParseContentTypeError, Rule, Ruleset, RulesetContent, RulesetContentType,
};
pub use domain::violations::{
    GovernanceError, GovernanceResult, ParseSeverityError, RuleSeverity, RuleViolation,
    ValidationReport, ValidationSummary,
};

pub use config::{ConfigBuilder, EngineConfig};

pub use engine::{GovernanceEngine, ValidationEngine};

pub use evaluator::{CommandEvaluator, EvaluatorAdapter, EvaluatorError, RuleEvaluator};

pub use extractor::YamlRuleExtractor;

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

pub use scanner::{ScanOptions, TargetScanner};

use std::path::Path;

/// Create an engine bound to the evaluator described by the configuration
pub fn create_engine(config: &EngineConfig) -> GovernanceEngine<CommandEvaluator> {
    GovernanceEngine::new(config.command_evaluator())
}

/// Load a YAML ruleset from disk, using the file stem as id and name
pub fn load_ruleset<P: AsRef<Path>>(path: P) -> GovernanceResult<Ruleset> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ruleset".to_string());

    Ok(Ruleset::new(stem.clone(), stem, RulesetContent::yaml(bytes)))
}
