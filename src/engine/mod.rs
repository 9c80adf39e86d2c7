//! Validation engine orchestrating extraction and evaluation
//!
//! CDD Principle: Domain Services - The engine is the only component callers talk to
//! - Each operation decodes the ruleset and submits it on its own, no state carries over
//! - Failures from the evaluator boundary pass through unchanged
//! - The engine is Send + Sync and safe to share across threads

use crate::domain::ruleset::{Rule, Ruleset};
use crate::domain::violations::{GovernanceError, GovernanceResult, RuleViolation};
use crate::evaluator::{EvaluatorAdapter, RuleEvaluator};
use crate::extractor::YamlRuleExtractor;

/// Public contract of a governance validation engine
pub trait ValidationEngine: Send + Sync {
    /// Check that the ruleset is well formed
    fn validate_ruleset_content(&self, ruleset: &Ruleset) -> GovernanceResult<()>;

    /// Extract the individual rules of a ruleset
    fn extract_rules_from_ruleset(&self, ruleset: &Ruleset) -> GovernanceResult<Vec<Rule>>;

    /// Validate a target document against a ruleset
    fn validate(&self, target: &str, ruleset: &Ruleset) -> GovernanceResult<Vec<RuleViolation>>;
}

/// Validation engine backed by a rule evaluator
pub struct GovernanceEngine<E> {
    extractor: YamlRuleExtractor,
    adapter: EvaluatorAdapter<E>,
}

impl<E: RuleEvaluator> GovernanceEngine<E> {
    pub fn new(evaluator: E) -> Self {
        Self {
            extractor: YamlRuleExtractor::new(),
            adapter: EvaluatorAdapter::new(evaluator),
        }
    }

    pub fn evaluator(&self) -> &E {
        self.adapter.evaluator()
    }
}

/// Decode ruleset content for submission to the evaluator
fn ruleset_text(ruleset: &Ruleset) -> GovernanceResult<&str> {
    ruleset.content().as_text().map_err(|e| {
        tracing::debug!("Ruleset '{}' is not UTF-8: {}", ruleset.name(), e);
        GovernanceError::invalid_content_type(ruleset.name())
    })
}

impl<E: RuleEvaluator> ValidationEngine for GovernanceEngine<E> {
    fn validate_ruleset_content(&self, ruleset: &Ruleset) -> GovernanceResult<()> {
        let text = ruleset_text(ruleset)?;
        self.adapter.check_ruleset_well_formed(ruleset, text)
    }

    fn extract_rules_from_ruleset(&self, ruleset: &Ruleset) -> GovernanceResult<Vec<Rule>> {
        let text = ruleset.content().as_text().map_err(|e| {
            GovernanceError::extraction(format!("Ruleset '{}' is not UTF-8: {e}", ruleset.name()))
        })?;

        let rules = self.extractor.extract(text)?;
        tracing::debug!("Extracted {} rule(s) from ruleset '{}'", rules.len(), ruleset.name());
        Ok(rules)
    }

    fn validate(&self, target: &str, ruleset: &Ruleset) -> GovernanceResult<Vec<RuleViolation>> {
        let text = ruleset_text(ruleset)?;
        self.adapter.evaluate(target, ruleset, text)
    }
}
