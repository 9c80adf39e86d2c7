//! Boundary to the external rule evaluator
//!
//! Architecture: Anti-Corruption Layer - The evaluator is an opaque collaborator behind a trait
//! - RuleEvaluator exposes the collaborator's two entry points and its raw JSON results
//! - EvaluatorAdapter parses those results into typed records
//! - Collaborator failure signals are mapped onto the governance error taxonomy here and nowhere else

pub mod command;

use crate::domain::ruleset::Ruleset;
use crate::domain::violations::{GovernanceError, GovernanceResult, RuleSeverity, RuleViolation};
use serde::Deserialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

pub use command::CommandEvaluator;

/// Failure signals raised by a rule evaluator
#[derive(Debug, thiserror::Error)]
pub enum EvaluatorError {
    /// The input is not YAML or JSON at all
    #[error("Content is not valid YAML or JSON")]
    InvalidContentType,

    /// The ruleset was rejected while evaluating a document
    #[error("Ruleset is invalid")]
    InvalidRuleset,

    /// Any other failure inside the evaluator
    #[error("Rule evaluator failed: {0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl EvaluatorError {
    pub fn failed(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Failed(cause.into())
    }
}

/// The external capability that interprets rulesets
///
/// Implementations return the collaborator's raw JSON text; parsing and
/// error mapping are the adapter's job.
pub trait RuleEvaluator: Send + Sync {
    /// Check a ruleset document, returning `{"passed": bool, "message": string}`
    fn validate_ruleset(&self, ruleset: &str) -> Result<String, EvaluatorError>;

    /// Evaluate a target document, returning an array of findings
    fn validate_document(&self, target: &str, ruleset: &str) -> Result<String, EvaluatorError>;
}

impl<E: RuleEvaluator + ?Sized> RuleEvaluator for Box<E> {
    fn validate_ruleset(&self, ruleset: &str) -> Result<String, EvaluatorError> {
        (**self).validate_ruleset(ruleset)
    }

    fn validate_document(&self, target: &str, ruleset: &str) -> Result<String, EvaluatorError> {
        (**self).validate_document(target, ruleset)
    }
}

#[derive(Debug, Deserialize)]
struct RulesetCheck {
    passed: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Finding {
    rule_name: String,
    path: String,
    message: String,
    severity: RuleSeverity,
}

/// Run an evaluator call, turning a panic into an evaluator failure
fn guarded<F>(call: F) -> Result<String, EvaluatorError>
where
    F: FnOnce() -> Result<String, EvaluatorError>,
{
    panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        Err(EvaluatorError::failed(format!(
            "Rule evaluator panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}

/// Invokes a rule evaluator and maps its results
pub struct EvaluatorAdapter<E> {
    evaluator: E,
}

impl<E: RuleEvaluator> EvaluatorAdapter<E> {
    pub fn new(evaluator: E) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Ask the evaluator whether the ruleset is well formed
    pub fn check_ruleset_well_formed(
        &self,
        ruleset: &Ruleset,
        ruleset_text: &str,
    ) -> GovernanceResult<()> {
        let result = match guarded(|| self.evaluator.validate_ruleset(ruleset_text)) {
            Ok(result) => result,
            Err(EvaluatorError::InvalidContentType) => {
                tracing::debug!("Ruleset '{}' is not YAML or JSON", ruleset.name());
                return Err(GovernanceError::invalid_content_type(ruleset.name()));
            }
            Err(EvaluatorError::InvalidRuleset) => {
                return Err(GovernanceError::invalid_content(ruleset.name(), None));
            }
            Err(EvaluatorError::Failed(source)) => {
                tracing::error!(
                    "Error occurred while validating ruleset '{}': {}",
                    ruleset.name(),
                    source
                );
                return Err(GovernanceError::EvaluationFailed { source });
            }
        };

        let check: RulesetCheck = serde_json::from_str(&result).map_err(|e| {
            tracing::error!("Error while parsing ruleset validation result JSON: {}", e);
            GovernanceError::ResponseParseFailed {
                context: "ruleset validation result",
                source: e,
            }
        })?;

        if check.passed {
            tracing::debug!("Ruleset '{}' is well formed", ruleset.name());
            return Ok(());
        }

        Err(GovernanceError::invalid_content(ruleset.name(), check.message))
    }

    /// Evaluate a target document and collect violations in evaluator order
    pub fn evaluate(
        &self,
        target: &str,
        ruleset: &Ruleset,
        ruleset_text: &str,
    ) -> GovernanceResult<Vec<RuleViolation>> {
        let result = match guarded(|| self.evaluator.validate_document(target, ruleset_text)) {
            Ok(result) => result,
            // Both causes are reported as invalid ruleset content
            Err(cause @ (EvaluatorError::InvalidRuleset | EvaluatorError::InvalidContentType)) => {
                tracing::debug!("Evaluation with ruleset '{}' rejected: {}", ruleset.name(), cause);
                return Err(GovernanceError::invalid_content(ruleset.name(), None));
            }
            Err(EvaluatorError::Failed(source)) => {
                tracing::error!(
                    "Error occurred while verifying governance compliance with ruleset '{}': {:?}",
                    ruleset.name(),
                    source
                );
                return Err(GovernanceError::EvaluationFailed { source });
            }
        };

        let findings: Vec<Finding> = serde_json::from_str(&result).map_err(|e| {
            tracing::error!("Error while parsing validation result JSON: {}", e);
            GovernanceError::ResponseParseFailed {
                context: "validation result",
                source: e,
            }
        })?;

        tracing::debug!(
            "Validation with ruleset '{}' produced {} finding(s)",
            ruleset.name(),
            findings.len()
        );

        Ok(findings
            .into_iter()
            .map(|finding| RuleViolation {
                rule_name: finding.rule_name,
                violated_path: finding.path,
                message: finding.message,
                severity: finding.severity,
                ruleset_id: ruleset.id().to_string(),
            })
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::ruleset::RulesetContent;

    /// Evaluator returning canned responses
    pub(crate) struct StaticEvaluator {
        pub ruleset_result: fn() -> Result<String, EvaluatorError>,
        pub document_result: fn() -> Result<String, EvaluatorError>,
    }

    impl RuleEvaluator for StaticEvaluator {
        fn validate_ruleset(&self, _ruleset: &str) -> Result<String, EvaluatorError> {
            (self.ruleset_result)()
        }

        fn validate_document(&self, _target: &str, _ruleset: &str) -> Result<String, EvaluatorError> {
            (self.document_result)()
        }
    }

    fn adapter(
        ruleset_result: fn() -> Result<String, EvaluatorError>,
        document_result: fn() -> Result<String, EvaluatorError>,
    ) -> EvaluatorAdapter<StaticEvaluator> {
        EvaluatorAdapter::new(StaticEvaluator {
            ruleset_result,
            document_result,
        })
    }

    fn unused() -> Result<String, EvaluatorError> {
        Ok(String::new())
    }

    fn ruleset() -> Ruleset {
        Ruleset::new("rs-42", "api-design", RulesetContent::yaml("rules: {}"))
    }

    #[test]
    fn test_passed_ruleset() {
        let adapter = adapter(|| Ok(r#"{"passed": true}"#.to_string()), unused);
        assert!(adapter.check_ruleset_well_formed(&ruleset(), "rules: {}").is_ok());
    }

    #[test]
    fn test_failed_ruleset_carries_message() {
        let adapter = adapter(
            || Ok(r#"{"passed": false, "message": "severity is required"}"#.to_string()),
            unused,
        );

        let err = adapter.check_ruleset_well_formed(&ruleset(), "").unwrap_err();
        match err {
            GovernanceError::InvalidRulesetContent { ruleset, message } => {
                assert_eq!(ruleset, "api-design");
                assert_eq!(message.as_deref(), Some("severity is required"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ruleset_content_type_signal() {
        let adapter = adapter(|| Err(EvaluatorError::InvalidContentType), unused);

        let err = adapter.check_ruleset_well_formed(&ruleset(), "<xml/>").unwrap_err();
        assert!(matches!(
            err,
            GovernanceError::InvalidRulesetContentType { ref ruleset } if ruleset == "api-design"
        ));
    }

    #[test]
    fn test_unparseable_check_response() {
        let adapter = adapter(|| Ok("not json".to_string()), unused);

        let err = adapter.check_ruleset_well_formed(&ruleset(), "").unwrap_err();
        assert!(matches!(err, GovernanceError::ResponseParseFailed { .. }));
    }

    #[test]
    fn test_check_response_without_passed_flag() {
        let adapter = adapter(|| Ok(r#"{"message": "??"}"#.to_string()), unused);

        let err = adapter.check_ruleset_well_formed(&ruleset(), "").unwrap_err();
        assert!(matches!(err, GovernanceError::ResponseParseFailed { .. }));
    }

    #[test]
    fn test_findings_map_to_violations() -> GovernanceResult<()> {
        let adapter = adapter(unused, || {
            Ok(r#"[
                {"ruleName":"no-http-verbs-in-path","path":"$.paths./users/{id}","message":"Path contains HTTP verb","severity":"WARN"},
                {"ruleName":"info-contact","path":"$.info","message":"Contact missing","severity":"info"}
            ]"#
            .to_string())
        });

        let violations = adapter.evaluate("openapi: 3.0.0", &ruleset(), "rules: {}")?;

        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].rule_name, "no-http-verbs-in-path");
        assert_eq!(violations[0].violated_path, "$.paths./users/{id}");
        assert_eq!(violations[0].message, "Path contains HTTP verb");
        assert_eq!(violations[0].severity, RuleSeverity::Warn);
        assert_eq!(violations[1].severity, RuleSeverity::Info);
        assert!(violations.iter().all(|v| v.ruleset_id == "rs-42"));

        Ok(())
    }

    #[test]
    fn test_empty_findings() -> GovernanceResult<()> {
        let adapter = adapter(unused, || Ok("[]".to_string()));
        assert!(adapter.evaluate("{}", &ruleset(), "")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_rejections_collapse_to_invalid_content() {
        for document_result in [
            (|| Err(EvaluatorError::InvalidRuleset)) as fn() -> Result<String, EvaluatorError>,
            || Err(EvaluatorError::InvalidContentType),
        ] {
            let adapter = adapter(unused, document_result);
            let err = adapter.evaluate("{}", &ruleset(), "").unwrap_err();
            assert!(matches!(
                err,
                GovernanceError::InvalidRulesetContent { ref ruleset, message: None } if ruleset == "api-design"
            ));
        }
    }

    #[test]
    fn test_unexpected_failure_is_wrapped() {
        let adapter = adapter(unused, || Err(EvaluatorError::failed("segfault in rule engine")));

        let err = adapter.evaluate("{}", &ruleset(), "").unwrap_err();
        match err {
            GovernanceError::EvaluationFailed { source } => {
                assert_eq!(source.to_string(), "segfault in rule engine");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Evaluator whose binding panics on every call
    pub(crate) struct PanickingEvaluator;

    impl RuleEvaluator for PanickingEvaluator {
        fn validate_ruleset(&self, _ruleset: &str) -> Result<String, EvaluatorError> {
            panic!("binding lost its native handle")
        }

        fn validate_document(&self, _target: &str, _ruleset: &str) -> Result<String, EvaluatorError> {
            panic!("{} rules left unevaluated", 3)
        }
    }

    #[test]
    fn test_panicking_evaluator_is_wrapped() {
        let adapter = EvaluatorAdapter::new(PanickingEvaluator);

        match adapter.evaluate("{}", &ruleset(), "").unwrap_err() {
            GovernanceError::EvaluationFailed { source } => {
                assert!(source.to_string().contains("3 rules left unevaluated"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        match adapter.check_ruleset_well_formed(&ruleset(), "").unwrap_err() {
            GovernanceError::EvaluationFailed { source } => {
                assert!(source.to_string().contains("binding lost its native handle"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_findings() {
        for document_result in [
            (|| Ok("{\"passed\": true}".to_string())) as fn() -> Result<String, EvaluatorError>,
            || Ok(r#"[{"ruleName":"r","path":"$","message":"m","severity":"FATAL"}]"#.to_string()),
            || Ok(r#"[{"ruleName":"r","message":"m","severity":"ERROR"}]"#.to_string()),
        ] {
            let adapter = adapter(unused, document_result);
            let err = adapter.evaluate("{}", &ruleset(), "").unwrap_err();
            assert!(matches!(err, GovernanceError::ResponseParseFailed { .. }));
        }
    }
}
