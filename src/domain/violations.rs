//! Core domain models for rule violations and validation results
//!
//! Architecture: Rich Domain Models - Violations are values produced by the evaluator
//! - Severities are a closed vocabulary parsed strictly, never defaulted
//! - ValidationReport acts as an aggregate root over per-target results
//! - The error taxonomy distinguishes user-correctable input from collaborator faults

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Severity levels declared by ruleset authors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RuleSeverity {
    /// Informational findings
    Info,
    /// Findings that should be addressed but are not blocking by default
    Warn,
    /// Findings that fail governance compliance
    Error,
}

impl RuleSeverity {
    /// Whether this severity meets or exceeds the given threshold
    pub fn is_at_least(self, threshold: RuleSeverity) -> bool {
        self >= threshold
    }

    /// Canonical token used in rulesets and evaluator results
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for RuleSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when free text is not a recognized severity token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognized rule severity '{0}'. Expected one of: ERROR, WARN, INFO")]
pub struct ParseSeverityError(pub String);

impl FromStr for RuleSeverity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Ok(Self::Error),
            "WARN" => Ok(Self::Warn),
            "INFO" => Ok(Self::Info),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

impl TryFrom<String> for RuleSeverity {
    type Error = ParseSeverityError;

    fn try_from(value: String) -> Result<Self, ParseSeverityError> {
        value.parse()
    }
}

impl From<RuleSeverity> for String {
    fn from(severity: RuleSeverity) -> Self {
        severity.as_str().to_string()
    }
}

/// One instance of a target document failing a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleViolation {
    /// Name of the rule reported by the evaluator
    pub rule_name: String,
    /// Location within the target document
    pub violated_path: String,
    /// Human-readable description of the finding
    pub message: String,
    pub severity: RuleSeverity,
    /// Ruleset that produced this violation
    pub ruleset_id: String,
}

impl RuleViolation {
    pub fn new(
        rule_name: impl Into<String>,
        violated_path: impl Into<String>,
        message: impl Into<String>,
        severity: RuleSeverity,
        ruleset_id: impl Into<String>,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            violated_path: violated_path.into(),
            message: message.into(),
            severity,
            ruleset_id: ruleset_id.into(),
        }
    }

    /// Format violation for display
    pub fn format_display(&self) -> String {
        format!(
            "{} [{}] {}: {}",
            self.violated_path,
            self.severity.as_str(),
            self.rule_name,
            self.message
        )
    }
}

/// Count of violations by severity level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationCounts {
    pub error: usize,
    pub warn: usize,
    pub info: usize,
}

impl ViolationCounts {
    /// Total number of violations across all severities
    pub fn total(&self) -> usize {
        self.error + self.warn + self.info
    }

    /// Number of violations at or above the threshold
    pub fn at_least(&self, threshold: RuleSeverity) -> usize {
        match threshold {
            RuleSeverity::Error => self.error,
            RuleSeverity::Warn => self.error + self.warn,
            RuleSeverity::Info => self.total(),
        }
    }

    pub fn add(&mut self, severity: RuleSeverity) {
        match severity {
            RuleSeverity::Error => self.error += 1,
            RuleSeverity::Warn => self.warn += 1,
            RuleSeverity::Info => self.info += 1,
        }
    }
}

/// Violations found in a single target document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetResult {
    pub target: PathBuf,
    pub violations: Vec<RuleViolation>,
}

/// A target document that could not be validated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetFailure {
    pub target: PathBuf,
    pub error: String,
}

/// Summary statistics for a validation report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Number of target documents considered
    pub total_targets: usize,
    pub violations_by_severity: ViolationCounts,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
    pub validated_at: DateTime<Utc>,
}

/// Result of validating a set of target documents against one ruleset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub ruleset_id: String,
    pub results: Vec<TargetResult>,
    pub failures: Vec<TargetFailure>,
    pub summary: ValidationSummary,
}

impl ValidationReport {
    pub fn new(ruleset_id: impl Into<String>) -> Self {
        Self {
            ruleset_id: ruleset_id.into(),
            results: Vec::new(),
            failures: Vec::new(),
            summary: ValidationSummary {
                validated_at: Utc::now(),
                ..Default::default()
            },
        }
    }

    /// Record the violations found in one target, preserving evaluator order
    pub fn add_result(&mut self, target: impl Into<PathBuf>, violations: Vec<RuleViolation>) {
        for violation in &violations {
            self.summary.violations_by_severity.add(violation.severity);
        }
        self.summary.total_targets += 1;
        self.results.push(TargetResult {
            target: target.into(),
            violations,
        });
    }

    /// Record a target that could not be validated
    pub fn add_failure(&mut self, target: impl Into<PathBuf>, error: impl Into<String>) {
        self.summary.total_targets += 1;
        self.failures.push(TargetFailure {
            target: target.into(),
            error: error.into(),
        });
    }

    pub fn has_violations(&self) -> bool {
        self.summary.violations_by_severity.total() > 0
    }

    pub fn has_errors(&self) -> bool {
        self.summary.violations_by_severity.error > 0
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Whether any violation meets the given severity threshold
    pub fn is_blocking(&self, threshold: RuleSeverity) -> bool {
        self.summary.violations_by_severity.at_least(threshold) > 0
    }

    /// All violations paired with the target they were found in
    pub fn violations(&self) -> impl Iterator<Item = (&Path, &RuleViolation)> {
        self.results.iter().flat_map(|result| {
            result
                .violations
                .iter()
                .map(move |violation| (result.target.as_path(), violation))
        })
    }

    pub fn set_execution_time(&mut self, duration_ms: u64) {
        self.summary.execution_time_ms = duration_ms;
    }
}

/// Error types surfaced by the governance engine
#[derive(Debug, thiserror::Error)]
pub enum GovernanceError {
    /// The evaluator rejected the ruleset's rules
    #[error(
        "Invalid content in ruleset '{ruleset}'{}",
        .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
    )]
    InvalidRulesetContent {
        ruleset: String,
        message: Option<String>,
    },

    /// The ruleset is not in a format the evaluator understands
    #[error("Content of ruleset '{ruleset}' is not valid YAML or JSON")]
    InvalidRulesetContentType { ruleset: String },

    /// Rules could not be extracted from the ruleset document
    #[error("Error while extracting rules: {message}")]
    RuleExtractionFailed { message: String },

    /// The evaluator failed unexpectedly; the cause is kept for logs only
    #[error("Error occurred while verifying governance compliance")]
    EvaluationFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The evaluator's JSON result did not match the expected shape
    #[error("Error while parsing {context} JSON")]
    ResponseParseFailed {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A report or rule listing could not be rendered
    #[error("Failed to render {format} output")]
    ReportRendering {
        format: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// File could not be read or accessed
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl GovernanceError {
    pub fn invalid_content(ruleset: impl Into<String>, message: Option<String>) -> Self {
        Self::InvalidRulesetContent {
            ruleset: ruleset.into(),
            message,
        }
    }

    pub fn invalid_content_type(ruleset: impl Into<String>) -> Self {
        Self::InvalidRulesetContentType {
            ruleset: ruleset.into(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::RuleExtractionFailed {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether the failure is caused by user-authored input rather than the collaborator
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRulesetContent { .. }
                | Self::InvalidRulesetContentType { .. }
                | Self::RuleExtractionFailed { .. }
        )
    }
}

/// Result type for governance operations
pub type GovernanceResult<T> = Result<T, GovernanceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ERROR", RuleSeverity::Error)]
    #[case("error", RuleSeverity::Error)]
    #[case("Warn", RuleSeverity::Warn)]
    #[case("info", RuleSeverity::Info)]
    fn test_severity_parsing(#[case] input: &str, #[case] expected: RuleSeverity) {
        assert_eq!(input.parse::<RuleSeverity>().unwrap(), expected);
    }

    #[rstest]
    #[case("CRITICAL")]
    #[case("warning")]
    #[case("")]
    fn test_unrecognized_severity(#[case] input: &str) {
        let err = input.parse::<RuleSeverity>().unwrap_err();
        assert_eq!(err.0, input);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(RuleSeverity::Error > RuleSeverity::Warn);
        assert!(RuleSeverity::Warn > RuleSeverity::Info);
        assert!(RuleSeverity::Error.is_at_least(RuleSeverity::Warn));
        assert!(!RuleSeverity::Info.is_at_least(RuleSeverity::Warn));
    }

    #[test]
    fn test_severity_serde() {
        let json = serde_json::to_string(&RuleSeverity::Warn).unwrap();
        assert_eq!(json, "\"WARN\"");

        let parsed: RuleSeverity = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(parsed, RuleSeverity::Error);

        assert!(serde_json::from_str::<RuleSeverity>("\"FATAL\"").is_err());
    }

    #[test]
    fn test_validation_report() {
        let mut report = ValidationReport::new("rs-1");

        report.add_result(
            "petstore.yaml",
            vec![
                RuleViolation::new("r1", "$.info", "Missing contact", RuleSeverity::Warn, "rs-1"),
                RuleViolation::new("r2", "$.paths", "Bad path", RuleSeverity::Error, "rs-1"),
            ],
        );
        report.add_result("clean.yaml", Vec::new());
        report.add_failure("broken.yaml", "IO error");

        assert!(report.has_violations());
        assert!(report.has_errors());
        assert!(report.has_failures());
        assert_eq!(report.summary.total_targets, 3);
        assert_eq!(report.summary.violations_by_severity.total(), 2);
        assert_eq!(report.violations().count(), 2);
        assert!(report.is_blocking(RuleSeverity::Error));
    }

    #[test]
    fn test_blocking_threshold() {
        let mut report = ValidationReport::new("rs-1");
        report.add_result(
            "api.yaml",
            vec![RuleViolation::new("r1", "$", "msg", RuleSeverity::Warn, "rs-1")],
        );

        assert!(!report.is_blocking(RuleSeverity::Error));
        assert!(report.is_blocking(RuleSeverity::Warn));
        assert!(report.is_blocking(RuleSeverity::Info));
    }

    #[test]
    fn test_error_messages() {
        let detailed = GovernanceError::invalid_content("api-rules", Some("severity is required".into()));
        assert_eq!(
            detailed.to_string(),
            "Invalid content in ruleset 'api-rules': severity is required"
        );

        let bare = GovernanceError::invalid_content("api-rules", None);
        assert_eq!(bare.to_string(), "Invalid content in ruleset 'api-rules'");
        assert!(bare.is_input_error());

        let failed = GovernanceError::EvaluationFailed {
            source: "engine crashed".into(),
        };
        assert!(!failed.to_string().contains("engine crashed"));
        assert!(!failed.is_input_error());
    }

    #[test]
    fn test_rendering_error_is_not_a_configuration_error() {
        let source = serde_json::from_str::<u8>("not json").unwrap_err();
        let err = GovernanceError::ReportRendering {
            format: "JSON report",
            source,
        };

        assert_eq!(err.to_string(), "Failed to render JSON report output");
        assert!(!err.to_string().contains("Configuration"));
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_input_error());
    }
}
