//! Report generation with multiple output formats
//!
//! CDD Principle: Anti-Corruption Layer - Formatters translate domain objects to external formats
//! - ValidationReport (domain) is converted to various external representations
//! - Each formatter encapsulates the rules for its specific output format
//! - Violations keep the evaluator's order within each target

use crate::domain::ruleset::Rule;
use crate::domain::violations::{
    GovernanceError, GovernanceResult, RuleSeverity, RuleViolation, ValidationReport,
};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::str::FromStr;

/// Supported output formats for validation reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format with colors
    Human,
    /// JSON format for programmatic consumption
    Json,
    /// GitHub Actions format for workflow integration
    GitHub,
}

impl OutputFormat {
    /// Get all available format names
    pub fn all_formats() -> &'static [&'static str] {
        &["human", "json", "github"]
    }
}

impl FromStr for OutputFormat {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "github" => Ok(Self::GitHub),
            _ => Err(GovernanceError::config(format!(
                "Unknown output format '{s}'. Expected one of: {}",
                Self::all_formats().join(", ")
            ))),
        }
    }
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to use colored output (for human format)
    pub use_colors: bool,
    /// Maximum number of violations to include
    pub max_violations: Option<usize>,
    /// Minimum severity level to include
    pub min_severity: Option<RuleSeverity>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            use_colors: true,
            max_violations: None,
            min_severity: None,
        }
    }
}

/// Main report formatter that dispatches to specific formatters
#[derive(Debug, Clone, Default)]
pub struct ReportFormatter {
    options: ReportOptions,
}

impl ReportFormatter {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Format a validation report in the specified format
    pub fn format_report(
        &self,
        report: &ValidationReport,
        format: OutputFormat,
    ) -> GovernanceResult<String> {
        let violations = self.filter_violations(report);

        match format {
            OutputFormat::Human => Ok(self.format_human(report, &violations)),
            OutputFormat::Json => self.format_json(report, &violations),
            OutputFormat::GitHub => Ok(self.format_github(&violations)),
        }
    }

    /// Format an extracted rule listing
    pub fn format_rules(
        &self,
        rules: &[Rule],
        format: OutputFormat,
        show_content: bool,
    ) -> GovernanceResult<String> {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(rules).map_err(|source| {
                GovernanceError::ReportRendering {
                    format: "JSON rule listing",
                    source,
                }
            }),
            OutputFormat::Human | OutputFormat::GitHub => {
                let mut output = format!("📋 {} rule(s)\n\n", rules.len());
                for rule in rules {
                    let line = rule.format_display();
                    if self.options.use_colors {
                        output.push_str(&format!(
                            "  🔍 \x1b[{}m{}\x1b[0m\n",
                            severity_color(rule.severity),
                            line
                        ));
                    } else {
                        output.push_str(&format!("  🔍 {line}\n"));
                    }
                    if show_content {
                        for content_line in rule.content.lines() {
                            output.push_str(&format!("      {content_line}\n"));
                        }
                    }
                }
                Ok(output)
            }
        }
    }

    /// Filter violations based on report options
    fn filter_violations<'a>(
        &self,
        report: &'a ValidationReport,
    ) -> Vec<(&'a Path, &'a RuleViolation)> {
        let mut filtered: Vec<_> = report
            .violations()
            .filter(|(_, v)| match self.options.min_severity {
                Some(min_severity) => v.severity.is_at_least(min_severity),
                None => true,
            })
            .collect();

        if let Some(max) = self.options.max_violations {
            filtered.truncate(max);
        }

        filtered
    }

    fn format_human(
        &self,
        report: &ValidationReport,
        violations: &[(&Path, &RuleViolation)],
    ) -> String {
        let mut output = String::new();

        if violations.is_empty() {
            if self.options.use_colors {
                output.push_str("✅ \x1b[32mNo governance violations found\x1b[0m\n");
            } else {
                output.push_str("✅ No governance violations found\n");
            }
        } else {
            let icon = if report.has_errors() { "❌" } else { "⚠️" };
            if self.options.use_colors {
                let color = if report.has_errors() { "31" } else { "33" };
                output.push_str(&format!("{icon} \x1b[{color}mGovernance Violations Found\x1b[0m\n\n"));
            } else {
                output.push_str(&format!("{icon} Governance Violations Found\n\n"));
            }

            let mut current: Option<&Path> = None;
            for (target, violation) in violations {
                if current != Some(*target) {
                    if current.is_some() {
                        output.push('\n');
                    }
                    output.push_str(&format!("📁 {}\n", target.display()));
                    current = Some(*target);
                }

                if self.options.use_colors {
                    output.push_str(&format!(
                        "  \x1b[2m{}\x1b[0m [\x1b[{}m{}\x1b[0m] {}: {}\n",
                        violation.violated_path,
                        severity_color(violation.severity),
                        violation.severity.as_str(),
                        violation.rule_name,
                        violation.message
                    ));
                } else {
                    output.push_str(&format!("  {}\n", violation.format_display()));
                }
            }
            output.push('\n');
        }

        for failure in &report.failures {
            output.push_str(&format!(
                "💥 {}: {}\n",
                failure.target.display(),
                failure.error
            ));
        }

        output.push_str(&self.format_summary(report));
        output
    }

    fn format_json(
        &self,
        report: &ValidationReport,
        violations: &[(&Path, &RuleViolation)],
    ) -> GovernanceResult<String> {
        let json_violations: Vec<JsonValue> = violations
            .iter()
            .map(|(target, v)| {
                serde_json::json!({
                    "target": target.display().to_string(),
                    "rule_name": v.rule_name,
                    "path": v.violated_path,
                    "message": v.message,
                    "severity": v.severity.as_str(),
                    "ruleset_id": v.ruleset_id,
                })
            })
            .collect();

        let failures: Vec<JsonValue> = report
            .failures
            .iter()
            .map(|f| {
                serde_json::json!({
                    "target": f.target.display().to_string(),
                    "error": f.error,
                })
            })
            .collect();

        let json_report = serde_json::json!({
            "ruleset_id": report.ruleset_id,
            "violations": json_violations,
            "failures": failures,
            "summary": {
                "total_targets": report.summary.total_targets,
                "violations_by_severity": {
                    "error": report.summary.violations_by_severity.error,
                    "warn": report.summary.violations_by_severity.warn,
                    "info": report.summary.violations_by_severity.info
                },
                "execution_time_ms": report.summary.execution_time_ms,
                "validated_at": report.summary.validated_at.to_rfc3339()
            }
        });

        serde_json::to_string_pretty(&json_report).map_err(|source| {
            GovernanceError::ReportRendering {
                format: "JSON report",
                source,
            }
        })
    }

    /// Format report for GitHub Actions
    fn format_github(&self, violations: &[(&Path, &RuleViolation)]) -> String {
        let mut output = String::new();

        for (target, violation) in violations {
            let level = match violation.severity {
                RuleSeverity::Error => "error",
                RuleSeverity::Warn => "warning",
                RuleSeverity::Info => "notice",
            };

            output.push_str(&format!(
                "::{} file={},title={}::{}: {}\n",
                level,
                target.display(),
                violation.rule_name,
                violation.violated_path,
                violation.message
            ));
        }

        output
    }

    /// Format the summary section
    fn format_summary(&self, report: &ValidationReport) -> String {
        let counts = &report.summary.violations_by_severity;
        let execution_time = (report.summary.execution_time_ms as f64) / 1000.0;

        let mut summary = if self.options.use_colors {
            "📊 \x1b[1mSummary:\x1b[0m ".to_string()
        } else {
            "📊 Summary: ".to_string()
        };

        let mut parts = Vec::new();
        for (count, label, severity) in [
            (counts.error, "error", RuleSeverity::Error),
            (counts.warn, "warning", RuleSeverity::Warn),
            (counts.info, "info", RuleSeverity::Info),
        ] {
            if count == 0 {
                continue;
            }
            let plural = if count == 1 || severity == RuleSeverity::Info { "" } else { "s" };
            let text = format!("{count} {label}{plural}");
            if self.options.use_colors {
                parts.push(format!("\x1b[{}m{}\x1b[0m", severity_color(severity), text));
            } else {
                parts.push(text);
            }
        }

        if parts.is_empty() {
            parts.push("0 violations".to_string());
        }

        summary.push_str(&format!(
            "{} in {} target(s) ({:.1}s)\n",
            parts.join(", "),
            report.summary.total_targets,
            execution_time
        ));

        if report.has_failures() {
            summary.push_str(&format!(
                "   {} target(s) could not be validated\n",
                report.failures.len()
            ));
        }

        summary
    }
}

fn severity_color(severity: RuleSeverity) -> &'static str {
    match severity {
        RuleSeverity::Error => "31",
        RuleSeverity::Warn => "33",
        RuleSeverity::Info => "36",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_report() -> ValidationReport {
        let mut report = ValidationReport::new("rs-1");

        report.add_result(
            "apis/petstore.yaml",
            vec![
                RuleViolation::new(
                    "no-http-verbs-in-path",
                    "$.paths./get-users",
                    "Path contains HTTP verb",
                    RuleSeverity::Warn,
                    "rs-1",
                ),
                RuleViolation::new(
                    "operation-id-required",
                    "$.paths./pets.get",
                    "Operation must have an operationId",
                    RuleSeverity::Error,
                    "rs-1",
                ),
            ],
        );
        report.add_failure("apis/broken.yaml", "IO error: permission denied");
        report.set_execution_time(1200);

        report
    }

    fn plain() -> ReportFormatter {
        ReportFormatter::new(ReportOptions {
            use_colors: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_human_format() {
        let output = plain()
            .format_report(&create_test_report(), OutputFormat::Human)
            .unwrap();

        assert!(output.contains("Governance Violations Found"));
        assert!(output.contains("apis/petstore.yaml"));
        assert!(output.contains("$.paths./get-users [WARN] no-http-verbs-in-path: Path contains HTTP verb"));
        assert!(output.contains("apis/broken.yaml: IO error"));
        assert!(output.contains("1 error, 1 warning in 2 target(s)"));
    }

    #[test]
    fn test_json_format() {
        let output = ReportFormatter::default()
            .format_report(&create_test_report(), OutputFormat::Json)
            .unwrap();

        let json: JsonValue = serde_json::from_str(&output).unwrap();
        assert_eq!(json["ruleset_id"], "rs-1");
        assert_eq!(json["violations"].as_array().unwrap().len(), 2);
        // Evaluator order is preserved
        assert_eq!(json["violations"][0]["rule_name"], "no-http-verbs-in-path");
        assert_eq!(json["violations"][0]["severity"], "WARN");
        assert_eq!(json["failures"][0]["target"], "apis/broken.yaml");
        assert_eq!(json["summary"]["total_targets"], 2);
    }

    #[test]
    fn test_github_format() {
        let output = ReportFormatter::default()
            .format_report(&create_test_report(), OutputFormat::GitHub)
            .unwrap();

        assert!(output.contains("::warning file=apis/petstore.yaml,title=no-http-verbs-in-path::"));
        assert!(output.contains("::error file=apis/petstore.yaml,title=operation-id-required::"));
    }

    #[test]
    fn test_empty_report() {
        let output = plain()
            .format_report(&ValidationReport::new("rs-1"), OutputFormat::Human)
            .unwrap();

        assert!(output.contains("No governance violations found"));
        assert!(output.contains("0 violations in 0 target(s)"));
    }

    #[test]
    fn test_severity_filtering_and_limit() {
        let formatter = ReportFormatter::new(ReportOptions {
            min_severity: Some(RuleSeverity::Error),
            ..Default::default()
        });
        let output = formatter
            .format_report(&create_test_report(), OutputFormat::Json)
            .unwrap();
        let json: JsonValue = serde_json::from_str(&output).unwrap();
        assert_eq!(json["violations"].as_array().unwrap().len(), 1);
        assert_eq!(json["violations"][0]["rule_name"], "operation-id-required");

        let limited = ReportFormatter::new(ReportOptions {
            max_violations: Some(1),
            ..Default::default()
        });
        let output = limited
            .format_report(&create_test_report(), OutputFormat::GitHub)
            .unwrap();
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_rule_listing() {
        let rules = vec![Rule {
            id: "id-1".to_string(),
            name: "info-contact".to_string(),
            description: Some("Info object must have contact".to_string()),
            severity: RuleSeverity::Info,
            content: "severity: info\ngiven: $.info\n".to_string(),
        }];

        let human = plain().format_rules(&rules, OutputFormat::Human, true).unwrap();
        assert!(human.contains("info-contact [INFO] - Info object must have contact"));
        assert!(human.contains("given: $.info"));

        let json = plain().format_rules(&rules, OutputFormat::Json, false).unwrap();
        let parsed: JsonValue = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["severity"], "INFO");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("GitHub".parse::<OutputFormat>().unwrap(), OutputFormat::GitHub);
        assert!("sarif".parse::<OutputFormat>().is_err());
    }
}
