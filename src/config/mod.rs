//! Configuration loading and management
//!
//! Architecture: Anti-Corruption Layer - Configuration translates external YAML formats
//! - Raw YAML structures are converted to typed settings for the evaluator binding
//! - Defaults are embedded here so the CLI works without a config file
//! - Validation rejects unusable settings before any ruleset is touched

use crate::domain::violations::{GovernanceError, GovernanceResult, RuleSeverity};
use crate::evaluator::CommandEvaluator;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration file names searched in the working directory
pub const DEFAULT_CONFIG_FILES: [&str; 3] = [
    "ruleset_governance.yaml",
    "ruleset_governance.yml",
    ".ruleset_governance.yaml",
];

const SUPPORTED_VERSIONS: [&str; 1] = ["1.0"];

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Configuration format version
    pub version: String,
    /// External rule evaluator binding
    pub evaluator: EvaluatorConfig,
    /// Target discovery settings
    #[serde(default)]
    pub scan: ScanConfig,
    /// Reporting settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// How to invoke the external rule evaluator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Program to run
    pub command: String,
    /// Arguments placed before the mode argument
    #[serde(default)]
    pub args: Vec<String>,
}

/// Target document discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// File extensions treated as target documents when walking directories
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_true")]
    pub parallel: bool,
    #[serde(default)]
    pub fail_fast: bool,
}

/// Reporting thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Minimum severity that fails a check
    #[serde(default = "default_fail_on")]
    pub fail_on: RuleSeverity,
    /// Maximum number of violations to print
    #[serde(default)]
    pub max_violations: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            parallel: true,
            fail_fast: false,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            fail_on: default_fail_on(),
            max_violations: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GovernanceResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            GovernanceError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            GovernanceError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> GovernanceResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| GovernanceError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Load the first default config file present in `dir`, or the built-in defaults
    pub fn discover<P: AsRef<Path>>(dir: P) -> GovernanceResult<Self> {
        for name in DEFAULT_CONFIG_FILES {
            let candidate = dir.as_ref().join(name);
            if candidate.is_file() {
                tracing::debug!("Using configuration {}", candidate.display());
                return Self::load_from_file(candidate);
            }
        }
        Ok(Self::with_defaults())
    }

    /// Get default configuration
    pub fn with_defaults() -> Self {
        Self {
            version: "1.0".to_string(),
            evaluator: EvaluatorConfig {
                command: "ruleset-evaluator".to_string(),
                args: Vec::new(),
            },
            scan: ScanConfig::default(),
            report: ReportConfig::default(),
        }
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> GovernanceResult<()> {
        if !SUPPORTED_VERSIONS.contains(&self.version.as_str()) {
            return Err(GovernanceError::config(format!(
                "Unsupported configuration version: {}. Supported versions: {}",
                self.version,
                SUPPORTED_VERSIONS.join(", ")
            )));
        }

        if self.evaluator.command.trim().is_empty() {
            return Err(GovernanceError::config("Evaluator command must not be empty"));
        }

        if self.scan.extensions.is_empty() {
            return Err(GovernanceError::config(
                "At least one target file extension must be configured",
            ));
        }

        if let Some(ext) = self.scan.extensions.iter().find(|e| e.trim().is_empty()) {
            return Err(GovernanceError::config(format!("Invalid target file extension '{ext}'")));
        }

        Ok(())
    }

    /// Build the evaluator binding described by this configuration
    pub fn command_evaluator(&self) -> CommandEvaluator {
        CommandEvaluator::new(self.evaluator.command.clone(), self.evaluator.args.clone())
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> GovernanceResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| GovernanceError::config(format!("Failed to serialize config: {e}")))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn default_true() -> bool {
    true
}

fn default_extensions() -> Vec<String> {
    vec!["yaml".to_string(), "yml".to_string(), "json".to_string()]
}

fn default_fail_on() -> RuleSeverity {
    RuleSeverity::Error
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: EngineConfig,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Set the evaluator program and its leading arguments
    pub fn evaluator(mut self, command: impl Into<String>, args: Vec<String>) -> Self {
        self.config.evaluator = EvaluatorConfig {
            command: command.into(),
            args,
        };
        self
    }

    /// Add a target file extension
    pub fn add_extension(mut self, extension: impl Into<String>) -> Self {
        self.config.scan.extensions.push(extension.into());
        self
    }

    /// Set the severity that fails a check
    pub fn fail_on(mut self, severity: RuleSeverity) -> Self {
        self.config.report.fail_on = severity;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> GovernanceResult<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
