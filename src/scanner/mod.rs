//! Target discovery and batch validation
//!
//! CDD Principle: Domain Services - The scanner orchestrates validation over many documents
//! - Walks directories for target documents with configured extensions
//! - Validates each target independently through the engine, in parallel when asked
//! - Aggregates per-target results into a ValidationReport

use crate::domain::ruleset::Ruleset;
use crate::domain::violations::{GovernanceResult, RuleViolation, ValidationReport};
use crate::engine::ValidationEngine;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Options for customizing a scan
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Whether to validate targets in parallel
    pub parallel: bool,
    /// Stop at the first target that cannot be validated
    pub fail_fast: bool,
    /// Maximum number of targets to validate
    pub max_targets: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            fail_fast: false,
            max_targets: None,
        }
    }
}

/// Finds target documents and validates them against a ruleset
#[derive(Debug, Clone)]
pub struct TargetScanner {
    extensions: Vec<String>,
}

impl TargetScanner {
    pub fn new(extensions: Vec<String>) -> Self {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        Self { extensions }
    }

    fn has_target_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    /// Expand paths into target files; explicit files are always kept
    pub fn discover<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<PathBuf> {
        let mut targets = Vec::new();

        for path in paths {
            let path = path.as_ref();

            if path.is_file() {
                targets.push(path.to_path_buf());
            } else if path.is_dir() {
                let mut found: Vec<PathBuf> = WalkDir::new(path)
                    .follow_links(false)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file() && self.has_target_extension(e.path()))
                    .map(|e| e.into_path())
                    .collect();
                found.sort();
                targets.extend(found);
            } else {
                tracing::warn!("Skipping {}: not a file or directory", path.display());
            }
        }

        targets
    }

    /// Validate every discovered target against the ruleset
    pub fn scan<P: AsRef<Path>>(
        &self,
        engine: &dyn ValidationEngine,
        paths: &[P],
        ruleset: &Ruleset,
        options: &ScanOptions,
    ) -> GovernanceResult<ValidationReport> {
        let start_time = Instant::now();

        let mut targets = self.discover(paths);
        if let Some(max_targets) = options.max_targets {
            targets.truncate(max_targets);
        }

        let outcomes: Vec<(PathBuf, GovernanceResult<Vec<RuleViolation>>)> =
            if options.parallel && targets.len() > 1 {
                targets
                    .into_par_iter()
                    .map(|target| {
                        let outcome = validate_target(engine, &target, ruleset);
                        (target, outcome)
                    })
                    .collect()
            } else {
                let mut outcomes = Vec::with_capacity(targets.len());
                for target in targets {
                    let outcome = validate_target(engine, &target, ruleset);
                    let failed = outcome.is_err();
                    outcomes.push((target, outcome));
                    if failed && options.fail_fast {
                        break;
                    }
                }
                outcomes
            };

        let mut report = ValidationReport::new(ruleset.id());
        for (target, outcome) in outcomes {
            match outcome {
                Ok(violations) => report.add_result(target, violations),
                Err(e) if options.fail_fast => return Err(e),
                Err(e) => {
                    tracing::warn!("Failed to validate {}: {}", target.display(), e);
                    report.add_failure(target, e.to_string());
                }
            }
        }

        report.set_execution_time(start_time.elapsed().as_millis() as u64);
        Ok(report)
    }
}

fn validate_target(
    engine: &dyn ValidationEngine,
    target: &Path,
    ruleset: &Ruleset,
) -> GovernanceResult<Vec<RuleViolation>> {
    let content = fs::read_to_string(target)?;
    engine.validate(&content, ruleset)
}
