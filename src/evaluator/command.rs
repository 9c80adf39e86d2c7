//! Subprocess binding of the rule evaluator
//!
//! The configured program is run once per call with a trailing mode argument
//! (`ruleset` or `document`). The request is a JSON object on stdin and the
//! evaluator's JSON result is read from stdout. Exit status 2 signals content
//! that is not YAML/JSON, exit status 3 signals an invalid ruleset.

use super::{EvaluatorError, RuleEvaluator};
use anyhow::{anyhow, Context};
use serde::Serialize;
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

const EXIT_INVALID_CONTENT_TYPE: i32 = 2;
const EXIT_INVALID_RULESET: i32 = 3;

#[derive(Serialize)]
struct EvaluationRequest<'a> {
    ruleset: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<&'a str>,
}

/// Rule evaluator backed by an external program
#[derive(Debug, Clone)]
pub struct CommandEvaluator {
    program: String,
    args: Vec<String>,
}

impl CommandEvaluator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn run(&self, mode: &str, request: &EvaluationRequest<'_>) -> Result<String, EvaluatorError> {
        let payload = serde_json::to_vec(request)
            .context("Failed to encode evaluator request")
            .map_err(EvaluatorError::failed)?;

        tracing::debug!("Invoking evaluator '{}' in {} mode", self.program, mode);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(mode)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start evaluator '{}'", self.program))
            .map_err(EvaluatorError::failed)?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("Evaluator stdin was not captured"))
            .map_err(EvaluatorError::failed)?;

        // Stdin is fed concurrently; an evaluator may exit without reading it
        let output = std::thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(&payload));
            let output = child.wait_with_output();
            let written = match writer.join() {
                Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                Ok(written) => written,
                Err(_) => Err(std::io::Error::other("stdin writer panicked")),
            };
            output.and_then(|output| written.map(|()| output))
        })
        .with_context(|| format!("Failed to communicate with evaluator '{}'", self.program))
        .map_err(EvaluatorError::failed)?;

        match output.status.code() {
            Some(0) => String::from_utf8(output.stdout)
                .context("Evaluator output is not UTF-8")
                .map_err(EvaluatorError::failed),
            Some(EXIT_INVALID_CONTENT_TYPE) => Err(EvaluatorError::InvalidContentType),
            Some(EXIT_INVALID_RULESET) => Err(EvaluatorError::InvalidRuleset),
            status => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(EvaluatorError::failed(anyhow!(
                    "Evaluator '{}' exited with {}: {}",
                    self.program,
                    status.map_or_else(|| "a signal".to_string(), |code| format!("status {code}")),
                    stderr.trim()
                )))
            }
        }
    }
}

impl RuleEvaluator for CommandEvaluator {
    fn validate_ruleset(&self, ruleset: &str) -> Result<String, EvaluatorError> {
        self.run(
            "ruleset",
            &EvaluationRequest {
                ruleset,
                document: None,
            },
        )
    }

    fn validate_document(&self, target: &str, ruleset: &str) -> Result<String, EvaluatorError> {
        self.run(
            "document",
            &EvaluationRequest {
                ruleset,
                document: Some(target),
            },
        )
    }
}
