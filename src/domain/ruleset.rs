//! Ruleset content model
//!
//! Architecture: Value Objects - Rulesets and rules are immutable once constructed
//! - Content is carried as raw bytes together with its declared type
//! - Validity is established by the engine operations, never at construction
//! - Rules are flat entities with no back reference to the ruleset they came from

use crate::domain::violations::RuleSeverity;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared format of a ruleset document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RulesetContentType {
    /// YAML document with a top-level `rules` mapping
    Yaml,
}

impl RulesetContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
        }
    }
}

impl fmt::Display for RulesetContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when free text does not name a known content type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown ruleset content type '{0}'")]
pub struct ParseContentTypeError(pub String);

impl FromStr for RulesetContentType {
    type Err = ParseContentTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(ParseContentTypeError(s.to_string())),
        }
    }
}

/// Raw bytes of a ruleset document plus their declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesetContent {
    content: Vec<u8>,
    content_type: RulesetContentType,
}

impl RulesetContent {
    pub fn new(content: impl Into<Vec<u8>>, content_type: RulesetContentType) -> Self {
        Self {
            content: content.into(),
            content_type,
        }
    }

    /// Shorthand for YAML ruleset content
    pub fn yaml(content: impl Into<Vec<u8>>) -> Self {
        Self::new(content, RulesetContentType::Yaml)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.content
    }

    pub fn content_type(&self) -> RulesetContentType {
        self.content_type
    }

    /// Decode the content as UTF-8 text
    pub fn as_text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.content)
    }
}

/// A named collection of rules submitted for validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ruleset {
    id: String,
    name: String,
    description: Option<String>,
    content: RulesetContent,
}

impl Ruleset {
    pub fn new(id: impl Into<String>, name: impl Into<String>, content: RulesetContent) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            content,
        }
    }

    /// Attach a human-readable description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn content(&self) -> &RulesetContent {
        &self.content
    }
}

/// A single rule extracted from a ruleset document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Identifier generated at extraction time
    pub id: String,
    /// Key of the rule within the `rules` mapping
    pub name: String,
    /// Optional free-text description
    pub description: Option<String>,
    pub severity: RuleSeverity,
    /// The rule's own sub-document, re-serialized as YAML
    pub content: String,
}

impl Rule {
    /// One-line rendering used by listings
    pub fn format_display(&self) -> String {
        match &self.description {
            Some(description) => format!(
                "{} [{}] - {}",
                self.name,
                self.severity.as_str(),
                description
            ),
            None => format!("{} [{}]", self.name, self.severity.as_str()),
        }
    }
}
