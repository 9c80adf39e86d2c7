//! YAML rule extraction
//!
//! Architecture: Anti-Corruption Layer - Ruleset YAML is projected onto clean Rule entities
//! - The document is read as a generic YAML tree, only `rules` is interpreted
//! - Each rule keeps its own sub-document verbatim for independent re-evaluation
//! - Extraction is all-or-nothing: one bad rule fails the whole call
//! - A repeated rule name keeps its last entry, as with any YAML mapping

use crate::domain::ruleset::Rule;
use crate::domain::violations::{GovernanceError, GovernanceResult, RuleSeverity};
use serde::de::{
    self, Deserialize, Deserializer, EnumAccess, MapAccess, SeqAccess, VariantAccess, Visitor,
};
use serde_yaml::value::{Tag, TaggedValue};
use serde_yaml::{Mapping, Value};
use std::fmt;
use uuid::Uuid;

const RULES_KEY: &str = "rules";

/// Extracts rule entities from YAML ruleset text
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlRuleExtractor;

impl YamlRuleExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract all rules in document key order
    pub fn extract(&self, ruleset_text: &str) -> GovernanceResult<Vec<Rule>> {
        let document = serde_yaml::from_str::<LenientValue>(ruleset_text)
            .map(|document| document.0)
            .map_err(|e| GovernanceError::extraction(format!("Ruleset is not valid YAML: {e}")))?;

        let root = match document {
            Value::Null => return Ok(Vec::new()),
            Value::Mapping(root) => root,
            other => {
                return Err(GovernanceError::extraction(format!(
                    "Ruleset document must be a mapping, found {}",
                    describe(&other)
                )))
            }
        };

        let rules = match root.get(RULES_KEY) {
            Some(Value::Mapping(rules)) => rules,
            _ => return Ok(Vec::new()),
        };

        rules
            .iter()
            .map(|(key, details)| {
                let name = rule_name(key)?;
                build_rule(name, details)
            })
            .collect()
    }
}

/// Rule names are the mapping keys; scalar keys keep their textual form
fn rule_name(key: &Value) -> GovernanceResult<String> {
    match key {
        Value::String(name) => Ok(name.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(GovernanceError::extraction(format!(
            "Rule names must be scalar keys, found {}",
            describe(other)
        ))),
    }
}

fn build_rule(name: String, details: &Value) -> GovernanceResult<Rule> {
    let Value::Mapping(fields) = details else {
        return Err(GovernanceError::extraction(format!(
            "Rule '{name}' must be a mapping of rule details, found {}",
            describe(details)
        )));
    };

    let description = optional_text(fields, "description", &name)?;

    let severity = match optional_text(fields, "severity", &name)? {
        Some(token) => token.parse::<RuleSeverity>().map_err(|e| {
            GovernanceError::extraction(format!("Rule '{name}' has an invalid severity: {e}"))
        })?,
        None => {
            return Err(GovernanceError::extraction(format!(
                "Rule '{name}' does not declare a severity"
            )))
        }
    };

    let content = serde_yaml::to_string(details).map_err(|e| {
        GovernanceError::extraction(format!("Failed to serialize content of rule '{name}': {e}"))
    })?;

    Ok(Rule {
        id: Uuid::new_v4().to_string(),
        name,
        description,
        severity,
        content,
    })
}

fn optional_text(fields: &Mapping, key: &str, rule: &str) -> GovernanceResult<Option<String>> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(other) => Err(GovernanceError::extraction(format!(
            "Field '{key}' of rule '{rule}' must be text, found {}",
            describe(other)
        ))),
    }
}

/// YAML tree where a repeated mapping key replaces the earlier entry
struct LenientValue(Value);

impl<'de> Deserialize<'de> for LenientValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LenientVisitor).map(LenientValue)
    }
}

struct LenientVisitor;

impl<'de> Visitor<'de> for LenientVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("any YAML value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        LenientValue::deserialize(deserializer).map(|value| value.0)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(LenientValue(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut mapping = Mapping::new();
        while let Some((LenientValue(key), LenientValue(value))) = map.next_entry()? {
            mapping.insert(key, value);
        }
        Ok(Value::Mapping(mapping))
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Value, A::Error> {
        let (tag, variant): (String, _) = data.variant()?;
        let LenientValue(value) = variant.newtype_variant()?;
        Ok(Value::Tagged(Box::new(TaggedValue {
            tag: Tag::new(tag),
            value,
        })))
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
