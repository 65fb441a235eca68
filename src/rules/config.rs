//! Rule set configuration
//!
//! Rule sets are read from TOML, or taken from the built-in presets that
//! mirror the stock hooks.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{CardinalityRule, RequiredPairRule};
use crate::template::PropertyPath;

/// Errors that can occur when loading a rule set
#[derive(Error, Debug)]
pub enum RuleSetError {
    #[error("Failed to read rule set file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse rule set TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Unknown rule set preset '{0}' (expected one of: default, event-bus-policy, lambda-multi-az)")]
    UnknownPreset(String),
}

/// Named collection of rules, shared read-only across evaluations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    pub name: Option<String>,
    pub required_pairs: Vec<RequiredPairRule>,
    pub cardinality: Vec<CardinalityRule>,
}

/// TOML structure for deserializing rule sets
#[derive(Deserialize)]
struct TomlRuleSet {
    metadata: Option<TomlMetadata>,
    #[serde(default)]
    required_pair: Vec<RequiredPairRule>,
    #[serde(default)]
    cardinality: Vec<CardinalityRule>,
}

#[derive(Deserialize)]
struct TomlMetadata {
    name: Option<String>,
}

impl RuleSet {
    /// A rule set with no rules; everything is compliant
    pub fn empty() -> Self {
        Self {
            name: None,
            required_pairs: Vec::new(),
            cardinality: Vec::new(),
        }
    }

    /// Load a rule set from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, RuleSetError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a rule set from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, RuleSetError> {
        let parsed: TomlRuleSet = toml::from_str(content)?;

        Ok(RuleSet {
            name: parsed.metadata.and_then(|m| m.name),
            required_pairs: parsed.required_pair,
            cardinality: parsed.cardinality,
        })
    }

    /// Look up a built-in rule set by name
    pub fn preset(name: &str) -> Result<Self, RuleSetError> {
        match name {
            "default" => Ok(Self::default()),
            "event-bus-policy" => Ok(Self::event_bus_policy()),
            "lambda-multi-az" => Ok(Self::lambda_multi_az()),
            other => Err(RuleSetError::UnknownPreset(other.to_string())),
        }
    }

    /// An event bus must ship with a bus policy
    pub fn event_bus_policy() -> Self {
        Self {
            name: Some("event-bus-policy".to_string()),
            required_pairs: vec![RequiredPairRule::new(
                "AWS::Events::EventBus",
                "AWS::Events::EventBusPolicy",
            )],
            cardinality: Vec::new(),
        }
    }

    /// VPC-attached functions must span at least two subnets
    pub fn lambda_multi_az() -> Self {
        let subnets = PropertyPath::new(["VpcConfig", "SubnetIds"])
            .expect("static property path should be valid");
        Self {
            name: Some("lambda-multi-az".to_string()),
            required_pairs: Vec::new(),
            cardinality: vec![CardinalityRule::new("AWS::Lambda::Function", subnets, 2)],
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_required_pair(mut self, rule: RequiredPairRule) -> Self {
        self.required_pairs.push(rule);
        self
    }

    pub fn with_cardinality(mut self, rule: CardinalityRule) -> Self {
        self.cardinality.push(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.required_pairs.len() + self.cardinality.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RuleSet {
    /// Both stock hooks combined
    fn default() -> Self {
        let lambda = Self::lambda_multi_az();
        Self {
            name: Some("default".to_string()),
            cardinality: lambda.cardinality,
            ..Self::event_bus_policy()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_rule_set() {
        let rules = RuleSet::default();
        assert_eq!(rules.name.as_deref(), Some("default"));
        assert_eq!(rules.required_pairs.len(), 1);
        assert_eq!(rules.cardinality.len(), 1);
        assert_eq!(rules.cardinality[0].property_path.to_string(), "VpcConfig.SubnetIds");
        assert_eq!(rules.cardinality[0].min_count, 2);
    }

    #[test]
    fn test_parse_toml_rule_set() {
        let toml_str = r#"
[metadata]
name = "network-guard"

[[required_pair]]
required_type = "AWS::Events::EventBus"
dependent_type = "AWS::Events::EventBusPolicy"

[[cardinality]]
target_type = "AWS::Lambda::Function"
property_path = "VpcConfig.SubnetIds"
min_count = 3
"#;
        let rules = RuleSet::from_str(toml_str).expect("Should parse");
        assert_eq!(rules.name.as_deref(), Some("network-guard"));
        assert_eq!(
            rules.required_pairs,
            vec![RequiredPairRule::new(
                "AWS::Events::EventBus",
                "AWS::Events::EventBusPolicy"
            )]
        );
        assert_eq!(rules.cardinality[0].min_count, 3);
        assert_eq!(
            rules.cardinality[0].property_path.segments(),
            &["VpcConfig", "SubnetIds"]
        );
    }

    #[test]
    fn test_parse_toml_without_metadata_or_rules() {
        let rules = RuleSet::from_str("").expect("Should parse");
        assert_eq!(rules.name, None);
        assert!(rules.is_empty());
    }

    #[test]
    fn test_invalid_property_path_rejected() {
        let toml_str = r#"
[[cardinality]]
target_type = "AWS::Lambda::Function"
property_path = "VpcConfig..SubnetIds"
min_count = 2
"#;
        let err = RuleSet::from_str(toml_str).unwrap_err();
        assert!(err.to_string().contains("empty segment"), "got: {}", err);
    }

    #[test]
    fn test_invalid_toml_error() {
        assert!(RuleSet::from_str("this is not valid toml {{{{").is_err());
    }

    #[test]
    fn test_presets() {
        assert_eq!(RuleSet::preset("lambda-multi-az").unwrap(), RuleSet::lambda_multi_az());
        assert!(matches!(
            RuleSet::preset("nope"),
            Err(RuleSetError::UnknownPreset(_))
        ));
    }

    #[test]
    fn test_builder() {
        let rules = RuleSet::empty()
            .with_name("custom")
            .with_required_pair(RequiredPairRule::new("A::B::C", "A::B::D"));
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.name.as_deref(), Some("custom"));
    }
}
