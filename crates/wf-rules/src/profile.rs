//! Profile System
//!
//! Load and save versioned rule sets from/to JSON.

use serde::{Deserialize, Serialize};

use crate::definition::RuleDefinition;
use crate::engine::RuleEngine;
use crate::validation::{ValidationIssue, has_errors};
use crate::{RuleError, RuleResult};

/// Profile format version
pub const PROFILE_VERSION: &str = "1.0";

/// Named, versioned rule set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleProfile {
    /// Profile format version
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

fn default_version() -> String {
    PROFILE_VERSION.to_string()
}

impl Default for RuleProfile {
    fn default() -> Self {
        Self {
            version: PROFILE_VERSION.to_string(),
            name: String::new(),
            rules: Vec::new(),
        }
    }
}

impl RuleProfile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Snapshot an engine's rules in insertion order
    pub fn from_engine(name: &str, engine: &RuleEngine) -> Self {
        Self {
            name: name.to_string(),
            rules: engine
                .get_all_rules()
                .into_iter()
                .map(RuleDefinition::from)
                .collect(),
            ..Default::default()
        }
    }

    /// Load profile from JSON string
    pub fn from_json(json: &str) -> RuleResult<Self> {
        let raw: serde_json::Value = serde_json::from_str(json)?;

        let version = raw["version"].as_str().unwrap_or(PROFILE_VERSION);
        if version != PROFILE_VERSION {
            return Err(RuleError::Profile(format!(
                "Unknown profile version: {version}"
            )));
        }
        Ok(serde_json::from_value(raw)?)
    }

    /// Save profile to JSON string
    pub fn to_json(&self) -> RuleResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn add_rule(&mut self, rule: RuleDefinition) {
        self.rules.push(rule);
    }

    /// Every issue across all rules, including duplicate ids
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for (i, rule) in self.rules.iter().enumerate() {
            if self.rules[..i].iter().any(|earlier| earlier.id == rule.id) {
                issues.push(ValidationIssue::error(
                    &rule.id,
                    "id",
                    format!("Duplicate rule id '{}' in profile", rule.id),
                ));
            }
            issues.extend(rule.check());
        }
        issues
    }

    /// Build an engine; fails with every blocking issue of every rule
    pub fn into_engine(&self) -> RuleResult<RuleEngine> {
        let issues = self.validate();
        if has_errors(&issues) {
            return Err(RuleError::Validation(issues));
        }
        let mut engine = RuleEngine::new();
        for rule in &self.rules {
            engine.add_definition(rule)?;
        }
        log::debug!(
            "Loaded rule profile '{}' ({} rules)",
            self.name,
            engine.len()
        );
        Ok(engine)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ConditionDefinition;
    use crate::rules::RuleOutcome;
    use serde_json::json;

    fn definition(id: &str, priority: i32) -> RuleDefinition {
        RuleDefinition {
            id: id.to_string(),
            name: format!("Rule {id}"),
            priority,
            is_active: true,
            conditions: vec![ConditionDefinition::new(
                "c1",
                "specific_wedge",
                json!({ "wedgeId": "gold", "wheel": "outer" }),
            )],
            outcome: RuleOutcome::Win,
            points: 25,
            message: "Gold".to_string(),
        }
    }

    #[test]
    fn test_profile_serialization() {
        let mut profile = RuleProfile::new("Double wheel");
        profile.add_rule(definition("gold", 70));

        let json = profile.to_json().unwrap();
        assert!(json.contains("\"version\": \"1.0\""));
        assert!(json.contains("wedgeId"));

        let loaded = RuleProfile::from_json(&json).unwrap();
        assert_eq!(loaded, profile);
    }

    #[test]
    fn test_missing_version_defaults() {
        let loaded = RuleProfile::from_json(r#"{ "name": "bare", "rules": [] }"#).unwrap();
        assert_eq!(loaded.version, PROFILE_VERSION);
        assert_eq!(loaded.name, "bare");
    }

    #[test]
    fn test_unknown_version_rejected() {
        let err = RuleProfile::from_json(r#"{ "version": "9.0", "rules": [] }"#).unwrap_err();
        assert!(matches!(err, RuleError::Profile(_)));
    }

    #[test]
    fn test_into_engine_aggregates_issues() {
        let mut profile = RuleProfile::new("broken");
        profile.add_rule(definition("a", 120));
        profile.add_rule(definition("b", 10));
        profile.add_rule(definition("b", 20));

        let err = profile.into_engine().unwrap_err();
        let issues = err.issues();
        assert!(issues.iter().any(|i| i.rule_id == "a" && i.field == "priority"));
        assert!(issues.iter().any(|i| i.rule_id == "b" && i.field == "id"));
    }

    #[test]
    fn test_engine_round_trip() {
        let mut profile = RuleProfile::new("ok");
        profile.add_rule(definition("a", 70));
        profile.add_rule(definition("b", 30));

        let engine = profile.into_engine().unwrap();
        assert_eq!(engine.len(), 2);
        let snapshot = RuleProfile::from_engine("ok", &engine);
        assert_eq!(snapshot.rules, profile.rules);
    }
}
