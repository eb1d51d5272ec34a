//! Editor wire form
//!
//! Rule editors hand over conditions as a `type` string plus an untyped
//! parameter map. Lowering to a typed [`Rule`] reads every parameter once,
//! reporting each missing or mistyped one instead of stopping at the first.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::rules::{
    Comparison, ConditionKind, LogicalOperator, MatchType, Rule, RuleCondition, RuleOutcome,
    WheelTarget,
};
use crate::validation::{ValidationIssue, condition_field, has_errors, validate_rule};
use crate::{RuleError, RuleResult};

/// Condition as produced by an editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub condition_type: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub operator: LogicalOperator,
}

/// Rule as produced by an editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefinition {
    pub id: String,
    pub name: String,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub conditions: Vec<ConditionDefinition>,
    pub outcome: RuleOutcome,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub message: String,
}

fn default_priority() -> i32 {
    50
}

fn default_active() -> bool {
    true
}

/// Parameter reader that records what it could not read
struct Params<'a> {
    rule_id: &'a str,
    index: usize,
    map: &'a Map<String, Value>,
    issues: &'a mut Vec<ValidationIssue>,
}

impl Params<'_> {
    fn fail(&mut self, key: &str, message: String) {
        self.issues.push(ValidationIssue::error(
            self.rule_id,
            condition_field(self.index, key),
            message,
        ));
    }

    fn string(&mut self, key: &str) -> String {
        let map = self.map;
        match map.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                self.fail(key, format!("{key} must be a string, got {other}"));
                String::new()
            }
            None => {
                self.fail(key, format!("{key} is required"));
                String::new()
            }
        }
    }

    fn choice<T>(&mut self, key: &str, allowed: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
        let value = match self.map.get(key) {
            Some(Value::String(s)) => parse(s),
            _ => None,
        };
        if value.is_none() {
            self.fail(key, format!("{key} must be one of {allowed}"));
        }
        value
    }

    fn number(&mut self, key: &str) -> f64 {
        match self.map.get(key).and_then(Value::as_f64) {
            Some(n) => n,
            None => {
                self.fail(key, format!("{key} must be a number"));
                0.0
            }
        }
    }

    fn positive_int(&mut self, key: &str) -> u32 {
        match self.map.get(key).and_then(Value::as_u64) {
            Some(n) if n > 0 && n <= u32::MAX as u64 => n as u32,
            _ => {
                self.fail(key, format!("{key} must be a positive integer"));
                // Placeholder kept invalid so the rule cannot be stored
                0
            }
        }
    }
}

impl ConditionDefinition {
    pub fn new(id: &str, condition_type: &str, parameters: Value) -> Self {
        Self {
            id: id.to_string(),
            condition_type: condition_type.to_string(),
            parameters: match parameters {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            operator: LogicalOperator::And,
        }
    }

    pub fn with_operator(mut self, operator: LogicalOperator) -> Self {
        self.operator = operator;
        self
    }

    fn lower(
        &self,
        rule_id: &str,
        index: usize,
        issues: &mut Vec<ValidationIssue>,
    ) -> RuleCondition {
        let mut p = Params {
            rule_id,
            index,
            map: &self.parameters,
            issues,
        };

        let kind = match self.condition_type.as_str() {
            "specific_wedge" | "avoid_wedge" => {
                let wedge_id = p.string("wedgeId");
                let wheel = p
                    .choice("wheel", "outer, inner, both", WheelTarget::parse)
                    .unwrap_or(WheelTarget::Both);
                if self.condition_type == "specific_wedge" {
                    ConditionKind::SpecificWedge { wedge_id, wheel }
                } else {
                    ConditionKind::AvoidWedge { wedge_id, wheel }
                }
            }
            "wedge_combination" => ConditionKind::WedgeCombination {
                outer_wedge_id: p.string("outerWedgeId"),
                inner_wedge_id: p.string("innerWedgeId"),
                match_type: p
                    .choice("matchType", "exact, any", MatchType::parse)
                    .unwrap_or(MatchType::Exact),
            },
            "score_threshold" => ConditionKind::ScoreThreshold {
                threshold: p.number("threshold"),
                comparison: p
                    .choice("operator", "gte, lte, eq", Comparison::parse)
                    .unwrap_or(Comparison::Gte),
            },
            "consecutive_wins" => ConditionKind::ConsecutiveWins {
                count: p.positive_int("count"),
            },
            other => ConditionKind::Unknown {
                type_name: other.to_string(),
            },
        };

        RuleCondition {
            id: self.id.clone(),
            operator: self.operator,
            kind,
        }
    }
}

impl From<&RuleCondition> for ConditionDefinition {
    fn from(condition: &RuleCondition) -> Self {
        let parameters = match &condition.kind {
            ConditionKind::SpecificWedge { wedge_id, wheel }
            | ConditionKind::AvoidWedge { wedge_id, wheel } => {
                json!({ "wedgeId": wedge_id, "wheel": wheel.as_str() })
            }
            ConditionKind::WedgeCombination {
                outer_wedge_id,
                inner_wedge_id,
                match_type,
            } => json!({
                "outerWedgeId": outer_wedge_id,
                "innerWedgeId": inner_wedge_id,
                "matchType": match_type.as_str(),
            }),
            ConditionKind::ScoreThreshold {
                threshold,
                comparison,
            } => json!({ "threshold": threshold, "operator": comparison.as_str() }),
            ConditionKind::ConsecutiveWins { count } => json!({ "count": count }),
            ConditionKind::Unknown { .. } => json!({}),
        };
        Self::new(&condition.id, condition.kind.type_name(), parameters)
            .with_operator(condition.operator)
    }
}

impl RuleDefinition {
    /// Lower to a typed rule, collecting parameter issues
    pub fn lower(&self) -> (Rule, Vec<ValidationIssue>) {
        let mut issues = Vec::new();
        let conditions = self
            .conditions
            .iter()
            .enumerate()
            .map(|(index, c)| c.lower(&self.id, index, &mut issues))
            .collect();

        let rule = Rule {
            id: self.id.clone(),
            name: self.name.clone(),
            priority: self.priority,
            is_active: self.is_active,
            conditions,
            outcome: self.outcome,
            points: self.points,
            message: self.message.clone(),
        };
        (rule, issues)
    }

    /// Every issue of this definition: parameter shape plus rule validation.
    /// A field already reported while reading parameters is not repeated.
    pub fn check(&self) -> Vec<ValidationIssue> {
        let (rule, mut issues) = self.lower();
        for issue in validate_rule(&rule) {
            if !issues.iter().any(|known| known.field == issue.field) {
                issues.push(issue);
            }
        }
        issues
    }

    /// Typed rule, or every blocking issue
    pub fn into_rule(&self) -> RuleResult<Rule> {
        let issues = self.check();
        if has_errors(&issues) {
            return Err(RuleError::Validation(issues));
        }
        for warning in &issues {
            log::warn!("{warning}");
        }
        Ok(self.lower().0)
    }
}

impl From<&Rule> for RuleDefinition {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id.clone(),
            name: rule.name.clone(),
            priority: rule.priority,
            is_active: rule.is_active,
            conditions: rule.conditions.iter().map(ConditionDefinition::from).collect(),
            outcome: rule.outcome,
            points: rule.points,
            message: rule.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Severity;

    fn gold_rule_json() -> &'static str {
        r#"{
            "id": "gold",
            "name": "Gold outer",
            "priority": 80,
            "outcome": "win",
            "points": 50,
            "message": "Gold!",
            "conditions": [
                { "id": "c1", "type": "specific_wedge",
                  "parameters": { "wedgeId": "gold", "wheel": "outer" } },
                { "id": "c2", "type": "score_threshold", "operator": "NOT",
                  "parameters": { "threshold": 500, "operator": "gte" } }
            ]
        }"#
    }

    #[test]
    fn test_definition_lowers_to_typed_rule() {
        let def: RuleDefinition = serde_json::from_str(gold_rule_json()).unwrap();
        let rule = def.into_rule().unwrap();

        assert_eq!(rule.priority, 80);
        assert!(rule.is_active);
        assert_eq!(
            rule.conditions[0].kind,
            ConditionKind::SpecificWedge {
                wedge_id: "gold".to_string(),
                wheel: WheelTarget::Outer,
            }
        );
        assert_eq!(rule.conditions[1].operator, LogicalOperator::Not);
        assert_eq!(
            rule.conditions[1].kind,
            ConditionKind::ScoreThreshold {
                threshold: 500.0,
                comparison: Comparison::Gte,
            }
        );
    }

    #[test]
    fn test_typed_rule_back_to_definition() {
        let def: RuleDefinition = serde_json::from_str(gold_rule_json()).unwrap();
        let rule = def.into_rule().unwrap();
        let back = RuleDefinition::from(&rule);
        assert_eq!(back.into_rule().unwrap(), rule);
    }

    #[test]
    fn test_missing_and_mistyped_parameters_all_reported() {
        let def = RuleDefinition {
            id: "bad".to_string(),
            name: "Bad".to_string(),
            priority: 10,
            is_active: true,
            conditions: vec![
                ConditionDefinition::new("c1", "specific_wedge", json!({ "wheel": "left" })),
                ConditionDefinition::new(
                    "c2",
                    "wedge_combination",
                    json!({ "outerWedgeId": 4, "innerWedgeId": "star", "matchType": "some" }),
                ),
                ConditionDefinition::new("c3", "score_threshold", json!({ "threshold": "high" })),
                ConditionDefinition::new("c4", "consecutive_wins", json!({ "count": -2 })),
            ],
            outcome: RuleOutcome::Lose,
            points: 0,
            message: String::new(),
        };

        let issues = def.check();
        let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "conditions[0].wedgeId",
                "conditions[0].wheel",
                "conditions[1].outerWedgeId",
                "conditions[1].matchType",
                "conditions[2].threshold",
                "conditions[2].operator",
                "conditions[3].count",
            ]
        );

        let err = def.into_rule().unwrap_err();
        assert_eq!(err.issues().len(), 7);
    }

    #[test]
    fn test_unknown_type_is_a_warning() {
        let def = RuleDefinition {
            id: "odd".to_string(),
            name: "Odd".to_string(),
            priority: 10,
            is_active: true,
            conditions: vec![ConditionDefinition::new("c1", "full_moon", json!({}))],
            outcome: RuleOutcome::Win,
            points: 1,
            message: String::new(),
        };
        let issues = def.check();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);

        let rule = def.into_rule().unwrap();
        assert_eq!(rule.conditions[0].kind.type_name(), "full_moon");
    }

    #[test]
    fn test_defaults_fill_optional_fields() {
        let def: RuleDefinition = serde_json::from_str(
            r#"{ "id": "r", "name": "R", "outcome": "continue",
                 "conditions": [ { "type": "consecutive_wins", "parameters": { "count": 3 } } ] }"#,
        )
        .unwrap();
        assert_eq!(def.priority, 50);
        assert!(def.is_active);
        assert_eq!(def.conditions[0].operator, LogicalOperator::And);
        assert!(def.check().is_empty());
    }
}
