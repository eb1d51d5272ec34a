//! Rule validation
//!
//! Validation never stops at the first problem: every violated field is
//! reported so an editor can show them all at once.

use serde::{Deserialize, Serialize};

use crate::rules::{ConditionKind, LogicalOperator, Rule};
use crate::{MAX_PRIORITY, MIN_PRIORITY};

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Reported, does not block storing the rule
    Warning,
    /// Blocks storing the rule
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// One field-level problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub rule_id: String,
    /// Editor field path, e.g. `conditions[1].wedgeId`
    pub field: String,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    pub fn error(rule_id: &str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            field: field.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(rule_id: &str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            field: field.into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}.{}: {}",
            self.severity.as_str(),
            self.rule_id,
            self.field,
            self.message
        )
    }
}

/// True if any issue blocks the rule
pub fn has_errors(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(ValidationIssue::is_error)
}

/// Field path of a condition parameter
pub(crate) fn condition_field(index: usize, key: &str) -> String {
    format!("conditions[{index}].{key}")
}

/// Check a rule and report every problem found
pub fn validate_rule(rule: &Rule) -> Vec<ValidationIssue> {
    let id = rule.id.as_str();
    let mut issues = Vec::new();

    if id.trim().is_empty() {
        issues.push(ValidationIssue::error(id, "id", "Rule id must not be empty"));
    }
    if rule.name.trim().is_empty() {
        issues.push(ValidationIssue::error(id, "name", "Rule name must not be empty"));
    }
    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&rule.priority) {
        issues.push(ValidationIssue::error(
            id,
            "priority",
            format!(
                "Priority must be between {MIN_PRIORITY} and {MAX_PRIORITY}, got {}",
                rule.priority
            ),
        ));
    }
    if rule.conditions.is_empty() {
        issues.push(ValidationIssue::error(
            id,
            "conditions",
            "Rule needs at least one condition",
        ));
    }

    for (index, condition) in rule.conditions.iter().enumerate() {
        if index == 0 && condition.operator == LogicalOperator::Not {
            issues.push(ValidationIssue::warning(
                id,
                condition_field(index, "operator"),
                "Operator on the first condition has no effect; NOT does not negate it",
            ));
        }
        validate_kind(id, index, &condition.kind, &mut issues);
    }

    issues
}

fn validate_kind(id: &str, index: usize, kind: &ConditionKind, issues: &mut Vec<ValidationIssue>) {
    let blank = |key: &str, issues: &mut Vec<ValidationIssue>| {
        issues.push(ValidationIssue::error(
            id,
            condition_field(index, key),
            format!("{key} must not be empty"),
        ));
    };

    match kind {
        ConditionKind::SpecificWedge { wedge_id, .. }
        | ConditionKind::AvoidWedge { wedge_id, .. } => {
            if wedge_id.trim().is_empty() {
                blank("wedgeId", issues);
            }
        }
        ConditionKind::WedgeCombination {
            outer_wedge_id,
            inner_wedge_id,
            ..
        } => {
            if outer_wedge_id.trim().is_empty() {
                blank("outerWedgeId", issues);
            }
            if inner_wedge_id.trim().is_empty() {
                blank("innerWedgeId", issues);
            }
        }
        ConditionKind::ScoreThreshold { threshold, .. } => {
            if !threshold.is_finite() {
                issues.push(ValidationIssue::error(
                    id,
                    condition_field(index, "threshold"),
                    format!("threshold must be a finite number, got {threshold}"),
                ));
            }
        }
        ConditionKind::ConsecutiveWins { count } => {
            if *count == 0 {
                issues.push(ValidationIssue::error(
                    id,
                    condition_field(index, "count"),
                    "count must be a positive integer",
                ));
            }
        }
        ConditionKind::Unknown { type_name } => {
            issues.push(ValidationIssue::warning(
                id,
                condition_field(index, "type"),
                format!("Unknown condition type '{type_name}' always evaluates to false"),
            ));
        }
    }
}
