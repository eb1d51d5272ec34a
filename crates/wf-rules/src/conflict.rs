//! Conflict detection
//!
//! Two rules conflict when they share a priority, hand down different
//! outcomes and check the same thing: at least one condition of each has
//! the same type and identical parameters. Which of them fires first then
//! depends on insertion order alone.
//!
//! Pairwise scan over rules and their conditions; rule sets hold tens of
//! rules, not thousands.

use serde::{Deserialize, Serialize};

use crate::rules::Rule;
use crate::validation::Severity;

/// Conflict category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    ContradictoryOutcomes,
}

/// A detected conflict between rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConflict {
    pub kind: ConflictKind,
    pub rule_ids: Vec<String>,
    pub severity: Severity,
    pub message: String,
}

/// At least one structurally identical condition on both sides
fn conditions_overlap(a: &Rule, b: &Rule) -> bool {
    a.conditions
        .iter()
        .any(|ca| b.conditions.iter().any(|cb| ca.same_check(cb)))
}

/// Scan rules in the given order; each conflicting pair is reported once
pub fn detect_conflicts<'a>(rules: impl IntoIterator<Item = &'a Rule>) -> Vec<RuleConflict> {
    let rules: Vec<&Rule> = rules.into_iter().collect();
    let mut conflicts = Vec::new();

    for (i, a) in rules.iter().enumerate() {
        for b in &rules[i + 1..] {
            if a.priority != b.priority || a.outcome == b.outcome {
                continue;
            }
            if !conditions_overlap(a, b) {
                continue;
            }
            conflicts.push(RuleConflict {
                kind: ConflictKind::ContradictoryOutcomes,
                rule_ids: vec![a.id.clone(), b.id.clone()],
                severity: Severity::Error,
                message: format!(
                    "Rules '{}' ({}) and '{}' ({}) share priority {} and match the same condition",
                    a.id, a.outcome, b.id, b.outcome, a.priority
                ),
            });
        }
    }

    conflicts
}
