//! Evaluation results and the turn verdict

use serde::{Deserialize, Serialize};

use crate::rules::{Rule, RuleOutcome};

/// Result of evaluating one rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEvaluationResult {
    pub rule_id: String,
    pub rule_name: String,
    pub triggered: bool,
    pub priority: i32,
    /// Set only when triggered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RuleOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RuleEvaluationResult {
    pub fn new(rule: &Rule, triggered: bool) -> Self {
        Self {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            triggered,
            priority: rule.priority,
            outcome: triggered.then_some(rule.outcome),
            points: triggered.then_some(rule.points),
            message: triggered.then(|| rule.message.clone()),
        }
    }

    /// Triggered with a win or lose outcome
    #[inline]
    pub fn is_decisive(&self) -> bool {
        self.triggered && self.outcome.is_some_and(RuleOutcome::is_decisive)
    }
}

/// Outcome of a turn, folded from the evaluation results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub outcome: RuleOutcome,
    /// Sum of points of every triggered rule
    pub score_delta: i64,
    /// Non-empty messages of triggered rules, in evaluation order
    pub messages: Vec<String>,
    /// Rule that decided the turn
    pub decisive_rule: Option<String>,
}

impl Default for Verdict {
    fn default() -> Self {
        Self {
            outcome: RuleOutcome::Continue,
            score_delta: 0,
            messages: Vec::new(),
            decisive_rule: None,
        }
    }
}

impl Verdict {
    pub fn from_results(results: &[RuleEvaluationResult]) -> Self {
        let mut verdict = Self::default();
        for result in results.iter().filter(|r| r.triggered) {
            verdict.score_delta = verdict.score_delta.saturating_add(result.points.unwrap_or(0));
            if let Some(message) = result.message.as_deref()
                && !message.is_empty()
            {
                verdict.messages.push(message.to_string());
            }
            if result.is_decisive() && verdict.decisive_rule.is_none() {
                verdict.outcome = result.outcome.unwrap_or(RuleOutcome::Continue);
                verdict.decisive_rule = Some(result.rule_id.clone());
            }
        }
        verdict
    }

    #[inline]
    pub fn is_win(&self) -> bool {
        self.outcome == RuleOutcome::Win
    }

    #[inline]
    pub fn is_loss(&self) -> bool {
        self.outcome == RuleOutcome::Lose
    }
}
