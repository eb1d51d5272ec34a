//! Rule Engine
//!
//! Keyed rule store plus the evaluation pass. Rules are stored by id and
//! remember the order in which they were first inserted, which breaks
//! priority ties. Replacing a rule keeps its original rank.

use std::collections::{BTreeMap, HashMap};

use crate::conflict::{self, RuleConflict};
use crate::context::RuleEvaluationContext;
use crate::definition::RuleDefinition;
use crate::rules::Rule;
use crate::validation::{self, ValidationIssue, has_errors};
use crate::verdict::{RuleEvaluationResult, Verdict};
use crate::{RuleError, RuleResult};

/// Rule store and evaluator
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    /// Insertion rank → rule
    rules: BTreeMap<u64, Rule>,
    /// Rule id → insertion rank
    ranks: HashMap<String, u64>,
    next_rank: u64,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from rules, stopping at the first rejected one
    pub fn with_rules(rules: impl IntoIterator<Item = Rule>) -> RuleResult<Self> {
        let mut engine = Self::new();
        for rule in rules {
            engine.add_rule(rule)?;
        }
        Ok(engine)
    }

    /// Validate and store a rule, replacing any rule with the same id.
    /// Returns the warnings that did not block it.
    pub fn add_rule(&mut self, rule: Rule) -> RuleResult<Vec<ValidationIssue>> {
        let issues = validation::validate_rule(&rule);
        if has_errors(&issues) {
            log::debug!("Rejected rule '{}' ({} issues)", rule.id, issues.len());
            return Err(RuleError::Validation(issues));
        }
        for warning in &issues {
            log::warn!("{warning}");
        }

        match self.ranks.get(&rule.id) {
            Some(&rank) => {
                log::debug!("Replaced rule '{}' (priority {})", rule.id, rule.priority);
                self.rules.insert(rank, rule);
            }
            None => {
                let rank = self.next_rank;
                self.next_rank += 1;
                log::debug!("Added rule '{}' (priority {})", rule.id, rule.priority);
                self.ranks.insert(rule.id.clone(), rank);
                self.rules.insert(rank, rule);
            }
        }
        Ok(issues)
    }

    /// Same contract as [`add_rule`](Self::add_rule)
    pub fn update_rule(&mut self, rule: Rule) -> RuleResult<Vec<ValidationIssue>> {
        self.add_rule(rule)
    }

    /// Lower an editor definition and store it
    pub fn add_definition(
        &mut self,
        definition: &RuleDefinition,
    ) -> RuleResult<Vec<ValidationIssue>> {
        let rule = definition.into_rule()?;
        self.add_rule(rule)
    }

    /// Remove a rule; false if it was not stored
    pub fn remove_rule(&mut self, id: &str) -> bool {
        match self.ranks.remove(id) {
            Some(rank) => {
                self.rules.remove(&rank);
                log::debug!("Removed rule '{id}'");
                true
            }
            None => false,
        }
    }

    pub fn get_rule(&self, id: &str) -> Option<&Rule> {
        self.ranks.get(id).and_then(|rank| self.rules.get(rank))
    }

    /// All rules in insertion order
    pub fn get_all_rules(&self) -> Vec<&Rule> {
        self.rules.values().collect()
    }

    /// Active rules, highest priority first, ties by insertion order
    pub fn get_active_rules(&self) -> Vec<&Rule> {
        let mut active: Vec<&Rule> = self.rules.values().filter(|r| r.is_active).collect();
        // Stable sort keeps insertion order within a priority
        active.sort_by(|a, b| b.priority.cmp(&a.priority));
        active
    }

    /// Evaluate active rules in priority order. Stops right after the first
    /// rule that triggers with a win or lose outcome.
    pub fn evaluate_rules(&self, ctx: &RuleEvaluationContext) -> Vec<RuleEvaluationResult> {
        let mut results = Vec::new();
        for rule in self.get_active_rules() {
            let result = RuleEvaluationResult::new(rule, rule.evaluate(ctx));
            let decisive = result.is_decisive();
            results.push(result);
            if decisive {
                log::debug!(
                    "Rule '{}' decided round {} for '{}'",
                    rule.id,
                    ctx.round_number,
                    ctx.player_id
                );
                break;
            }
        }
        results
    }

    /// Evaluate and fold into a verdict
    pub fn verdict(&self, ctx: &RuleEvaluationContext) -> (Vec<RuleEvaluationResult>, Verdict) {
        let results = self.evaluate_rules(ctx);
        let verdict = Verdict::from_results(&results);
        (results, verdict)
    }

    /// Every issue of a rule, stored or not
    pub fn validate_rule(&self, rule: &Rule) -> Vec<ValidationIssue> {
        validation::validate_rule(rule)
    }

    /// Contradictory rule pairs among all stored rules
    pub fn detect_conflicts(&self) -> Vec<RuleConflict> {
        conflict::detect_conflicts(self.rules.values())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Drop all rules
    pub fn clear(&mut self) {
        self.rules.clear();
        self.ranks.clear();
        self.next_rank = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SpinSelection;
    use crate::rules::{ConditionKind, RuleCondition, RuleOutcome, WheelTarget};

    fn on_wedge(id: &str, outcome: RuleOutcome, priority: i32, wedge: &str) -> Rule {
        Rule::new(id, id, outcome)
            .with_priority(priority)
            .with_points(10)
            .with_condition(RuleCondition::new(
                "c",
                ConditionKind::SpecificWedge {
                    wedge_id: wedge.to_string(),
                    wheel: WheelTarget::Both,
                },
            ))
    }

    fn ctx(outer: &str) -> RuleEvaluationContext<'static> {
        RuleEvaluationContext::new("p1", SpinSelection::new(outer, None))
    }

    #[test]
    fn test_add_and_get() {
        let mut engine = RuleEngine::new();
        engine.add_rule(on_wedge("a", RuleOutcome::Win, 10, "gold")).unwrap();
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.get_rule("a").unwrap().priority, 10);
        assert!(engine.get_rule("b").is_none());
    }

    #[test]
    fn test_invalid_rule_rejected_and_not_stored() {
        let mut engine = RuleEngine::new();
        let bad = Rule::new("bad", "Bad", RuleOutcome::Win).with_priority(150);
        let err = engine.add_rule(bad).unwrap_err();
        assert!(err.issues().len() >= 2);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_update_keeps_insertion_rank() {
        let mut engine = RuleEngine::new();
        engine.add_rule(on_wedge("a", RuleOutcome::Win, 10, "gold")).unwrap();
        engine.add_rule(on_wedge("b", RuleOutcome::Win, 10, "gold")).unwrap();
        engine
            .update_rule(on_wedge("a", RuleOutcome::Lose, 10, "iron"))
            .unwrap();

        let ids: Vec<&str> = engine.get_all_rules().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(engine.get_rule("a").unwrap().outcome, RuleOutcome::Lose);
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_failed_update_keeps_old_rule() {
        let mut engine = RuleEngine::new();
        engine.add_rule(on_wedge("a", RuleOutcome::Win, 10, "gold")).unwrap();
        let broken = on_wedge("a", RuleOutcome::Win, 101, "gold");
        assert!(engine.update_rule(broken).is_err());
        assert_eq!(engine.get_rule("a").unwrap().priority, 10);
    }

    #[test]
    fn test_remove_rule() {
        let mut engine = RuleEngine::new();
        engine.add_rule(on_wedge("a", RuleOutcome::Win, 10, "gold")).unwrap();
        assert!(engine.remove_rule("a"));
        assert!(!engine.remove_rule("a"));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_active_rules_sorted_with_stable_ties() {
        let mut engine = RuleEngine::new();
        engine.add_rule(on_wedge("low", RuleOutcome::Win, 5, "x")).unwrap();
        engine.add_rule(on_wedge("tie1", RuleOutcome::Win, 50, "x")).unwrap();
        engine
            .add_rule(on_wedge("off", RuleOutcome::Win, 99, "x").active(false))
            .unwrap();
        engine.add_rule(on_wedge("high", RuleOutcome::Win, 90, "x")).unwrap();
        engine.add_rule(on_wedge("tie2", RuleOutcome::Win, 50, "x")).unwrap();

        let ids: Vec<&str> = engine.get_active_rules().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["high", "tie1", "tie2", "low"]);
    }

    #[test]
    fn test_untriggered_rules_are_reported() {
        let mut engine = RuleEngine::new();
        engine.add_rule(on_wedge("a", RuleOutcome::Win, 90, "gold")).unwrap();
        engine.add_rule(on_wedge("b", RuleOutcome::Lose, 50, "iron")).unwrap();

        let results = engine.evaluate_rules(&ctx("iron"));
        assert_eq!(results.len(), 2);
        assert!(!results[0].triggered);
        assert!(results[1].triggered);
        assert_eq!(results[1].outcome, Some(RuleOutcome::Lose));
    }

    #[test]
    fn test_verdict_helper() {
        let mut engine = RuleEngine::new();
        engine.add_rule(on_wedge("a", RuleOutcome::Win, 90, "gold")).unwrap();
        let (results, verdict) = engine.verdict(&ctx("gold"));
        assert_eq!(results.len(), 1);
        assert!(verdict.is_win());
        assert_eq!(verdict.score_delta, 10);
    }

    #[test]
    fn test_clear() {
        let mut engine = RuleEngine::new();
        engine.add_rule(on_wedge("a", RuleOutcome::Win, 90, "gold")).unwrap();
        engine.clear();
        assert!(engine.is_empty());
        assert!(engine.get_rule("a").is_none());
    }
}
