//! Evaluation context
//!
//! Read-only snapshot handed to the engine for one evaluation pass. The
//! engine never owns or mutates it.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::rules::RuleOutcome;

/// Wedges selected by the current spin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinSelection {
    pub outer_wedge_id: String,
    /// None on single-wheel setups
    #[serde(default)]
    pub inner_wedge_id: Option<String>,
    #[serde(default)]
    pub outer_label: String,
    #[serde(default)]
    pub inner_label: Option<String>,
}

impl SpinSelection {
    pub fn new(outer_wedge_id: &str, inner_wedge_id: Option<&str>) -> Self {
        Self {
            outer_wedge_id: outer_wedge_id.to_string(),
            inner_wedge_id: inner_wedge_id.map(str::to_string),
            outer_label: String::new(),
            inner_label: None,
        }
    }

    /// Attach display labels
    pub fn with_labels(mut self, outer: &str, inner: Option<&str>) -> Self {
        self.outer_label = outer.to_string();
        self.inner_label = inner.map(str::to_string);
        self
    }
}

/// One past turn, as recorded by the score/history store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResult {
    pub player_id: String,
    pub round_number: u32,
    pub outer_wedge_id: String,
    #[serde(default)]
    pub inner_wedge_id: Option<String>,
    /// Points scored this turn
    pub points: i64,
    pub outcome: RuleOutcome,
}

/// Per-evaluation snapshot. The history is usually lent by the
/// score/history store for the duration of one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEvaluationContext<'a> {
    pub player_id: String,
    pub current_spin: SpinSelection,
    #[serde(default)]
    pub player_score: i64,
    /// Chronological, all players
    #[serde(default)]
    pub game_history: Cow<'a, [TurnResult]>,
    #[serde(default)]
    pub round_number: u32,
}

impl<'a> RuleEvaluationContext<'a> {
    pub fn new(player_id: &str, current_spin: SpinSelection) -> Self {
        Self {
            player_id: player_id.to_string(),
            current_spin,
            player_score: 0,
            game_history: Cow::Borrowed(&[]),
            round_number: 0,
        }
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.player_score = score;
        self
    }

    /// Owned (`Vec`) or lent (`&[TurnResult]`) history
    pub fn with_history(mut self, history: impl Into<Cow<'a, [TurnResult]>>) -> Self {
        self.game_history = history.into();
        self
    }

    pub fn with_round(mut self, round: u32) -> Self {
        self.round_number = round;
        self
    }

    /// This player's turns, oldest first
    pub fn player_history(&self) -> impl Iterator<Item = &TurnResult> {
        self.game_history
            .iter()
            .filter(move |t| t.player_id == self.player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_json_shape() {
        let json = r#"{
            "playerId": "p1",
            "currentSpin": { "outerWedgeId": "gold", "innerWedgeId": "star" },
            "playerScore": 40,
            "roundNumber": 3
        }"#;
        let ctx: RuleEvaluationContext = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.current_spin.inner_wedge_id.as_deref(), Some("star"));
        assert_eq!(ctx.player_score, 40);
        assert!(ctx.game_history.is_empty());
    }

    #[test]
    fn test_player_history_filters() {
        let turn = |player: &str, round| TurnResult {
            player_id: player.to_string(),
            round_number: round,
            outer_wedge_id: "x".to_string(),
            inner_wedge_id: None,
            points: 1,
            outcome: RuleOutcome::Continue,
        };
        let ctx = RuleEvaluationContext::new("p2", SpinSelection::new("x", None))
            .with_history(vec![turn("p1", 1), turn("p2", 1), turn("p1", 2), turn("p2", 2)]);
        let rounds: Vec<u32> = ctx.player_history().map(|t| t.round_number).collect();
        assert_eq!(rounds, vec![1, 2]);
    }

    #[test]
    fn test_lent_history_is_not_copied() {
        let store = vec![TurnResult {
            player_id: "p1".to_string(),
            round_number: 1,
            outer_wedge_id: "x".to_string(),
            inner_wedge_id: None,
            points: 3,
            outcome: RuleOutcome::Win,
        }];
        let ctx = RuleEvaluationContext::new("p1", SpinSelection::new("x", None))
            .with_history(store.as_slice());
        assert!(matches!(ctx.game_history, Cow::Borrowed(_)));
        assert_eq!(ctx.player_history().count(), 1);
    }
}
