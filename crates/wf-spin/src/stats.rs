//! Session statistics

use serde::{Deserialize, Serialize};
use wf_rules::RuleOutcome;

use crate::engine::SpinResult;

/// Running totals over a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub wins: u64,
    pub losses: u64,
    pub continues: u64,
    /// Sum of all score deltas
    pub total_points: i64,
    /// Spins that hit the step ceiling before settling
    pub unsettled_spins: u64,
    pub total_settle_steps: u64,
}

impl SessionStats {
    /// Fold one spin in
    pub fn record(&mut self, result: &SpinResult) {
        self.total_spins += 1;
        match result.verdict.outcome {
            RuleOutcome::Win => self.wins += 1,
            RuleOutcome::Lose => self.losses += 1,
            RuleOutcome::Continue => self.continues += 1,
        }
        self.total_points = self.total_points.saturating_add(result.verdict.score_delta);
        if !result.physics.settled {
            self.unsettled_spins += 1;
        }
        self.total_settle_steps += result.physics.steps;
    }

    /// Mean physics steps per spin
    pub fn average_settle_steps(&self) -> f64 {
        if self.total_spins > 0 {
            self.total_settle_steps as f64 / self.total_spins as f64
        } else {
            0.0
        }
    }

    /// Calculate win rate (%)
    pub fn win_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.wins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats() {
        let stats = SessionStats::default();
        assert_eq!(stats.win_rate(), 0.0);
        assert_eq!(stats.average_settle_steps(), 0.0);
    }

    #[test]
    fn test_rates() {
        let stats = SessionStats {
            total_spins: 4,
            wins: 1,
            total_settle_steps: 1000,
            ..Default::default()
        };
        assert_eq!(stats.win_rate(), 25.0);
        assert_eq!(stats.average_settle_steps(), 250.0);
    }
}
