//! Probability vs. drawn size
//!
//! A wedge drawn at 90° looks like a 25% chance. When its weight says
//! otherwise the editor should warn; this module computes how far each
//! wedge's real probability sits from its visual share.

use serde::{Deserialize, Serialize};
use wf_core::{WfResult, Wheel};

use crate::selector::validate_weights;

/// Deviation thresholds, in absolute probability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceThresholds {
    /// Largest deviation still considered balanced
    #[serde(default = "default_low")]
    pub low: f64,
    /// Largest deviation considered a moderate imbalance
    #[serde(default = "default_medium")]
    pub medium: f64,
}

fn default_low() -> f64 {
    0.05
}
fn default_medium() -> f64 {
    0.10
}

impl Default for BalanceThresholds {
    fn default() -> Self {
        Self {
            low: 0.05,
            medium: 0.10,
        }
    }
}

impl BalanceThresholds {
    /// Classify a deviation
    pub fn rate(&self, deviation: f64) -> BalanceRating {
        if deviation <= self.low {
            BalanceRating::Balanced
        } else if deviation <= self.medium {
            BalanceRating::Moderate
        } else {
            BalanceRating::Severe
        }
    }
}

/// Balance classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceRating {
    Balanced,
    Moderate,
    Severe,
}

impl BalanceRating {
    /// True unless balanced
    pub fn is_imbalanced(self) -> bool {
        self != Self::Balanced
    }
}

/// Balance of a single wedge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WedgeBalance {
    pub wedge_id: String,
    pub weight: f64,
    /// Exact selection probability (weight / total)
    pub probability: f64,
    /// Drawn share (visual angle / 360)
    pub visual_share: f64,
    /// |probability - visual_share|
    pub deviation: f64,
    pub rating: BalanceRating,
}

/// Balance of a whole wheel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub wheel_id: String,
    pub entries: Vec<WedgeBalance>,
    pub max_deviation: f64,
    /// Worst rating among the wedges
    pub rating: BalanceRating,
}

impl BalanceReport {
    /// Wedges that are not balanced
    pub fn imbalanced(&self) -> impl Iterator<Item = &WedgeBalance> {
        self.entries.iter().filter(|e| e.rating.is_imbalanced())
    }
}

/// Exact probability of each weight
pub fn probabilities(weights: &[f64]) -> WfResult<Vec<f64>> {
    let total = validate_weights(weights)?;
    Ok(weights.iter().map(|w| w / total).collect())
}

/// Compare every wedge's probability with its drawn share. Rejects a
/// wheel that fails [`Wheel::validate`].
pub fn analyze_wheel(wheel: &Wheel, thresholds: &BalanceThresholds) -> WfResult<BalanceReport> {
    wheel.validate()?;
    let probs = probabilities(&wheel.weights())?;

    let entries: Vec<WedgeBalance> = wheel
        .wedges
        .iter()
        .zip(probs)
        .enumerate()
        .map(|(index, (wedge, probability))| {
            let visual_share = wheel.visual_share(index);
            let deviation = (probability - visual_share).abs();
            WedgeBalance {
                wedge_id: wedge.id.clone(),
                weight: wedge.weight,
                probability,
                visual_share,
                deviation,
                rating: thresholds.rate(deviation),
            }
        })
        .collect();

    let max_deviation = entries.iter().map(|e| e.deviation).fold(0.0, f64::max);
    let rating = entries
        .iter()
        .map(|e| e.rating)
        .max()
        .unwrap_or(BalanceRating::Balanced);

    if rating.is_imbalanced() {
        log::debug!(
            "Wheel '{}' is {:?}: max deviation {:.3}",
            wheel.id,
            rating,
            max_deviation
        );
    }

    Ok(BalanceReport {
        wheel_id: wheel.id.clone(),
        entries,
        max_deviation,
        rating,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use wf_core::{Wedge, WfError};

    #[test]
    fn test_probabilities() {
        let probs = probabilities(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_relative_eq!(probs[0], 0.1);
        assert_relative_eq!(probs[3], 0.4);
        assert!(probabilities(&[]).is_err());
    }

    #[test]
    fn test_thresholds() {
        let t = BalanceThresholds::default();
        assert_eq!(t.rate(0.0), BalanceRating::Balanced);
        assert_eq!(t.rate(0.05), BalanceRating::Balanced);
        assert_eq!(t.rate(0.07), BalanceRating::Moderate);
        assert_eq!(t.rate(0.10), BalanceRating::Moderate);
        assert_eq!(t.rate(0.25), BalanceRating::Severe);
    }

    #[test]
    fn test_even_wheel_is_balanced() {
        let wheel = Wheel::new(
            "even",
            (0..4)
                .map(|i| Wedge::new(&format!("w{i}"), "W", 1.0))
                .collect(),
        );
        let report = analyze_wheel(&wheel, &BalanceThresholds::default()).unwrap();
        assert_eq!(report.rating, BalanceRating::Balanced);
        assert_relative_eq!(report.max_deviation, 0.0);
        assert_eq!(report.imbalanced().count(), 0);
    }

    #[test]
    fn test_big_but_rare_wedge() {
        // Drawn as half the wheel, selected 1 time in 10
        let wheel = Wheel::new(
            "jackpot",
            vec![
                Wedge::new("jackpot", "Jackpot", 1.0).with_visual_angle(180.0),
                Wedge::new("a", "A", 4.5),
                Wedge::new("b", "B", 4.5),
            ],
        );
        let report = analyze_wheel(&wheel, &BalanceThresholds::default()).unwrap();
        assert_eq!(report.rating, BalanceRating::Severe);
        assert_relative_eq!(report.entries[0].probability, 0.1);
        assert_relative_eq!(report.entries[0].visual_share, 0.5);
        assert_relative_eq!(report.entries[0].deviation, 0.4);
        // 0.45 vs 0.25
        assert_eq!(report.entries[1].rating, BalanceRating::Severe);
        assert_eq!(report.imbalanced().count(), 3);
    }

    #[test]
    fn test_moderate_imbalance() {
        let wheel = Wheel::new(
            "m",
            vec![Wedge::new("a", "A", 0.42), Wedge::new("b", "B", 0.58)],
        );
        let report = analyze_wheel(&wheel, &BalanceThresholds::default()).unwrap();
        assert_eq!(report.rating, BalanceRating::Moderate);
    }

    #[test]
    fn test_invalid_layout_rejected() {
        let wheel = Wheel::new(
            "wide",
            vec![
                Wedge::new("a", "A", 1.0).with_visual_angle(200.0),
                Wedge::new("b", "B", 1.0).with_visual_angle(200.0),
            ],
        );
        assert!(matches!(
            analyze_wheel(&wheel, &BalanceThresholds::default()),
            Err(WfError::InvalidWheel { .. })
        ));
    }
}
