//! Statistical self-test
//!
//! Samples a weight vector many times from a seeded stream and compares the
//! empirical frequencies with the exact probabilities. Used by test suites
//! and the `wf-sim selftest` command to check convergence, never on the
//! production spin path.

use serde::{Deserialize, Serialize};
use wf_core::{RandomStream, WfResult};

use crate::balance::probabilities;
use crate::selector::OutcomeSelector;

/// Parameters for a distribution check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionCheck {
    pub weights: Vec<f64>,
    pub samples: usize,
    pub seed: u32,
}

/// Result of a distribution check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionReport {
    pub samples: usize,
    pub seed: u32,
    /// Hits per index
    pub counts: Vec<u64>,
    /// Exact probability per index
    pub expected: Vec<f64>,
    /// Empirical probability per index
    pub observed: Vec<f64>,
    /// Largest |observed - expected|
    pub max_deviation: f64,
}

impl DistributionReport {
    /// Every index within `tolerance` of its expected probability
    pub fn is_within(&self, tolerance: f64) -> bool {
        self.max_deviation <= tolerance
    }

    /// Index with the largest deviation
    pub fn worst_index(&self) -> Option<usize> {
        self.observed
            .iter()
            .zip(&self.expected)
            .map(|(o, e)| (o - e).abs())
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

impl DistributionCheck {
    pub fn new(weights: &[f64], samples: usize, seed: u32) -> Self {
        Self {
            weights: weights.to_vec(),
            samples,
            seed,
        }
    }

    /// Run the sampling loop
    pub fn execute(&self) -> WfResult<DistributionReport> {
        Self::run(&self.weights, self.samples, self.seed)
    }

    /// Sample `samples` times with a stream seeded by `seed`
    pub fn run(weights: &[f64], samples: usize, seed: u32) -> WfResult<DistributionReport> {
        let expected = probabilities(weights)?;
        let mut selector = OutcomeSelector::new(RandomStream::new(seed));
        let mut counts = vec![0u64; weights.len()];

        for _ in 0..samples {
            counts[selector.select(weights)?] += 1;
        }

        let observed: Vec<f64> = if samples == 0 {
            vec![0.0; weights.len()]
        } else {
            counts
                .iter()
                .map(|&c| c as f64 / samples as f64)
                .collect()
        };
        let max_deviation = observed
            .iter()
            .zip(&expected)
            .map(|(o, e)| (o - e).abs())
            .fold(0.0, f64::max);

        log::debug!(
            "Distribution check: {} samples, seed {}, max deviation {:.5}",
            samples,
            seed,
            max_deviation
        );

        Ok(DistributionReport {
            samples,
            seed,
            counts,
            expected,
            observed,
            max_deviation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_add_up() {
        let report = DistributionCheck::run(&[1.0, 1.0, 2.0], 1000, 5).unwrap();
        assert_eq!(report.counts.iter().sum::<u64>(), 1000);
        assert_eq!(report.expected.len(), 3);
    }

    #[test]
    fn test_zero_weight_never_hit() {
        let report = DistributionCheck::run(&[0.0, 3.0, 1.0], 5000, 8).unwrap();
        assert_eq!(report.counts[0], 0);
    }

    #[test]
    fn test_same_seed_same_report() {
        let a = DistributionCheck::new(&[2.0, 5.0], 2000, 31).execute().unwrap();
        let b = DistributionCheck::new(&[2.0, 5.0], 2000, 31).execute().unwrap();
        assert_eq!(a.counts, b.counts);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        assert!(DistributionCheck::run(&[], 10, 1).is_err());
        assert!(DistributionCheck::run(&[0.0], 10, 1).is_err());
    }

    #[test]
    fn test_zero_samples() {
        let report = DistributionCheck::run(&[1.0, 1.0], 0, 1).unwrap();
        assert_eq!(report.observed, vec![0.0, 0.0]);
        assert_eq!(report.max_deviation, 0.5);
        assert!(report.worst_index().is_some());
    }
}
