//! Reproducible random stream
//!
//! A 32-bit linear congruential generator (`state' = a·state + c mod 2^32`)
//! with the Numerical Recipes constants. The whole generator state is the
//! single `u32` seed, so snapshotting the seed is enough to fork or replay
//! a stream. Output depends only on integer arithmetic, which keeps
//! sequences bit-identical across processes and platforms.
//!
//! Not cryptographically secure.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::{WfError, WfResult};

/// LCG multiplier
pub const LCG_MULTIPLIER: u32 = 1_664_525;

/// LCG increment
pub const LCG_INCREMENT: u32 = 1_013_904_223;

/// 2^32 as a float, divisor for unit-interval output
const UNIT_SCALE: f64 = 4_294_967_296.0;

/// Seeded pseudo-random stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RandomStream {
    state: u32,
}

impl RandomStream {
    /// Create a stream from an explicit seed
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Create a stream seeded from the wall clock
    pub fn from_time() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let seed = (nanos as u32) ^ ((nanos >> 32) as u32);
        log::debug!("RandomStream seeded from clock: {}", seed);
        Self::new(seed)
    }

    /// Current state (the seed of the remaining sequence)
    #[inline]
    pub fn seed(&self) -> u32 {
        self.state
    }

    /// Reset the stream to a seed
    #[inline]
    pub fn set_seed(&mut self, seed: u32) {
        self.state = seed;
    }

    /// Independent copy continuing from the current state
    #[inline]
    pub fn fork(&self) -> Self {
        *self
    }

    /// Advance the state and return it
    #[inline]
    fn advance(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        self.state
    }

    /// Uniform value in [0, 1)
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> f64 {
        self.advance() as f64 / UNIT_SCALE
    }

    /// Uniform integer in [min, max)
    pub fn next_int(&mut self, min: i64, max: i64) -> WfResult<i64> {
        if min >= max {
            return Err(WfError::Range {
                min: min as f64,
                max: max as f64,
            });
        }
        let span = max as i128 - min as i128;
        let offset = (self.next() * span as f64).floor() as i128;
        // Float rounding on very wide spans can land exactly on `span`
        Ok((min as i128 + offset.min(span - 1)) as i64)
    }

    /// Uniform float in [min, max)
    pub fn next_float(&mut self, min: f64, max: f64) -> WfResult<f64> {
        let span = max - min;
        if !min.is_finite() || !max.is_finite() || min >= max || !span.is_finite() {
            return Err(WfError::Range { min, max });
        }
        Ok(min + self.next() * span)
    }

    /// True with probability `p` (clamped to [0, 1])
    pub fn next_bool(&mut self, p: f64) -> bool {
        self.next() < p.clamp(0.0, 1.0)
    }
}

impl Default for RandomStream {
    fn default() -> Self {
        Self::from_time()
    }
}

impl RngCore for RandomStream {
    fn next_u32(&mut self) -> u32 {
        self.advance()
    }

    fn next_u64(&mut self) -> u64 {
        rand::rand_core::impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        rand::rand_core::impls::fill_bytes_via_next(self, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::seq::SliceRandom;

    #[test]
    fn test_known_sequence() {
        let mut rng = RandomStream::new(42);
        assert_eq!(rng.next_u32(), 1_083_814_273);
        assert_eq!(rng.next_u32(), 378_494_188);
        assert_eq!(rng.next_u32(), 2_479_403_867);
    }

    #[test]
    fn test_next_is_state_over_2_pow_32() {
        let mut rng = RandomStream::new(42);
        let value = rng.next();
        assert_eq!(value, 1_083_814_273.0 / 4_294_967_296.0);
        assert_eq!(rng.seed(), 1_083_814_273);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = RandomStream::new(7);
        let mut b = RandomStream::new(7);
        for _ in 0..1000 {
            assert_eq!(a.next().to_bits(), b.next().to_bits());
        }
    }

    #[test]
    fn test_unit_interval() {
        let mut rng = RandomStream::new(0);
        for _ in 0..10_000 {
            let v = rng.next();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_next_int_bounds() {
        let mut rng = RandomStream::new(99);
        for _ in 0..5000 {
            let v = rng.next_int(-3, 4).unwrap();
            assert!((-3..4).contains(&v));
        }
        assert_eq!(rng.next_int(5, 6).unwrap(), 5);
    }

    #[test]
    fn test_next_int_wide_span() {
        let mut rng = RandomStream::new(1);
        for _ in 0..100 {
            let v = rng.next_int(i64::MIN, i64::MAX).unwrap();
            assert!(v < i64::MAX);
        }
    }

    #[test]
    fn test_range_errors() {
        let mut rng = RandomStream::new(1);
        assert!(matches!(rng.next_int(3, 3), Err(WfError::Range { .. })));
        assert!(matches!(rng.next_int(4, 1), Err(WfError::Range { .. })));
        assert!(matches!(rng.next_float(1.0, 1.0), Err(WfError::Range { .. })));
        assert!(matches!(
            rng.next_float(0.0, f64::INFINITY),
            Err(WfError::Range { .. })
        ));
        // Finite bounds whose span overflows
        assert!(matches!(
            rng.next_float(-f64::MAX, f64::MAX),
            Err(WfError::Range { .. })
        ));
        // Failed calls must not consume the stream
        assert_eq!(rng.seed(), 1);
    }

    #[test]
    fn test_next_float_bounds() {
        let mut rng = RandomStream::new(5);
        for _ in 0..1000 {
            let v = rng.next_float(-2.5, 2.5).unwrap();
            assert!((-2.5..2.5).contains(&v));
        }
    }

    #[test]
    fn test_set_seed_replays() {
        let mut rng = RandomStream::new(11);
        let first: Vec<f64> = (0..5).map(|_| rng.next()).collect();
        rng.set_seed(11);
        let again: Vec<f64> = (0..5).map(|_| rng.next()).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn test_fork_is_independent() {
        let mut rng = RandomStream::new(3);
        rng.next();
        let mut fork = rng.fork();
        assert_eq!(rng.next(), fork.next());
        rng.next();
        assert_ne!(rng.seed(), fork.seed());
    }

    #[test]
    fn test_rand_interop_is_reproducible() {
        let mut a = RandomStream::new(2024);
        let mut b = RandomStream::new(2024);
        let mut deck_a: Vec<u32> = (0..20).collect();
        let mut deck_b = deck_a.clone();
        deck_a.shuffle(&mut a);
        deck_b.shuffle(&mut b);
        assert_eq!(deck_a, deck_b);
        assert_eq!(a.random_range(0..100u32), b.random_range(0..100u32));
    }
}
