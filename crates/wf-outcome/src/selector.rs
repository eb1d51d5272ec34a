//! Weighted selection
//!
//! Cumulative-weight sampling: draw `r = next() · total`, walk the weights in
//! input order and return the first index whose running sum reaches `r`.
//! A fixed weight vector and a fixed stream state always yield the same
//! index.

use wf_core::{RandomStream, Wedge, WfError, WfResult, Wheel};

/// Check a weight vector and return its total.
///
/// Fails with `EmptyInput`, `InvalidWeight` (negative, NaN or infinite) or
/// `DegenerateWeights` (all zero), in that order of precedence.
pub fn validate_weights(weights: &[f64]) -> WfResult<f64> {
    if weights.is_empty() {
        return Err(WfError::EmptyInput);
    }
    for (index, &value) in weights.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(WfError::InvalidWeight { index, value });
        }
    }
    let total: f64 = weights.iter().sum();
    if !total.is_finite() {
        // Finite weights can still overflow when summed
        return Err(WfError::InvalidWeight {
            index: weights.len() - 1,
            value: total,
        });
    }
    if total <= 0.0 {
        return Err(WfError::DegenerateWeights);
    }
    Ok(total)
}

/// Pick an index with probability proportional to its weight.
///
/// Consumes exactly one value from `rng` on success and none on failure.
pub fn select_index(weights: &[f64], rng: &mut RandomStream) -> WfResult<usize> {
    let total = validate_weights(weights)?;
    let r = rng.next() * total;
    Ok(pick(weights, r))
}

/// Walk cumulative weights; zero-weight entries are never returned
fn pick(weights: &[f64], r: f64) -> usize {
    let mut cumulative = 0.0;
    let mut last_positive = 0;
    for (index, &weight) in weights.iter().enumerate() {
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        last_positive = index;
        if cumulative >= r {
            return index;
        }
    }
    // Rounding in the running sum can leave it a hair below r
    last_positive
}

/// Outcome selector owning its random stream
#[derive(Debug, Clone)]
pub struct OutcomeSelector {
    rng: RandomStream,
}

impl OutcomeSelector {
    /// Create a selector around an injected stream
    pub fn new(rng: RandomStream) -> Self {
        Self { rng }
    }

    /// Create a selector from a seed
    pub fn seeded(seed: u32) -> Self {
        Self::new(RandomStream::new(seed))
    }

    /// The underlying stream
    pub fn rng(&self) -> &RandomStream {
        &self.rng
    }

    /// Mutable access to the underlying stream
    pub fn rng_mut(&mut self) -> &mut RandomStream {
        &mut self.rng
    }

    /// Give back the stream
    pub fn into_rng(self) -> RandomStream {
        self.rng
    }

    /// Select an index from raw weights
    pub fn select(&mut self, weights: &[f64]) -> WfResult<usize> {
        select_index(weights, &mut self.rng)
    }

    /// Select a wedge of a wheel by weight
    pub fn select_wedge<'w>(&mut self, wheel: &'w Wheel) -> WfResult<(usize, &'w Wedge)> {
        if wheel.is_empty() {
            return Err(WfError::EmptyInput);
        }
        if wheel.len() < 2 {
            return Err(WfError::InvalidWheel {
                wheel: wheel.id.clone(),
                reason: "needs at least 2 wedges to be selectable".to_string(),
            });
        }
        let index = self.select(&wheel.weights())?;
        log::trace!("Wheel '{}' selected wedge '{}'", wheel.id, wheel.wedges[index].id);
        Ok((index, &wheel.wedges[index]))
    }
}
