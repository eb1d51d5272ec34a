//! # wf-outcome — Weighted Outcome Selection
//!
//! Decides which wedge wins a spin. Fairness is governed purely by the
//! configured weights; the physics animation and the drawn wedge sizes have
//! no say in it.
//!
//! ## Architecture
//!
//! ```text
//! RandomStream ──► OutcomeSelector ──► wedge index
//!                        │
//! Wheel ─────────────────┴──► BalanceReport (probability vs. drawn size)
//!
//! DistributionCheck (test-suite convergence harness)
//! ```

pub mod balance;
pub mod distribution;
pub mod selector;

pub use balance::*;
pub use distribution::*;
pub use selector::*;
