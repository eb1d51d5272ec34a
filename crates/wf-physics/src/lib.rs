//! # wf-physics — Rotational Physics for Spinning Wheels
//!
//! Advances one or more wheel bodies under friction and optional pairwise
//! clutch coupling. Drives the *feel* of a spin (duration, deceleration,
//! how an inner wheel follows the outer one); it never decides which wedge
//! wins.
//!
//! ## Determinism
//!
//! The simulator holds no clock. Every `step` takes its `dt` from the
//! caller and iterates bodies and connections in registration order, so an
//! identical configuration and `dt` sequence always produces an identical
//! trajectory.
//!
//! ## Cost
//!
//! `step` is O(bodies + connections) with no allocation; connection
//! endpoints are resolved to indices when registered.

pub mod body;
pub mod clutch;
pub mod simulator;

pub use body::*;
pub use clutch::*;
pub use simulator::*;

use thiserror::Error;

/// Physics error types
#[derive(Debug, Error)]
pub enum PhysicsError {
    #[error("Invalid body '{id}': {reason}")]
    InvalidBody { id: String, reason: String },

    #[error("Body already exists: {0}")]
    DuplicateBody(String),

    #[error("Unknown body: {0}")]
    UnknownBody(String),

    #[error("Body '{0}' cannot be clutched to itself")]
    SelfConnection(String),

    #[error("Invalid angular velocity for '{id}': {value}")]
    InvalidVelocity { id: String, value: f64 },
}

pub type PhysicsResult<T> = Result<T, PhysicsError>;

/// Angular speed (rad/s) below which a body counts as stopped
pub const STABILITY_EPSILON: f64 = 0.01;

/// Constant part of the friction torque (rad/s equivalent); guarantees a
/// finite stopping time instead of an endless exponential tail
pub const KINETIC_FLOOR: f64 = 0.5;

/// Velocity-matching rate of a fully engaged clutch (1/s)
pub const COUPLING_RATE: f64 = 6.0;
