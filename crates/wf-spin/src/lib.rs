//! wf-spin: Turn resolution for WheelForge sessions
//!
//! Runs one player turn end to end:
//!
//! ```text
//! SpinRequest ──► PhysicsSimulator (fixed-step drive until stable)
//!                        │ visual stop
//!                        ▼
//!             OutcomeSelector (weights only) ──► WheelLayout stop rotation
//!                        │ selected wedges
//!                        ▼
//!             RuleEngine ──► Verdict ──► score, history, stats
//! ```
//!
//! The physics drive never decides the winner; the selected wedge only
//! decides where the rendered wheel comes to rest.

pub mod config;
pub mod engine;
pub mod stats;

pub use config::*;
pub use engine::*;
pub use stats::*;

use thiserror::Error;
use wf_core::WfError;
use wf_physics::PhysicsError;
use wf_rules::RuleError;

/// Session error types
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid session config: {0}")]
    Config(String),

    #[error("Wheel error: {0}")]
    Wheel(#[from] WfError),

    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    #[error("Rule error: {0}")]
    Rules(#[from] RuleError),

    #[error("Unknown wheel: {0}")]
    UnknownWheel(String),

    #[error("Invalid initial velocity for wheel '{wheel}': {value}")]
    InvalidVelocity { wheel: String, value: f64 },

    #[error("No spin in progress; prepare the physics first")]
    NotPrepared,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;
