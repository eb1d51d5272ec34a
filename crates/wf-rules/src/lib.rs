//! # Rule Evaluation Engine
//!
//! Turns a resolved spin into a verdict for the turn.
//!
//! ## Architecture
//!
//! - **Rules**: prioritized condition chains with a `continue`/`win`/`lose` outcome
//! - **Conditions**: closed set of typed variants combined by a strict left-fold
//!   (`AND`, `OR`, `NOT` = `acc AND NOT current`)
//! - **Context**: read-only snapshot of the spin, the player's score and history
//! - **Engine**: keyed rule store; evaluation stops at the first decisive rule
//! - **Validation / Conflicts**: aggregate field-level issues, contradictory rules
//! - **Definitions / Profiles**: untyped editor wire form and versioned rule sets

pub mod conflict;
pub mod context;
pub mod definition;
pub mod engine;
pub mod profile;
pub mod rules;
pub mod validation;
pub mod verdict;

pub use conflict::*;
pub use context::*;
pub use definition::*;
pub use engine::*;
pub use profile::*;
pub use rules::*;
pub use validation::*;
pub use verdict::*;

use thiserror::Error;

/// Rule engine error types
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Rule validation failed: {}", format_issues(.0))]
    Validation(Vec<ValidationIssue>),

    #[error("Profile error: {0}")]
    Profile(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RuleError {
    /// Issues carried by a validation failure
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Validation(issues) => issues,
            _ => &[],
        }
    }
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type RuleResult<T> = Result<T, RuleError>;

/// Lowest accepted rule priority
pub const MIN_PRIORITY: i32 = 0;

/// Highest accepted rule priority
pub const MAX_PRIORITY: i32 = 100;
