//! wf-core: Shared types for WheelForge
//!
//! Foundation for every other WheelForge crate:
//!
//! - **RandomStream**: seeded 32-bit LCG producing reproducible uniform values
//! - **Wheel / Wedge**: the configured wedges of a wheel, with selection weights
//!   decoupled from the visual angle each wedge occupies
//! - **WheelLayout**: angular layout used to reconcile the rendered stop position
//!   with the selected wedge

mod error;
mod layout;
mod rng;
mod wheel;

pub use error::*;
pub use layout::*;
pub use rng::*;
pub use wheel::*;

/// Full turn in degrees
pub const FULL_TURN_DEGREES: f64 = 360.0;

/// Which side of a double wheel a wheel occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelSide {
    Outer,
    Inner,
}

impl WheelSide {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Outer => "outer",
            Self::Inner => "inner",
        }
    }
}

impl Default for WheelSide {
    fn default() -> Self {
        Self::Outer
    }
}

impl std::fmt::Display for WheelSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
