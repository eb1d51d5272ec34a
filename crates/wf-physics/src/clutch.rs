//! Clutch coupling between two bodies
//!
//! A clutch drags two bodies' angular velocities toward each other in
//! proportion to their difference. The strength comes from the child's
//! `clutch_ratio`: 0 leaves both bodies independent, 1 is a fully engaged
//! clutch.
//!
//! - **Bidirectional**: both bodies move toward the inertia-weighted common
//!   velocity `(I_p·ω_p + I_c·ω_c) / (I_p + I_c)`, so total angular
//!   momentum is conserved.
//! - **Directed**: the parent drives, only the child moves toward the
//!   parent's velocity.

use serde::{Deserialize, Serialize};

use crate::COUPLING_RATE;
use crate::body::WheelPhysicsBody;

/// Coupling direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClutchMode {
    Bidirectional,
    Directed,
}

impl Default for ClutchMode {
    fn default() -> Self {
        Self::Bidirectional
    }
}

/// Registered connection between two bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClutchConnection {
    pub parent_id: String,
    pub child_id: String,
    #[serde(default)]
    pub mode: ClutchMode,
}

impl ClutchConnection {
    pub fn new(parent_id: &str, child_id: &str, mode: ClutchMode) -> Self {
        Self {
            parent_id: parent_id.to_string(),
            child_id: child_id.to_string(),
            mode,
        }
    }
}

/// Fraction of the velocity gap closed in one step
#[inline]
pub fn blend_factor(ratio: f64, dt: f64) -> f64 {
    (ratio * COUPLING_RATE * dt).clamp(0.0, 1.0)
}

/// Exchange angular momentum across one connection for one step
#[inline]
pub(crate) fn couple(
    parent: &mut WheelPhysicsBody,
    child: &mut WheelPhysicsBody,
    mode: ClutchMode,
    dt: f64,
) {
    let ratio = child.clutch_ratio.unwrap_or(0.0);
    if ratio <= 0.0 {
        return;
    }
    let blend = blend_factor(ratio, dt);

    match mode {
        ClutchMode::Bidirectional => {
            let total_inertia = parent.moment_of_inertia + child.moment_of_inertia;
            let common =
                (parent.angular_momentum() + child.angular_momentum()) / total_inertia;
            parent.angular_velocity += blend * (common - parent.angular_velocity);
            child.angular_velocity += blend * (common - child.angular_velocity);
        }
        ClutchMode::Directed => {
            child.angular_velocity += blend * (parent.angular_velocity - child.angular_velocity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BodyConfig;
    use approx::assert_relative_eq;

    fn body(id: &str, inertia: f64, ratio: f64, velocity: f64) -> WheelPhysicsBody {
        let mut b = WheelPhysicsBody::new(
            id,
            &BodyConfig::new(inertia, 0.0).with_clutch_ratio(ratio),
        )
        .unwrap();
        b.angular_velocity = velocity;
        b
    }

    #[test]
    fn test_blend_factor_clamped() {
        assert_eq!(blend_factor(0.0, 1.0 / 60.0), 0.0);
        assert_relative_eq!(blend_factor(1.0, 1.0 / 60.0), 0.1);
        assert_eq!(blend_factor(1.0, 10.0), 1.0);
    }

    #[test]
    fn test_bidirectional_conserves_momentum() {
        let mut parent = body("p", 3.0, 0.0, 12.0);
        let mut child = body("c", 1.0, 0.7, -2.0);
        let before = parent.angular_momentum() + child.angular_momentum();

        for _ in 0..50 {
            couple(&mut parent, &mut child, ClutchMode::Bidirectional, 1.0 / 60.0);
        }

        let after = parent.angular_momentum() + child.angular_momentum();
        assert_relative_eq!(before, after, epsilon = 1e-9);
        assert!((parent.angular_velocity - child.angular_velocity).abs() < 14.0);
    }

    #[test]
    fn test_full_blend_reaches_common_velocity() {
        let mut parent = body("p", 1.0, 0.0, 10.0);
        let mut child = body("c", 1.0, 1.0, 0.0);
        couple(&mut parent, &mut child, ClutchMode::Bidirectional, 1.0);
        assert_relative_eq!(parent.angular_velocity, 5.0);
        assert_relative_eq!(child.angular_velocity, 5.0);
    }

    #[test]
    fn test_directed_leaves_parent_alone() {
        let mut parent = body("p", 1.0, 0.0, 10.0);
        let mut child = body("c", 1.0, 1.0, 0.0);
        couple(&mut parent, &mut child, ClutchMode::Directed, 1.0 / 60.0);
        assert_eq!(parent.angular_velocity, 10.0);
        assert_relative_eq!(child.angular_velocity, 1.0);
    }

    #[test]
    fn test_missing_ratio_means_no_transfer() {
        let mut parent = body("p", 1.0, 0.0, 10.0);
        let mut child = body("c", 1.0, 0.0, 0.0);
        child.clutch_ratio = None;
        couple(&mut parent, &mut child, ClutchMode::Bidirectional, 1.0 / 60.0);
        assert_eq!(child.angular_velocity, 0.0);
        assert_eq!(parent.angular_velocity, 10.0);
    }
}
