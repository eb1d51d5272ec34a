//! Wheel bodies

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::{KINETIC_FLOOR, PhysicsError, PhysicsResult, STABILITY_EPSILON};

/// Configuration for a new body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    /// Moment of inertia (> 0)
    #[serde(default = "default_inertia")]
    pub moment_of_inertia: f64,
    /// Friction coefficient (>= 0)
    #[serde(default = "default_friction")]
    pub friction_coefficient: f64,
    /// Share of clutch transfer this body accepts when it is the child of a
    /// connection, in [0, 1]
    #[serde(default)]
    pub clutch_ratio: Option<f64>,
    /// Starting angle (radians)
    #[serde(default)]
    pub initial_angle: f64,
}

fn default_inertia() -> f64 {
    1.0
}
fn default_friction() -> f64 {
    0.5
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            moment_of_inertia: 1.0,
            friction_coefficient: 0.5,
            clutch_ratio: None,
            initial_angle: 0.0,
        }
    }
}

impl BodyConfig {
    pub fn new(moment_of_inertia: f64, friction_coefficient: f64) -> Self {
        Self {
            moment_of_inertia,
            friction_coefficient,
            ..Default::default()
        }
    }

    /// Set clutch ratio
    pub fn with_clutch_ratio(mut self, ratio: f64) -> Self {
        self.clutch_ratio = Some(ratio);
        self
    }

    /// Set starting angle
    pub fn with_initial_angle(mut self, angle: f64) -> Self {
        self.initial_angle = angle;
        self
    }

    /// Reject configurations that would produce NaN trajectories
    pub fn validate(&self, id: &str) -> PhysicsResult<()> {
        let invalid = |reason: String| PhysicsError::InvalidBody {
            id: id.to_string(),
            reason,
        };

        if id.trim().is_empty() {
            return Err(invalid("empty id".to_string()));
        }
        if !self.moment_of_inertia.is_finite() || self.moment_of_inertia <= 0.0 {
            return Err(invalid(format!(
                "moment of inertia must be finite and > 0, got {}",
                self.moment_of_inertia
            )));
        }
        if !self.friction_coefficient.is_finite() || self.friction_coefficient < 0.0 {
            return Err(invalid(format!(
                "friction coefficient must be finite and >= 0, got {}",
                self.friction_coefficient
            )));
        }
        if let Some(ratio) = self.clutch_ratio
            && !(0.0..=1.0).contains(&ratio)
        {
            return Err(invalid(format!("clutch ratio must be in [0, 1], got {ratio}")));
        }
        if !self.initial_angle.is_finite() {
            return Err(invalid("initial angle must be finite".to_string()));
        }
        Ok(())
    }
}

/// Snapshot of a body for rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyState {
    /// Angle in [0, 2π)
    pub angle: f64,
    /// Angular velocity (rad/s)
    pub angular_velocity: f64,
}

/// A spinning wheel body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelPhysicsBody {
    pub id: String,
    pub moment_of_inertia: f64,
    pub friction_coefficient: f64,
    pub clutch_ratio: Option<f64>,
    /// Radians, wrapped into [0, 2π)
    pub angle: f64,
    pub angular_velocity: f64,
}

impl WheelPhysicsBody {
    /// Build a body from a validated config
    pub fn new(id: &str, config: &BodyConfig) -> PhysicsResult<Self> {
        config.validate(id)?;
        Ok(Self {
            id: id.to_string(),
            moment_of_inertia: config.moment_of_inertia,
            friction_coefficient: config.friction_coefficient,
            clutch_ratio: config.clutch_ratio,
            angle: wrap_angle(config.initial_angle),
            angular_velocity: 0.0,
        })
    }

    /// Current state
    #[inline]
    pub fn state(&self) -> BodyState {
        BodyState {
            angle: self.angle,
            angular_velocity: self.angular_velocity,
        }
    }

    /// Angular momentum (I·ω)
    #[inline]
    pub fn angular_momentum(&self) -> f64 {
        self.moment_of_inertia * self.angular_velocity
    }

    /// Below the stability threshold
    #[inline]
    pub fn is_stable(&self) -> bool {
        self.angular_velocity.abs() < STABILITY_EPSILON
    }

    /// Decelerate under friction; never reverses the direction of spin
    #[inline]
    pub(crate) fn apply_friction(&mut self, dt: f64) {
        if self.friction_coefficient == 0.0 || self.angular_velocity == 0.0 {
            return;
        }
        let speed = self.angular_velocity.abs();
        let decel = self.friction_coefficient * (speed + KINETIC_FLOOR) / self.moment_of_inertia;
        let slowed = (speed - decel * dt).max(0.0);
        self.angular_velocity = slowed.copysign(self.angular_velocity);
    }

    /// Advance the angle
    #[inline]
    pub(crate) fn integrate(&mut self, dt: f64) {
        self.angle = wrap_angle(self.angle + self.angular_velocity * dt);
    }
}

/// Wrap an angle into [0, 2π)
#[inline]
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}
