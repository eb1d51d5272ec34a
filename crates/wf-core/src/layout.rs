//! Angular wheel layout
//!
//! Wedges are laid out clockwise from wheel angle 0 using their visual
//! angles. The pointer sits at screen angle 0; a wheel rotated by `θ` shows
//! wheel angle `-θ` under the pointer. Renderers use this to land the
//! animation on the wedge the selector actually chose.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::{FULL_TURN_DEGREES, Wheel};

/// Angular span of one wedge, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WedgeSpan {
    pub start: f64,
    pub end: f64,
}

impl WedgeSpan {
    /// Span width
    #[inline]
    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    /// Center angle
    #[inline]
    pub fn center(&self) -> f64 {
        (self.start + self.end) * 0.5
    }
}

/// Precomputed wedge spans for one wheel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelLayout {
    spans: Vec<WedgeSpan>,
}

impl WheelLayout {
    /// Build layout from a wheel's visual angles
    pub fn new(wheel: &Wheel) -> Self {
        let mut start = 0.0;
        let spans = (0..wheel.len())
            .map(|i| {
                let end = start + wheel.visual_angle(i);
                let span = WedgeSpan { start, end };
                start = end;
                span
            })
            .collect();
        Self { spans }
    }

    /// All spans in wedge order
    pub fn spans(&self) -> &[WedgeSpan] {
        &self.spans
    }

    /// Span of one wedge
    pub fn span(&self, index: usize) -> Option<WedgeSpan> {
        self.spans.get(index).copied()
    }

    /// Center angle of a wedge in degrees
    pub fn center_angle(&self, index: usize) -> Option<f64> {
        self.span(index).map(|s| s.center())
    }

    /// Wedge covering a wheel angle (degrees, any range)
    pub fn wedge_at_angle(&self, degrees: f64) -> Option<usize> {
        if !degrees.is_finite() || self.spans.is_empty() {
            return None;
        }
        let angle = degrees.rem_euclid(FULL_TURN_DEGREES);
        self.spans
            .iter()
            .position(|s| angle >= s.start && angle < s.end)
            // Angles past the last span come from rounding in the angle sum
            .or(Some(self.spans.len() - 1))
    }

    /// Wedge under the pointer for a wheel rotation in radians
    pub fn wedge_under_pointer(&self, rotation: f64) -> Option<usize> {
        self.wedge_at_angle(-rotation.to_degrees())
    }

    /// Smallest rotation `>= current` (radians) that stops the wheel with the
    /// wedge center under the pointer
    pub fn stop_rotation(&self, index: usize, current: f64) -> Option<f64> {
        let center = self.center_angle(index)?.to_radians();
        let target = (-center).rem_euclid(TAU);
        let base = current.rem_euclid(TAU);
        Some(current + (target - base).rem_euclid(TAU))
    }
}
