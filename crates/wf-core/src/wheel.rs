//! Wheel and wedge definitions
//!
//! A wedge's `weight` decides how likely it is to be selected; its
//! `visual_angle_degrees` only decides how large it is drawn. The two are
//! deliberately independent.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{FULL_TURN_DEGREES, WfError, WfResult};

/// Tolerance when checking that explicit visual angles cover a full turn
const ANGLE_SUM_TOLERANCE: f64 = 1e-6;

/// Media attached to a wedge (image, sound, ...), resolved by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Media kind, e.g. "image" or "audio"
    pub kind: String,
    /// Host-specific location
    pub uri: String,
}

/// One wedge of a wheel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wedge {
    /// Unique wedge ID within its wheel
    pub id: String,
    /// Display label
    pub label: String,
    /// Selection weight (>= 0)
    pub weight: f64,
    /// Display color (CSS-style string)
    #[serde(default = "default_color")]
    pub color: String,
    /// Drawn size in degrees; defaults to an even share of the wheel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_angle_degrees: Option<f64>,
    /// Optional media reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaRef>,
}

fn default_color() -> String {
    "#808080".to_string()
}

impl Wedge {
    /// Create a wedge with default color and an even visual share
    pub fn new(id: &str, label: &str, weight: f64) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            weight,
            color: default_color(),
            visual_angle_degrees: None,
            media: None,
        }
    }

    /// Set color
    pub fn with_color(mut self, color: &str) -> Self {
        self.color = color.to_string();
        self
    }

    /// Set explicit visual angle
    pub fn with_visual_angle(mut self, degrees: f64) -> Self {
        self.visual_angle_degrees = Some(degrees);
        self
    }

    /// Attach media
    pub fn with_media(mut self, kind: &str, uri: &str) -> Self {
        self.media = Some(MediaRef {
            kind: kind.to_string(),
            uri: uri.to_string(),
        });
        self
    }
}

/// A wheel: an ordered set of wedges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wheel {
    /// Wheel ID
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Wedges in drawing order (clockwise from the pointer)
    pub wedges: Vec<Wedge>,
}

impl Wheel {
    /// Create a wheel
    pub fn new(id: &str, wedges: Vec<Wedge>) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            wedges,
        }
    }

    /// Load from JSON
    pub fn from_json(json: &str) -> WfResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save to JSON
    pub fn to_json(&self) -> WfResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of wedges
    pub fn len(&self) -> usize {
        self.wedges.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.wedges.is_empty()
    }

    /// Selection weights in wedge order
    pub fn weights(&self) -> Vec<f64> {
        self.wedges.iter().map(|w| w.weight).collect()
    }

    /// Sum of all weights
    pub fn total_weight(&self) -> f64 {
        self.wedges.iter().map(|w| w.weight).sum()
    }

    /// Index of a wedge by ID
    pub fn wedge_index(&self, id: &str) -> Option<usize> {
        self.wedges.iter().position(|w| w.id == id)
    }

    /// Get wedge by ID
    pub fn wedge(&self, id: &str) -> Option<&Wedge> {
        self.wedges.iter().find(|w| w.id == id)
    }

    /// Drawn angle of a wedge in degrees.
    ///
    /// Wedges without an explicit angle share whatever the explicit ones
    /// leave of the full turn; with no explicit angles at all this is 360/N.
    pub fn visual_angle(&self, index: usize) -> f64 {
        let Some(wedge) = self.wedges.get(index) else {
            return 0.0;
        };
        if let Some(angle) = wedge.visual_angle_degrees {
            return angle;
        }
        let (explicit_sum, implicit_count) =
            self.wedges
                .iter()
                .fold((0.0, 0usize), |(sum, count), w| match w.visual_angle_degrees {
                    Some(a) => (sum + a, count),
                    None => (sum, count + 1),
                });
        ((FULL_TURN_DEGREES - explicit_sum) / implicit_count as f64).max(0.0)
    }

    /// Drawn share of the wheel (visual angle / 360)
    pub fn visual_share(&self, index: usize) -> f64 {
        self.visual_angle(index) / FULL_TURN_DEGREES
    }

    /// Validate the wheel for selection and layout
    pub fn validate(&self) -> WfResult<()> {
        if self.wedges.len() < 2 {
            return Err(WfError::invalid_wheel(
                &self.id,
                format!("needs at least 2 wedges, has {}", self.wedges.len()),
            ));
        }

        let mut seen = HashSet::new();
        for wedge in &self.wedges {
            if wedge.id.trim().is_empty() {
                return Err(WfError::invalid_wheel(&self.id, "wedge with empty id"));
            }
            if !seen.insert(wedge.id.as_str()) {
                return Err(WfError::invalid_wheel(
                    &self.id,
                    format!("duplicate wedge id '{}'", wedge.id),
                ));
            }
        }

        for (index, wedge) in self.wedges.iter().enumerate() {
            if !wedge.weight.is_finite() || wedge.weight < 0.0 {
                return Err(WfError::InvalidWeight {
                    index,
                    value: wedge.weight,
                });
            }
        }
        if self.total_weight() <= 0.0 {
            return Err(WfError::DegenerateWeights);
        }

        self.validate_angles()
    }

    fn validate_angles(&self) -> WfResult<()> {
        let mut explicit_sum = 0.0;
        let mut all_explicit = true;
        for wedge in &self.wedges {
            match wedge.visual_angle_degrees {
                Some(angle) if !angle.is_finite() || angle <= 0.0 => {
                    return Err(WfError::invalid_wheel(
                        &self.id,
                        format!("wedge '{}' has invalid visual angle {}", wedge.id, angle),
                    ));
                }
                Some(angle) => explicit_sum += angle,
                None => all_explicit = false,
            }
        }

        let overflow = explicit_sum > FULL_TURN_DEGREES + ANGLE_SUM_TOLERANCE;
        let gap = all_explicit && (explicit_sum - FULL_TURN_DEGREES).abs() > ANGLE_SUM_TOLERANCE;
        // Wedges without an angle split the remainder; it must leave them some width
        let no_room = !all_explicit && explicit_sum >= FULL_TURN_DEGREES - ANGLE_SUM_TOLERANCE;
        if overflow || gap || no_room {
            return Err(WfError::invalid_wheel(
                &self.id,
                format!("visual angles sum to {explicit_sum}, expected {FULL_TURN_DEGREES}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn four_wedges() -> Wheel {
        Wheel::new(
            "outer",
            vec![
                Wedge::new("a", "A", 1.0),
                Wedge::new("b", "B", 2.0),
                Wedge::new("c", "C", 3.0),
                Wedge::new("d", "D", 4.0),
            ],
        )
    }

    #[test]
    fn test_default_visual_angle() {
        let wheel = four_wedges();
        for i in 0..4 {
            assert_relative_eq!(wheel.visual_angle(i), 90.0);
            assert_relative_eq!(wheel.visual_share(i), 0.25);
        }
        assert_eq!(wheel.visual_angle(9), 0.0);
    }

    #[test]
    fn test_partial_explicit_angles() {
        let mut wheel = four_wedges();
        wheel.wedges[0].visual_angle_degrees = Some(180.0);
        assert_relative_eq!(wheel.visual_angle(0), 180.0);
        assert_relative_eq!(wheel.visual_angle(1), 60.0);
        assert!(wheel.validate().is_ok());
    }

    #[test]
    fn test_explicit_angles_leave_no_room() {
        let wheel = Wheel::new(
            "w",
            vec![
                Wedge::new("a", "A", 1.0).with_visual_angle(180.0),
                Wedge::new("b", "B", 1.0).with_visual_angle(180.0),
                Wedge::new("c", "C", 5.0),
            ],
        );
        assert_eq!(wheel.visual_angle(2), 0.0);
        assert!(matches!(wheel.validate(), Err(WfError::InvalidWheel { .. })));
    }

    #[test]
    fn test_validate_ok() {
        assert!(four_wedges().validate().is_ok());
    }

    #[test]
    fn test_validate_too_few_wedges() {
        let wheel = Wheel::new("w", vec![Wedge::new("a", "A", 1.0)]);
        assert!(matches!(wheel.validate(), Err(WfError::InvalidWheel { .. })));
    }

    #[test]
    fn test_validate_weights() {
        let mut wheel = four_wedges();
        wheel.wedges[2].weight = -1.0;
        assert!(matches!(
            wheel.validate(),
            Err(WfError::InvalidWeight { index: 2, .. })
        ));

        let zero = Wheel::new(
            "z",
            vec![Wedge::new("a", "A", 0.0), Wedge::new("b", "B", 0.0)],
        );
        assert!(matches!(zero.validate(), Err(WfError::DegenerateWeights)));
    }

    #[test]
    fn test_validate_duplicate_ids() {
        let mut wheel = four_wedges();
        wheel.wedges[3].id = "a".to_string();
        let err = wheel.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate wedge id 'a'"));
    }

    #[test]
    fn test_validate_angle_sum() {
        let mut wheel = four_wedges();
        for wedge in &mut wheel.wedges {
            wedge.visual_angle_degrees = Some(80.0);
        }
        assert!(wheel.validate().is_err());

        wheel.wedges[0].visual_angle_degrees = Some(120.0);
        assert!(wheel.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip_uses_camel_case() {
        let mut wheel = four_wedges();
        wheel.wedges[0] = wheel.wedges[0]
            .clone()
            .with_visual_angle(90.0)
            .with_media("image", "assets/a.png");
        let json = wheel.to_json().unwrap();
        assert!(json.contains("visualAngleDegrees"));

        let loaded = Wheel::from_json(&json).unwrap();
        assert_eq!(loaded, wheel);
    }
}
