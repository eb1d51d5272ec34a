//! Session configuration
//!
//! A session file describes the wheels of a table, how their bodies spin
//! and couple, the fixed-step driver and the rule set. Loaded from JSON or
//! YAML.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use wf_core::{Wheel, WheelSide};
use wf_outcome::BalanceThresholds;
use wf_physics::{BodyConfig, ClutchMode};
use wf_rules::{RuleDefinition, RuleError, RuleProfile, has_errors};

use crate::{SessionError, SessionResult};

/// One wheel of the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelConfig {
    pub wheel: Wheel,
    pub side: WheelSide,
    #[serde(default)]
    pub body: BodyConfig,
    /// Wheel this one is clutched to, as the child
    #[serde(default)]
    pub clutch_parent: Option<String>,
    #[serde(default)]
    pub clutch_mode: ClutchMode,
}

impl WheelConfig {
    pub fn new(wheel: Wheel, side: WheelSide) -> Self {
        Self {
            wheel,
            side,
            body: BodyConfig::default(),
            clutch_parent: None,
            clutch_mode: ClutchMode::Bidirectional,
        }
    }

    /// Set body physics
    pub fn with_body(mut self, body: BodyConfig) -> Self {
        self.body = body;
        self
    }

    /// Clutch to a parent wheel
    pub fn clutched_to(mut self, parent: &str, mode: ClutchMode) -> Self {
        self.clutch_parent = Some(parent.to_string());
        self.clutch_mode = mode;
        self
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.wheel.id
    }
}

/// Fixed-step physics driver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Step size in seconds
    #[serde(default = "default_dt")]
    pub dt: f64,
    /// Step ceiling per spin
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Keep every step's body states in the spin result
    #[serde(default)]
    pub record_frames: bool,
}

fn default_dt() -> f64 {
    1.0 / 60.0
}

fn default_max_steps() -> usize {
    1000
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            max_steps: 1000,
            record_frames: false,
        }
    }
}

/// Complete session description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub wheels: Vec<WheelConfig>,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub balance: BalanceThresholds,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

fn default_name() -> String {
    "session".to_string()
}

impl SessionConfig {
    pub fn new(name: &str, wheels: Vec<WheelConfig>) -> Self {
        Self {
            name: name.to_string(),
            wheels,
            driver: DriverConfig::default(),
            balance: BalanceThresholds::default(),
            rules: Vec::new(),
        }
    }

    /// Add a rule definition
    pub fn with_rule(mut self, rule: RuleDefinition) -> Self {
        self.rules.push(rule);
        self
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LOADING
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn from_json(json: &str) -> SessionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml(yaml: &str) -> SessionResult<Self> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Load a session file; `.yaml`/`.yml` as YAML, anything else as JSON
    pub fn load(path: &Path) -> SessionResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        log::debug!("Loading session from {}", path.display());
        if is_yaml {
            Self::from_yaml(&text)
        } else {
            Self::from_json(&text)
        }
    }

    pub fn to_json(&self) -> SessionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn wheel(&self, id: &str) -> Option<&WheelConfig> {
        self.wheels.iter().find(|w| w.id() == id)
    }

    pub fn outer(&self) -> Option<&WheelConfig> {
        self.wheels.iter().find(|w| w.side == WheelSide::Outer)
    }

    pub fn inner(&self) -> Option<&WheelConfig> {
        self.wheels.iter().find(|w| w.side == WheelSide::Inner)
    }

    /// The session's rules as a versioned profile
    pub fn rule_profile(&self) -> RuleProfile {
        RuleProfile {
            name: self.name.clone(),
            rules: self.rules.clone(),
            ..Default::default()
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Check the whole session before any spin
    pub fn validate(&self) -> SessionResult<()> {
        let invalid = |msg: String| -> SessionResult<()> { Err(SessionError::Config(msg)) };

        let outer = self.wheels.iter().filter(|w| w.side == WheelSide::Outer).count();
        let inner = self.wheels.len() - outer;
        if outer != 1 {
            return invalid(format!("exactly one outer wheel required, found {outer}"));
        }
        if inner > 1 {
            return invalid(format!("at most one inner wheel allowed, found {inner}"));
        }

        let mut seen = HashSet::new();
        for wheel in &self.wheels {
            if !seen.insert(wheel.id()) {
                return invalid(format!("duplicate wheel id '{}'", wheel.id()));
            }
            wheel.wheel.validate()?;
            wheel.body.validate(wheel.id())?;
        }

        for wheel in &self.wheels {
            if let Some(parent) = wheel.clutch_parent.as_deref() {
                if parent == wheel.id() {
                    return invalid(format!("wheel '{parent}' cannot be clutched to itself"));
                }
                if !seen.contains(parent) {
                    return invalid(format!(
                        "wheel '{}' is clutched to unknown wheel '{parent}'",
                        wheel.id()
                    ));
                }
            }
        }

        let driver = &self.driver;
        if !driver.dt.is_finite() || driver.dt <= 0.0 {
            return invalid(format!("driver dt must be finite and > 0, got {}", driver.dt));
        }
        if driver.max_steps == 0 {
            return invalid("driver max_steps must be > 0".to_string());
        }

        let balance = &self.balance;
        if !(0.0..=1.0).contains(&balance.low) || !(balance.low..=1.0).contains(&balance.medium) {
            return invalid(format!(
                "balance thresholds must satisfy 0 <= low <= medium <= 1, got {} / {}",
                balance.low, balance.medium
            ));
        }

        let issues = self.rule_profile().validate();
        if has_errors(&issues) {
            return Err(RuleError::Validation(issues).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_core::Wedge;

    fn wheel(id: &str) -> Wheel {
        Wheel::new(
            id,
            vec![
                Wedge::new(&format!("{id}-a"), "A", 1.0),
                Wedge::new(&format!("{id}-b"), "B", 3.0),
            ],
        )
    }

    fn two_wheels() -> SessionConfig {
        SessionConfig::new(
            "table",
            vec![
                WheelConfig::new(wheel("outer"), WheelSide::Outer),
                WheelConfig::new(wheel("inner"), WheelSide::Inner)
                    .with_body(BodyConfig::new(0.5, 0.4).with_clutch_ratio(0.6))
                    .clutched_to("outer", ClutchMode::Bidirectional),
            ],
        )
    }

    #[test]
    fn test_valid_session() {
        assert!(two_wheels().validate().is_ok());
        assert_eq!(two_wheels().inner().unwrap().id(), "inner");
    }

    #[test]
    fn test_side_counts() {
        let mut config = two_wheels();
        config.wheels[1].side = WheelSide::Outer;
        assert!(matches!(config.validate(), Err(SessionError::Config(_))));

        let mut config = two_wheels();
        config.wheels[0].side = WheelSide::Inner;
        assert!(matches!(config.validate(), Err(SessionError::Config(_))));
    }

    #[test]
    fn test_unknown_clutch_parent() {
        let mut config = two_wheels();
        config.wheels[1].clutch_parent = Some("ghost".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_invalid_wheel_and_body_surface() {
        let mut config = two_wheels();
        config.wheels[0].wheel.wedges.truncate(1);
        assert!(matches!(config.validate(), Err(SessionError::Wheel(_))));

        let mut config = two_wheels();
        config.wheels[1].body.moment_of_inertia = 0.0;
        assert!(matches!(config.validate(), Err(SessionError::Physics(_))));
    }

    #[test]
    fn test_driver_validation() {
        let mut config = two_wheels();
        config.driver.dt = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"{
            "wheels": [{
                "side": "outer",
                "wheel": { "id": "w", "wedges": [
                    { "id": "a", "label": "A", "weight": 1 },
                    { "id": "b", "label": "B", "weight": 1 }
                ] }
            }]
        }"#;
        let config = SessionConfig::from_json(json).unwrap();
        assert_eq!(config.name, "session");
        assert_eq!(config.driver, DriverConfig::default());
        assert_eq!(config.wheels[0].body, BodyConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_session() {
        let yaml = r#"
name: yaml table
driver:
  dt: 0.02
  max_steps: 400
wheels:
  - side: outer
    body:
      moment_of_inertia: 2.0
      friction_coefficient: 0.8
    wheel:
      id: main
      wedges:
        - { id: a, label: A, weight: 2, visualAngleDegrees: 90 }
        - { id: b, label: B, weight: 6, visualAngleDegrees: 270 }
"#;
        let config = SessionConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.driver.max_steps, 400);
        assert!(!config.driver.record_frames);
        assert_eq!(config.wheels[0].body.moment_of_inertia, 2.0);
        assert_eq!(config.wheels[0].wheel.wedges[0].visual_angle_degrees, Some(90.0));
        assert!(config.validate().is_ok());
    }
}
