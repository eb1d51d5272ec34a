//! Spin Engine — turn resolution
//!
//! One call to [`SpinEngine::spin`] resets the bodies, drives the physics at
//! the configured fixed step until every wheel is stable (or the step
//! ceiling is hit), draws the winning wedge of every wheel from the weights,
//! evaluates the rules and books the verdict.
//!
//! Frame-driven callers run the same phases themselves:
//! [`prepare_physics`](SpinEngine::prepare_physics), step
//! [`simulator_mut`](SpinEngine::simulator_mut) once per animation frame,
//! then [`resolve`](SpinEngine::resolve).

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use wf_core::{RandomStream, WheelLayout, WheelSide};
use wf_outcome::{BalanceReport, OutcomeSelector, analyze_wheel};
use wf_physics::{BodyState, PhysicsSimulator};
use wf_rules::{
    RuleEngine, RuleEvaluationContext, RuleEvaluationResult, SpinSelection, TurnResult, Verdict,
};

use crate::config::SessionConfig;
use crate::stats::SessionStats;
use crate::{SessionError, SessionResult};

/// Initial angular velocities (rad/s) for a spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialVelocity {
    /// Same velocity for every wheel
    Uniform(f64),
    /// Per wheel id; wheels not listed start at rest
    PerWheel(BTreeMap<String, f64>),
}

/// A player's request to spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinRequest {
    pub player_id: String,
    pub velocities: InitialVelocity,
}

impl SpinRequest {
    pub fn uniform(player_id: &str, velocity: f64) -> Self {
        Self {
            player_id: player_id.to_string(),
            velocities: InitialVelocity::Uniform(velocity),
        }
    }

    pub fn per_wheel<'a>(
        player_id: &str,
        velocities: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Self {
        Self {
            player_id: player_id.to_string(),
            velocities: InitialVelocity::PerWheel(
                velocities
                    .into_iter()
                    .map(|(id, v)| (id.to_string(), v))
                    .collect(),
            ),
        }
    }
}

/// Selected wedge of one wheel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelSelection {
    pub wheel_id: String,
    pub side: WheelSide,
    pub wedge_index: usize,
    pub wedge_id: String,
    pub label: String,
    /// Angle the physics body came to rest at (radians)
    pub rest_angle: f64,
    /// Rotation (radians, >= rest angle) that puts the selected wedge's
    /// center under the pointer
    pub stop_rotation: f64,
}

/// One body's state in a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyFrame {
    pub wheel_id: String,
    #[serde(flatten)]
    pub state: BodyState,
}

/// Every body after one physics step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsFrame {
    pub step: u64,
    pub time: f64,
    pub bodies: Vec<BodyFrame>,
}

/// Physics side of a spin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsSummary {
    pub steps: u64,
    /// All bodies stable before the step ceiling
    pub settled: bool,
    /// Simulated seconds
    pub elapsed: f64,
    pub bodies: Vec<BodyFrame>,
}

/// Complete result of one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinResult {
    pub spin_id: String,
    pub round: u32,
    pub player_id: String,
    /// One per wheel, in session order
    pub selections: Vec<WheelSelection>,
    pub physics: PhysicsSummary,
    /// Empty unless frame recording is enabled
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<PhysicsFrame>,
    pub rule_results: Vec<RuleEvaluationResult>,
    pub verdict: Verdict,
    pub score_before: i64,
    pub score_after: i64,
}

impl SpinResult {
    /// Selection on one side of the table
    pub fn selection(&self, side: WheelSide) -> Option<&WheelSelection> {
        self.selections.iter().find(|s| s.side == side)
    }

    pub fn is_win(&self) -> bool {
        self.verdict.is_win()
    }
}

/// Turn resolution for one session
pub struct SpinEngine {
    config: SessionConfig,
    /// Parallel to `config.wheels`
    layouts: Vec<WheelLayout>,
    selector: OutcomeSelector,
    rules: RuleEngine,
    simulator: PhysicsSimulator,
    prepared: bool,
    scores: HashMap<String, i64>,
    history: Vec<TurnResult>,
    stats: SessionStats,
    spin_count: u64,
}

impl SpinEngine {
    /// Validate the session and build the engine around an injected stream
    pub fn new(config: SessionConfig, rng: RandomStream) -> SessionResult<Self> {
        config.validate()?;
        let rules = config.rule_profile().into_engine()?;
        let layouts = config
            .wheels
            .iter()
            .map(|w| WheelLayout::new(&w.wheel))
            .collect();

        log::debug!(
            "Session '{}': {} wheels, {} rules, seed {}",
            config.name,
            config.wheels.len(),
            rules.len(),
            rng.seed()
        );

        Ok(Self {
            config,
            layouts,
            selector: OutcomeSelector::new(rng),
            rules,
            simulator: PhysicsSimulator::new(),
            prepared: false,
            scores: HashMap::new(),
            history: Vec::new(),
            stats: SessionStats::default(),
            spin_count: 0,
        })
    }

    /// Seeded engine
    pub fn seeded(config: SessionConfig, seed: u32) -> SessionResult<Self> {
        Self::new(config, RandomStream::new(seed))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPIN EXECUTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Run a whole turn
    pub fn spin(&mut self, request: &SpinRequest) -> SessionResult<SpinResult> {
        self.prepare_physics(request)?;
        let frames = self.drive();
        let mut result = self.resolve(&request.player_id)?;
        result.frames = frames;
        Ok(result)
    }

    /// Discard the previous spin's bodies and set up a new one. Wheels start
    /// from the angle they last came to rest at.
    pub fn prepare_physics(&mut self, request: &SpinRequest) -> SessionResult<()> {
        let velocities = self.initial_velocities(&request.velocities)?;

        let rest: HashMap<String, f64> = self
            .simulator
            .states()
            .map(|(id, state)| (id.to_string(), state.angle))
            .collect();
        self.simulator.reset();

        for wheel in &self.config.wheels {
            let mut body = wheel.body;
            if let Some(&angle) = rest.get(wheel.id()) {
                body.initial_angle = angle;
            }
            self.simulator.add_body(wheel.id(), body)?;
        }
        for wheel in &self.config.wheels {
            if let Some(parent) = wheel.clutch_parent.as_deref() {
                self.simulator
                    .set_clutch_connection_with_mode(parent, wheel.id(), wheel.clutch_mode)?;
            }
        }
        for (wheel, velocity) in self.config.wheels.iter().zip(velocities) {
            self.simulator.set_velocity(wheel.id(), velocity)?;
        }

        self.prepared = true;
        Ok(())
    }

    fn initial_velocities(&self, velocities: &InitialVelocity) -> SessionResult<Vec<f64>> {
        let wheels = &self.config.wheels;
        let resolved: Vec<f64> = match velocities {
            InitialVelocity::Uniform(v) => vec![*v; wheels.len()],
            InitialVelocity::PerWheel(map) => {
                if let Some(unknown) = map.keys().find(|id| self.config.wheel(id).is_none()) {
                    return Err(SessionError::UnknownWheel(unknown.clone()));
                }
                wheels
                    .iter()
                    .map(|w| map.get(w.id()).copied().unwrap_or(0.0))
                    .collect()
            }
        };

        for (wheel, &value) in wheels.iter().zip(&resolved) {
            if !value.is_finite() {
                return Err(SessionError::InvalidVelocity {
                    wheel: wheel.id().to_string(),
                    value,
                });
            }
        }
        Ok(resolved)
    }

    /// Fixed-step drive until stable or the step ceiling
    fn drive(&mut self) -> Vec<PhysicsFrame> {
        let driver = self.config.driver;
        if !driver.record_frames {
            self.simulator.run_until_stable(driver.dt, driver.max_steps);
            return Vec::new();
        }

        let mut frames = Vec::new();
        while frames.len() < driver.max_steps && !self.simulator.is_stable() {
            self.simulator.step(driver.dt);
            frames.push(PhysicsFrame {
                step: self.simulator.step_count(),
                time: self.simulator.elapsed(),
                bodies: self.body_frames(),
            });
        }
        if !self.simulator.is_stable() {
            log::warn!(
                "Physics not stable after {} steps, caller ceiling reached",
                driver.max_steps
            );
        }
        frames
    }

    fn body_frames(&self) -> Vec<BodyFrame> {
        self.simulator
            .states()
            .map(|(id, state)| BodyFrame {
                wheel_id: id.to_string(),
                state,
            })
            .collect()
    }

    /// Select the winning wedges, evaluate rules and book the turn. The
    /// selection depends on the weights and the random stream only; the
    /// physics supplies the rest angle the stop rotation starts from.
    pub fn resolve(&mut self, player_id: &str) -> SessionResult<SpinResult> {
        if !self.prepared {
            return Err(SessionError::NotPrepared);
        }

        let mut selections = Vec::with_capacity(self.config.wheels.len());
        for (wheel, layout) in self.config.wheels.iter().zip(&self.layouts) {
            let (index, wedge) = self.selector.select_wedge(&wheel.wheel)?;
            let rest_angle = self.simulator.get_state(wheel.id())?.angle;
            selections.push(WheelSelection {
                wheel_id: wheel.id().to_string(),
                side: wheel.side,
                wedge_index: index,
                wedge_id: wedge.id.clone(),
                label: wedge.label.clone(),
                rest_angle,
                stop_rotation: layout.stop_rotation(index, rest_angle).unwrap_or(rest_angle),
            });
        }
        self.prepared = false;

        let outer = selections
            .iter()
            .find(|s| s.side == WheelSide::Outer)
            .ok_or_else(|| SessionError::Config("no outer wheel".to_string()))?;
        let inner = selections.iter().find(|s| s.side == WheelSide::Inner);
        let spin = SpinSelection::new(&outer.wedge_id, inner.map(|s| s.wedge_id.as_str()))
            .with_labels(&outer.label, inner.map(|s| s.label.as_str()));

        self.spin_count += 1;
        let round = u32::try_from(self.spin_count).unwrap_or(u32::MAX);
        let score_before = self.score(player_id);
        let outer_wedge_id = spin.outer_wedge_id.clone();
        let inner_wedge_id = spin.inner_wedge_id.clone();
        let (rule_results, verdict) = {
            let ctx = RuleEvaluationContext::new(player_id, spin)
                .with_score(score_before)
                .with_history(self.history.as_slice())
                .with_round(round);
            self.rules.verdict(&ctx)
        };

        let score_after = score_before.saturating_add(verdict.score_delta);
        self.scores.insert(player_id.to_string(), score_after);
        self.history.push(TurnResult {
            player_id: player_id.to_string(),
            round_number: round,
            outer_wedge_id,
            inner_wedge_id,
            points: verdict.score_delta,
            outcome: verdict.outcome,
        });

        let result = SpinResult {
            spin_id: format!("spin-{:06}", self.spin_count),
            round,
            player_id: player_id.to_string(),
            selections,
            physics: PhysicsSummary {
                steps: self.simulator.step_count(),
                settled: self.simulator.is_stable(),
                elapsed: self.simulator.elapsed(),
                bodies: self.body_frames(),
            },
            frames: Vec::new(),
            rule_results,
            verdict,
            score_before,
            score_after,
        };
        self.stats.record(&result);

        log::debug!(
            "{} round {} '{}': {} ({:+} → {})",
            result.spin_id,
            round,
            player_id,
            result.verdict.outcome,
            result.verdict.score_delta,
            score_after
        );
        Ok(result)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SESSION STATE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Current score of a player (0 before the first turn)
    pub fn score(&self, player_id: &str) -> i64 {
        self.scores.get(player_id).copied().unwrap_or(0)
    }

    pub fn scores(&self) -> &HashMap<String, i64> {
        &self.scores
    }

    /// All turns, oldest first
    pub fn history(&self) -> &[TurnResult] {
        &self.history
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Forget scores, history and stats. The random stream keeps going.
    pub fn reset_session(&mut self) {
        self.scores.clear();
        self.history.clear();
        self.stats = SessionStats::default();
        self.spin_count = 0;
        self.simulator.reset();
        self.prepared = false;
    }

    /// Probability vs. drawn size of every wheel
    pub fn balance_report(&self) -> SessionResult<Vec<BalanceReport>> {
        let mut reports = Vec::with_capacity(self.config.wheels.len());
        for wheel in &self.config.wheels {
            reports.push(analyze_wheel(&wheel.wheel, &self.config.balance)?);
        }
        Ok(reports)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    /// Rule editing between turns
    pub fn rules_mut(&mut self) -> &mut RuleEngine {
        &mut self.rules
    }

    pub fn simulator(&self) -> &PhysicsSimulator {
        &self.simulator
    }

    /// Per-frame stepping between `prepare_physics` and `resolve`
    pub fn simulator_mut(&mut self) -> &mut PhysicsSimulator {
        &mut self.simulator
    }

    pub fn rng(&self) -> &RandomStream {
        self.selector.rng()
    }
}
