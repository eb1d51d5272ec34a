//! Physics simulator
//!
//! Per `step(dt)`, in order:
//! 1. clutch coupling, connections in registration order
//! 2. friction on every body
//! 3. angle integration and wrap into [0, 2π)

use std::collections::HashMap;

use crate::body::{BodyConfig, BodyState, WheelPhysicsBody};
use crate::clutch::{ClutchConnection, ClutchMode, couple};
use crate::{PhysicsError, PhysicsResult};

/// Connection with endpoints resolved to body indices
#[derive(Debug, Clone, Copy)]
struct Link {
    parent: usize,
    child: usize,
    mode: ClutchMode,
}

/// Simulator for a set of wheel bodies
#[derive(Debug, Clone, Default)]
pub struct PhysicsSimulator {
    bodies: Vec<WheelPhysicsBody>,
    index: HashMap<String, usize>,
    links: Vec<Link>,
    elapsed: f64,
    step_count: u64,
}

impl PhysicsSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Register a body at rest
    pub fn add_body(&mut self, id: &str, config: BodyConfig) -> PhysicsResult<()> {
        if self.index.contains_key(id) {
            return Err(PhysicsError::DuplicateBody(id.to_string()));
        }
        let body = WheelPhysicsBody::new(id, &config)?;
        self.index.insert(id.to_string(), self.bodies.len());
        self.bodies.push(body);
        Ok(())
    }

    /// Remove a body and every connection touching it
    pub fn remove_body(&mut self, id: &str) -> bool {
        let Some(removed) = self.index.remove(id) else {
            return false;
        };
        self.bodies.remove(removed);
        self.links.retain(|l| l.parent != removed && l.child != removed);
        for link in &mut self.links {
            if link.parent > removed {
                link.parent -= 1;
            }
            if link.child > removed {
                link.child -= 1;
            }
        }
        for slot in self.index.values_mut() {
            if *slot > removed {
                *slot -= 1;
            }
        }
        true
    }

    /// Couple two bodies bidirectionally
    pub fn set_clutch_connection(&mut self, parent_id: &str, child_id: &str) -> PhysicsResult<()> {
        self.set_clutch_connection_with_mode(parent_id, child_id, ClutchMode::Bidirectional)
    }

    /// Couple two bodies; re-registering an ordered pair replaces its mode
    pub fn set_clutch_connection_with_mode(
        &mut self,
        parent_id: &str,
        child_id: &str,
        mode: ClutchMode,
    ) -> PhysicsResult<()> {
        if parent_id == child_id {
            return Err(PhysicsError::SelfConnection(parent_id.to_string()));
        }
        let parent = self.resolve(parent_id)?;
        let child = self.resolve(child_id)?;

        if self.bodies[child].clutch_ratio.is_none() {
            log::warn!(
                "Clutch child '{}' has no clutch ratio; connection to '{}' transfers nothing",
                child_id,
                parent_id
            );
        }

        match self
            .links
            .iter_mut()
            .find(|l| l.parent == parent && l.child == child)
        {
            Some(existing) => existing.mode = mode,
            None => self.links.push(Link {
                parent,
                child,
                mode,
            }),
        }
        Ok(())
    }

    /// Drop a connection
    pub fn remove_clutch_connection(&mut self, parent_id: &str, child_id: &str) -> bool {
        let (Some(&parent), Some(&child)) = (self.index.get(parent_id), self.index.get(child_id))
        else {
            return false;
        };
        let before = self.links.len();
        self.links.retain(|l| !(l.parent == parent && l.child == child));
        self.links.len() != before
    }

    /// Registered connections in evaluation order
    pub fn connections(&self) -> Vec<ClutchConnection> {
        self.links
            .iter()
            .map(|l| {
                ClutchConnection::new(&self.bodies[l.parent].id, &self.bodies[l.child].id, l.mode)
            })
            .collect()
    }

    /// Set a body's angular velocity
    pub fn set_velocity(&mut self, id: &str, value: f64) -> PhysicsResult<()> {
        if !value.is_finite() {
            return Err(PhysicsError::InvalidVelocity {
                id: id.to_string(),
                value,
            });
        }
        let i = self.resolve(id)?;
        self.bodies[i].angular_velocity = value;
        Ok(())
    }

    /// Discard all bodies, connections and elapsed time
    pub fn reset(&mut self) {
        self.bodies.clear();
        self.index.clear();
        self.links.clear();
        self.elapsed = 0.0;
        self.step_count = 0;
    }

    fn resolve(&self, id: &str) -> PhysicsResult<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| PhysicsError::UnknownBody(id.to_string()))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STEPPING
    // ═══════════════════════════════════════════════════════════════════════════

    /// Advance the simulation by `dt` seconds.
    ///
    /// A zero, negative or non-finite `dt` leaves the state untouched.
    pub fn step(&mut self, dt: f64) {
        if !dt.is_finite() || dt < 0.0 {
            log::warn!("Ignoring physics step with invalid dt {}", dt);
            return;
        }
        if dt == 0.0 {
            return;
        }

        for link in &self.links {
            let (parent, child) = pair_mut(&mut self.bodies, link.parent, link.child);
            couple(parent, child, link.mode, dt);
        }

        for body in &mut self.bodies {
            body.apply_friction(dt);
            body.integrate(dt);
        }

        self.elapsed += dt;
        self.step_count += 1;
    }

    /// Step until stable or `max_steps` is reached; returns steps taken
    pub fn run_until_stable(&mut self, dt: f64, max_steps: usize) -> usize {
        let mut steps = 0;
        while steps < max_steps && !self.is_stable() {
            self.step(dt);
            steps += 1;
        }
        if !self.is_stable() {
            log::warn!(
                "Physics not stable after {} steps (dt {}), caller ceiling reached",
                max_steps,
                dt
            );
        }
        steps
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // QUERIES
    // ═══════════════════════════════════════════════════════════════════════════

    /// State of one body
    pub fn get_state(&self, id: &str) -> PhysicsResult<BodyState> {
        Ok(self.bodies[self.resolve(id)?].state())
    }

    /// All bodies' states in registration order
    pub fn states(&self) -> impl Iterator<Item = (&str, BodyState)> + '_ {
        self.bodies.iter().map(|b| (b.id.as_str(), b.state()))
    }

    /// Every body below the stability threshold
    pub fn is_stable(&self) -> bool {
        self.bodies.iter().all(WheelPhysicsBody::is_stable)
    }

    /// Body by ID
    pub fn body(&self, id: &str) -> Option<&WheelPhysicsBody> {
        self.index.get(id).map(|&i| &self.bodies[i])
    }

    /// Body IDs in registration order
    pub fn body_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.bodies.iter().map(|b| b.id.as_str())
    }

    /// Total angular momentum
    pub fn total_angular_momentum(&self) -> f64 {
        self.bodies.iter().map(|b| b.angular_momentum()).sum()
    }

    /// Simulated seconds since the last reset
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Steps since the last reset
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Number of bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

/// Two distinct mutable elements of a slice
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}
