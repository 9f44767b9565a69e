//! Pluggable pieces of an environment variant.
//!
//! ```text
//!              ┌───────────────────┐
//!  SlotData ─▶ │     StepView      │ ─▶ ObservationAdapter ─▶ features
//!              │ ownship, target,  │ ─▶ RewardCalculator   ─▶ reward
//!              │ origin, step no.  │ ─▶ TerminationChecker ─▶ done?
//!              └───────────────────┘
//!  EnvObservation ─────────────────────▶ VisualizationSink (optional)
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::io;

use serde::Serialize;
use simlink_core::{EnvObservation, PlatformObservation};

use crate::geo::{self, GeoPoint};

// ── StepView ─────────────────────────────────────────────────────

/// Read-only view of one observation from the adapter's point of view.
#[derive(Debug, Clone, Copy)]
pub struct StepView<'a> {
    pub observation: &'a EnvObservation,
    /// The controlled platform in this observation.
    pub ownship: &'a PlatformObservation,
    /// The controlled platform as it was right after reset.
    pub origin: &'a PlatformObservation,
    pub target: &'a GeoPoint,
    /// Completed steps in the current episode (0 right after reset).
    pub step_count: u32,
}

impl<'a> StepView<'a> {
    pub fn target_distance(&self) -> f64 {
        geo::distance(&self.ownship.into(), self.target)
    }

    /// Every platform other than the ownship.
    pub fn enemies(&self) -> impl Iterator<Item = &'a PlatformObservation> + 'a {
        self.observation.others(&self.ownship.name)
    }

    /// Closest other platform and its distance in metres.
    pub fn nearest_enemy(&self) -> Option<(&'a PlatformObservation, f64)> {
        let own = GeoPoint::from(self.ownship);
        self.enemies()
            .map(|p| (p, geo::distance(&own, &p.into())))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

// ── Collaborators ────────────────────────────────────────────────

/// Turns a raw observation into a fixed-length feature vector.
pub trait ObservationAdapter: Send {
    fn dimension(&self) -> usize;

    fn extract(&self, view: &StepView<'_>) -> Vec<f64>;
}

/// A scalar reward with its named parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reward {
    pub total: f64,
    pub components: BTreeMap<&'static str, f64>,
}

impl Reward {
    /// Add a named part to the total.
    pub fn add(&mut self, name: &'static str, value: f64) {
        self.total += value;
        *self.components.entry(name).or_default() += value;
    }
}

pub trait RewardCalculator: Send {
    /// Reward for the step that produced `view` under `action`.
    fn reward(&mut self, view: &StepView<'_>, action: &[f64]) -> Reward;

    /// Clear per-episode state.
    fn reset(&mut self) {}
}

/// Why an episode terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The ownship came within the success radius of the target.
    Success,
    /// The ownship dropped below the altitude floor.
    Crash,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Success => write!(f, "success"),
            Termination::Crash => write!(f, "crash"),
        }
    }
}

pub trait TerminationChecker: Send {
    /// Terminal condition reached in `view`, if any.
    fn terminated(&self, view: &StepView<'_>) -> Option<Termination>;

    /// Whether the episode ran out of steps.
    fn truncated(&self, step_count: u32) -> bool;
}

/// Receives every observation, e.g. to write a replay file.
///
/// Errors are logged by the adapter and never fail a step.
pub trait VisualizationSink: Send {
    fn record(&mut self, observation: &EnvObservation) -> io::Result<()>;

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ── Default termination ──────────────────────────────────────────

/// Crash below an altitude floor, succeed inside a radius, truncate at a
/// step limit. Crash wins when both hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusFloorTermination {
    pub success_radius: f64,
    pub min_altitude: f64,
    pub max_steps: u32,
}

impl TerminationChecker for RadiusFloorTermination {
    fn terminated(&self, view: &StepView<'_>) -> Option<Termination> {
        if view.ownship.alt < self.min_altitude {
            Some(Termination::Crash)
        } else if view.target_distance() < self.success_radius {
            Some(Termination::Success)
        } else {
            None
        }
    }

    fn truncated(&self, step_count: u32) -> bool {
        step_count >= self.max_steps
    }
}
