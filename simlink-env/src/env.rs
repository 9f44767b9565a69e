//! The environment interface exposed to training loops.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use simlink_core::{EnvObservation, PlatformInitState};

use crate::components::Termination;
use crate::error::EnvError;
use crate::geo::GeoPoint;
use crate::space::BoxSpace;

/// Per-call overrides for [`SimEnv::reset`].
#[derive(Debug, Clone, Default)]
pub struct ResetOptions {
    /// Reseed target sampling before this episode.
    pub seed: Option<u64>,
    /// Fixed target instead of a random one.
    pub target: Option<GeoPoint>,
    /// Initial platform states forwarded to the simulator.
    pub custom_states: Option<BTreeMap<String, PlatformInitState>>,
}

/// Auxiliary data returned by `reset`.
#[derive(Debug, Clone, Serialize)]
pub struct ResetInfo {
    pub target: GeoPoint,
    pub sim_time: f64,
    pub observation: EnvObservation,
}

/// Auxiliary data returned by `step`.
#[derive(Debug, Clone, Serialize)]
pub struct StepInfo {
    pub episode_reward: f64,
    pub episode_length: u32,
    pub sim_time: f64,
    pub target_distance: f64,
    pub reward_components: BTreeMap<&'static str, f64>,
    pub termination: Option<Termination>,
    pub observation: EnvObservation,
}

/// Result of one `step`.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub state: Vec<f64>,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub info: StepInfo,
}

impl StepOutcome {
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// A reinforcement-learning environment backed by the simulator.
#[async_trait]
pub trait SimEnv: Send {
    /// Registry name of the variant.
    fn name(&self) -> &'static str;

    fn action_space(&self) -> &BoxSpace;

    /// Length of the feature vector returned by `reset` and `step`.
    fn observation_dim(&self) -> usize;

    /// Start a new episode and return its first state.
    async fn reset(&mut self, options: ResetOptions) -> Result<(Vec<f64>, ResetInfo), EnvError>;

    /// Apply `action` and advance the simulation.
    async fn step(&mut self, action: &[f64]) -> Result<StepOutcome, EnvError>;

    /// Close the underlying session. A second call fails.
    async fn close(&mut self) -> Result<(), EnvError>;
}
