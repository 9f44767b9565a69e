//! Episode settings shared by every environment variant.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// Slot id the adapter drives.
    pub slot: String,
    /// Name of the controlled platform.
    pub object_id: String,
    /// Steps before an episode is truncated.
    pub max_steps: u32,
    /// Simulation ticks issued per adapter step.
    pub action_repeat: u32,
    /// Distance to target (metres) that counts as success.
    pub success_radius: f64,
    /// Altitude (metres) below which the platform counts as crashed.
    pub min_altitude: f64,
    /// Inner radius of the random target arc (metres).
    pub target_min_range: f64,
    /// Outer radius of the random target arc (metres).
    pub target_max_range: f64,
    /// Seed for target sampling. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            slot: "0".into(),
            object_id: "1001".into(),
            max_steps: 200,
            action_repeat: 60,
            success_radius: 500.0,
            min_altitude: 1000.0,
            target_min_range: 12_000.0,
            target_max_range: 15_000.0,
            seed: None,
        }
    }
}
