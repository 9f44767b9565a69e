//! Per-slot action payloads for the `step` command.
//!
//! Two shapes are accepted by simulator builds:
//!
//! ```text
//! indirect: { "objID": "1001", "vals": [elevator, aileron, rudder, throttle] }
//! direct:   { "throttle", "pitch", "roll", "yaw", "weapon_control", "countermeasures", ... }
//! ```

use serde::{Deserialize, Serialize};

/// Control-surface command addressed to a named platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceCommand {
    #[serde(rename = "objID")]
    pub obj_id: String,
    /// `[elevator, aileron, rudder, throttle]`.
    pub vals: [f64; 4],
}

impl SurfaceCommand {
    pub fn new(obj_id: impl Into<String>, vals: [f64; 4]) -> Self {
        Self {
            obj_id: obj_id.into(),
            vals,
        }
    }
}

/// High-level flight and weapon controls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectControl {
    pub throttle: f64,
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
    pub weapon_control: u8,
    pub countermeasures: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radar_mode: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_target: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fire_missile: Option<bool>,
}

/// One slot's action in a `step` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionSpec {
    Indirect(SurfaceCommand),
    Direct(DirectControl),
}

impl From<SurfaceCommand> for ActionSpec {
    fn from(cmd: SurfaceCommand) -> Self {
        ActionSpec::Indirect(cmd)
    }
}

impl From<DirectControl> for ActionSpec {
    fn from(ctrl: DirectControl) -> Self {
        ActionSpec::Direct(ctrl)
    }
}
