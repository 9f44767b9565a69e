//! Observation payloads returned by `reset` and `step`.
//!
//! ```text
//! data: { "<env_id>": { "obs": { "sim_time": f64, "platforms": [Platform] } } }
//! ```

use std::collections::BTreeMap;
use std::ops::{Deref, Index};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SimError;

// ── PlatformObservation ──────────────────────────────────────────

/// Pose and kinematic state of one simulated vehicle.
///
/// Angles are in degrees, altitude in metres, speeds in metres/second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformObservation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    #[serde(default)]
    pub heading: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub roll: f64,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub vx: f64,
    #[serde(default)]
    pub vy: f64,
    #[serde(default)]
    pub vz: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<f64>,
}

impl PlatformObservation {
    /// A platform at rest at the given position. Mostly useful in tests.
    pub fn at(name: impl Into<String>, lat: f64, lon: f64, alt: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
            alt,
            heading: 0.0,
            pitch: 0.0,
            roll: 0.0,
            speed: 0.0,
            vx: 0.0,
            vy: 0.0,
            vz: 0.0,
            mass: None,
        }
    }
}

// ── EnvObservation ───────────────────────────────────────────────

/// Everything the simulator reports for one environment slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvObservation {
    #[serde(default)]
    pub sim_time: f64,
    #[serde(default)]
    pub platforms: Vec<PlatformObservation>,
}

impl EnvObservation {
    /// Look up a platform by name.
    pub fn platform(&self, name: &str) -> Option<&PlatformObservation> {
        self.platforms.iter().find(|p| p.name == name)
    }

    /// All platforms except the named one.
    pub fn others<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a PlatformObservation> {
        self.platforms.iter().filter(move |p| p.name != name)
    }
}

/// Per-slot wrapper: `{ "obs": EnvObservation }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotFrame {
    pub obs: EnvObservation,
}

// ── SlotData ─────────────────────────────────────────────────────

/// The `data` field of a `reset`/`step` reply, keyed by env id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotData(BTreeMap<String, SlotFrame>);

impl SlotData {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn deserialize_from(value: &Value) -> Result<Self, SimError> {
        Self::deserialize(value)
            .map_err(|e| SimError::protocol(format!("unexpected data shape: {e}")))
    }

    pub fn insert(&mut self, slot: impl Into<String>, obs: EnvObservation) {
        self.0.insert(slot.into(), SlotFrame { obs });
    }

    /// Observation for a slot, if present.
    pub fn observation(&self, slot: &str) -> Option<&EnvObservation> {
        self.0.get(slot).map(|f| &f.obs)
    }

    /// Find a platform by name in any slot.
    pub fn find_platform(&self, name: &str) -> Option<&PlatformObservation> {
        self.0.values().find_map(|f| f.obs.platform(name))
    }

    pub fn into_inner(self) -> BTreeMap<String, SlotFrame> {
        self.0
    }
}

impl Deref for SlotData {
    type Target = BTreeMap<String, SlotFrame>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Index<&str> for SlotData {
    type Output = SlotFrame;

    fn index(&self, slot: &str) -> &Self::Output {
        &self.0[slot]
    }
}
