//! Parameter payloads for each command.
//!
//! | command | params                                     |
//! |---------|--------------------------------------------|
//! | init    | `{count, scenario}`                        |
//! | pause   | `{state}`                                  |
//! | reset   | `{env_ids, custom_states?}`                |
//! | step    | `{actions: {"<slot>": ActionSpec}}`        |
//! | close   | `{env_ids}`                                |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::protocol::ActionSpec;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitParams {
    pub count: u32,
    pub scenario: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PauseParams {
    pub state: bool,
}

/// Initial state override for a platform on reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformInitState {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetParams {
    pub env_ids: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_states: Option<BTreeMap<String, PlatformInitState>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepParams {
    pub actions: BTreeMap<String, ActionSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseParams {
    pub env_ids: Vec<u32>,
}
