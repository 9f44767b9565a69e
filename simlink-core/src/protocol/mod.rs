//! Structured payloads exchanged with the simulator.
//!
//! Each sub-module defines one side of the JSON schema: command
//! parameters, per-slot actions, and the observations returned by
//! `reset`/`step`. Payloads are serialized with `serde_json` and carried
//! inside [`Request`](crate::envelope::Request) and
//! [`Response`](crate::envelope::Response) envelopes.

pub mod action;
pub mod observation;
pub mod params;

pub use action::{ActionSpec, DirectControl, SurfaceCommand};
pub use observation::{EnvObservation, PlatformObservation, SlotData, SlotFrame};
pub use params::{
    CloseParams, InitParams, PauseParams, PlatformInitState, ResetParams, StepParams,
};
