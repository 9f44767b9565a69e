//! # simlink-core
//!
//! Control-plane client for an out-of-process flight simulator.
//!
//! This crate contains:
//! - **Codec**: `FrameCodec`, length-prefixed frames for `tokio_util`
//! - **Envelopes**: `Request` / `Response` JSON envelopes and `Command`
//! - **Protocol**: typed command parameters, actions, and observations
//! - **Channel**: `Channel`, one request in flight over a framed transport
//! - **Session**: `Session`, the lifecycle state machine over a channel
//! - **Poller**: `ReadinessPoller`, bounded `reset` polling after `init`
//! - **Config**: `SessionConfig` and the `WireFormat` dialect switch
//! - **Error**: `SimError`, fatal vs per-call failures

pub mod channel;
pub mod codec;
pub mod config;
pub mod envelope;
pub mod error;
pub mod message;
pub mod poller;
pub mod protocol;
pub mod session;
pub mod state;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use channel::Channel;
pub use codec::{FrameCodec, MAX_FRAME_SIZE, encode_frame};
pub use config::{ByteOrder, CommandField, SessionConfig, WireFormat};
pub use envelope::{Request, Response, Status};
pub use error::SimError;
pub use message::Command;
pub use poller::ReadinessPoller;
pub use protocol::{
    ActionSpec, DirectControl, EnvObservation, PlatformInitState, PlatformObservation, SlotData,
    SurfaceCommand,
};
pub use session::Session;
pub use state::SessionPhase;
