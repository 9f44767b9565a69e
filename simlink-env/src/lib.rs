//! # simlink-env
//!
//! Reinforcement-learning episodes over a [`simlink_core::Session`].
//!
//! - **Env**: the [`SimEnv`] trait with `reset` / `step` / `close`
//! - **Adapter**: [`EpisodeAdapter`], step counting, targets, action repeat
//! - **Variants**: point tracking, basic combat, BVR combat
//! - **Components**: observation, reward, termination, and replay hooks
//! - **Factory**: [`EnvRegistry`] and [`create_env`] by name
//! - **ACMI**: [`AcmiRecorder`], Tacview replay output

pub mod acmi;
pub mod adapter;
pub mod components;
pub mod config;
pub mod env;
pub mod error;
pub mod factory;
pub mod geo;
pub mod space;
pub mod variants;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use acmi::AcmiRecorder;
pub use adapter::EpisodeAdapter;
pub use components::{
    ObservationAdapter, RadiusFloorTermination, Reward, RewardCalculator, StepView, Termination,
    TerminationChecker, VisualizationSink,
};
pub use config::EpisodeConfig;
pub use env::{ResetInfo, ResetOptions, SimEnv, StepInfo, StepOutcome};
pub use error::EnvError;
pub use factory::{EnvKind, EnvRegistry, VariantCtor, create_env};
pub use geo::GeoPoint;
pub use space::BoxSpace;
pub use variants::{BasicCombat, BvrCombat, PointTracking, Variant};
