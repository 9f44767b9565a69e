//! Built-in environment variants.
//!
//! A [`Variant`] describes what differs between environments: the action
//! layout and how it maps onto the wire, and which collaborators score
//! the episode. [`EpisodeAdapter`](crate::adapter::EpisodeAdapter) does
//! the rest.

mod basic_combat;
mod bvr_combat;
mod point_tracking;

pub use basic_combat::{BasicCombat, CombatObserver, CombatReward};
pub use bvr_combat::BvrCombat;
pub use point_tracking::{PointTracking, PointTrackingObserver, PointTrackingReward};

use simlink_core::ActionSpec;

use crate::components::{
    ObservationAdapter, RadiusFloorTermination, RewardCalculator, TerminationChecker,
};
use crate::config::EpisodeConfig;
use crate::space::BoxSpace;

pub trait Variant: Send {
    /// Registry name, e.g. `"point_tracking"`.
    fn name(&self) -> &'static str;

    fn action_space(&self) -> BoxSpace;

    /// Map a clipped action vector onto the wire action for `object_id`.
    fn encode_action(&self, object_id: &str, action: &[f64]) -> ActionSpec;

    /// Neutral action used to obtain a first observation after reset.
    fn trim_action(&self) -> Vec<f64>;

    fn observer(&self) -> Box<dyn ObservationAdapter>;

    fn reward(&self, config: &EpisodeConfig) -> Box<dyn RewardCalculator>;

    fn termination(&self, config: &EpisodeConfig) -> Box<dyn TerminationChecker> {
        Box::new(RadiusFloorTermination {
            success_radius: config.success_radius,
            min_altitude: config.min_altitude,
            max_steps: config.max_steps,
        })
    }
}

/// Map `value` from `[min, max]` onto `[-1, 1]`.
pub(crate) fn normalize(value: f64, min: f64, max: f64) -> f64 {
    2.0 * (value - min) / (max - min) - 1.0
}

/// Binary action switch.
pub(crate) fn switch(value: f64) -> bool {
    value > 0.5
}
