//! Fly the ownship to a fixed point using control surfaces.

use simlink_core::{ActionSpec, SurfaceCommand};

use super::Variant;
use crate::components::{ObservationAdapter, Reward, RewardCalculator, StepView};
use crate::config::EpisodeConfig;
use crate::geo;
use crate::space::BoxSpace;

/// `[elevator, aileron, rudder, throttle]`, sent as an indirect command.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointTracking;

impl Variant for PointTracking {
    fn name(&self) -> &'static str {
        "point_tracking"
    }

    fn action_space(&self) -> BoxSpace {
        BoxSpace::new([-1.0, -1.0, -1.0, 0.0], [1.0, 1.0, 1.0, 1.0])
    }

    fn encode_action(&self, object_id: &str, action: &[f64]) -> ActionSpec {
        let mut vals = [0.0; 4];
        for (slot, v) in vals.iter_mut().zip(action) {
            *slot = *v;
        }
        SurfaceCommand::new(object_id, vals).into()
    }

    fn trim_action(&self) -> Vec<f64> {
        vec![0.5, 0.0, 0.0, 1.0]
    }

    fn observer(&self) -> Box<dyn ObservationAdapter> {
        Box::new(PointTrackingObserver)
    }

    fn reward(&self, config: &EpisodeConfig) -> Box<dyn RewardCalculator> {
        Box::new(PointTrackingReward {
            success_radius: config.success_radius,
            min_altitude: config.min_altitude,
        })
    }
}

/// `[dx, dy, dz, heading, pitch, roll, speed, vx, vy, vz]`, raw units.
///
/// `dx, dy` place the ownship in the target's local plane; `dz` is the
/// climb still needed to reach the target altitude.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointTrackingObserver;

impl ObservationAdapter for PointTrackingObserver {
    fn dimension(&self) -> usize {
        10
    }

    fn extract(&self, view: &StepView<'_>) -> Vec<f64> {
        let p = view.ownship;
        let (dx, dy) = geo::to_local_xy(&p.into(), view.target);
        let dz = view.target.alt - p.alt;
        vec![
            dx, dy, dz, p.heading, p.pitch, p.roll, p.speed, p.vx, p.vy, p.vz,
        ]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PointTrackingReward {
    pub success_radius: f64,
    pub min_altitude: f64,
}

impl PointTrackingReward {
    const DISTANCE_SCALE: f64 = 1e-4;
    const SUCCESS_BONUS: f64 = 10.0;
    const TIME_PENALTY: f64 = 0.01;
    const CRASH_PENALTY: f64 = 10.0;
}

impl RewardCalculator for PointTrackingReward {
    fn reward(&mut self, view: &StepView<'_>, _action: &[f64]) -> Reward {
        let mut reward = Reward::default();
        if view.ownship.alt < self.min_altitude {
            reward.add("crash", -Self::CRASH_PENALTY);
            return reward;
        }

        let distance = view.target_distance();
        reward.add("distance", -distance * Self::DISTANCE_SCALE);
        if distance < self.success_radius {
            reward.add("success", Self::SUCCESS_BONUS);
        }
        reward.add("time", -Self::TIME_PENALTY);
        reward
    }
}
