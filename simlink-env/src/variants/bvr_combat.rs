//! Beyond-visual-range engagement: combat controls plus radar and missiles.

use simlink_core::{ActionSpec, DirectControl};

use super::{CombatObserver, CombatReward, Variant, switch};
use crate::components::{ObservationAdapter, RewardCalculator};
use crate::config::EpisodeConfig;
use crate::space::BoxSpace;

/// `[throttle, pitch, roll, yaw, radar_mode, lock, fire, countermeasures]`.
///
/// `radar_mode` is rounded to one of `0..=3`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BvrCombat;

impl Variant for BvrCombat {
    fn name(&self) -> &'static str {
        "bvr_combat"
    }

    fn action_space(&self) -> BoxSpace {
        BoxSpace::new(
            [0.0, -1.0, -1.0, -1.0, 0.0, 0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0, 1.0, 3.0, 1.0, 1.0, 1.0],
        )
    }

    fn encode_action(&self, _object_id: &str, action: &[f64]) -> ActionSpec {
        let at = |i: usize| action.get(i).copied().unwrap_or_default();
        let fire = switch(at(6));
        DirectControl {
            throttle: at(0),
            pitch: at(1),
            roll: at(2),
            yaw: at(3),
            weapon_control: fire.into(),
            countermeasures: switch(at(7)).into(),
            radar_mode: Some(at(4).round().clamp(0.0, 3.0) as u8),
            lock_target: Some(switch(at(5))),
            fire_missile: Some(fire),
        }
        .into()
    }

    fn trim_action(&self) -> Vec<f64> {
        vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
    }

    fn observer(&self) -> Box<dyn ObservationAdapter> {
        Box::new(CombatObserver { contacts: true })
    }

    fn reward(&self, _config: &EpisodeConfig) -> Box<dyn RewardCalculator> {
        Box::new(CombatReward)
    }
}
