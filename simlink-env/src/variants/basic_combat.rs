//! Within-visual-range engagement with direct flight and weapon controls.

use simlink_core::{ActionSpec, DirectControl, PlatformObservation};

use super::{Variant, normalize, switch};
use crate::components::{ObservationAdapter, Reward, RewardCalculator, StepView};
use crate::config::EpisodeConfig;
use crate::geo::{self, GeoPoint};
use crate::space::BoxSpace;

/// `[throttle, pitch, roll, yaw, weapon, countermeasures]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicCombat;

impl Variant for BasicCombat {
    fn name(&self) -> &'static str {
        "basic_combat"
    }

    fn action_space(&self) -> BoxSpace {
        BoxSpace::new(
            [0.0, -1.0, -1.0, -1.0, 0.0, 0.0],
            [1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
        )
    }

    fn encode_action(&self, _object_id: &str, action: &[f64]) -> ActionSpec {
        let at = |i: usize| action.get(i).copied().unwrap_or_default();
        DirectControl {
            throttle: at(0),
            pitch: at(1),
            roll: at(2),
            yaw: at(3),
            weapon_control: switch(at(4)).into(),
            countermeasures: switch(at(5)).into(),
            ..Default::default()
        }
        .into()
    }

    fn trim_action(&self) -> Vec<f64> {
        vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0]
    }

    fn observer(&self) -> Box<dyn ObservationAdapter> {
        Box::new(CombatObserver::default())
    }

    fn reward(&self, _config: &EpisodeConfig) -> Box<dyn RewardCalculator> {
        Box::new(CombatReward)
    }
}

// ── Features ─────────────────────────────────────────────────────

/// Normalised ownship state followed by the nearest enemy's relative
/// geometry. With `contacts` set, two sensor features are appended.
///
/// ```text
/// 0 speed   1 alt   2 heading   3 pitch   4 roll   5 mass ratio
/// 6 range   7 bearing   8 elevation   9 speed delta   10 in range
/// [11 contacts within 80 km   12 nearest range over 150 km]
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CombatObserver {
    pub contacts: bool,
}

impl CombatObserver {
    const WEAPON_RANGE: f64 = 10_000.0;
    const ENGAGEMENT_RANGE: f64 = 50_000.0;
    const SENSOR_RANGE: f64 = 80_000.0;
    const BVR_SCALE: f64 = 150_000.0;

    fn ownship_features(view: &StepView<'_>) -> [f64; 6] {
        let p = view.ownship;
        let mass_ratio = match (p.mass, view.origin.mass) {
            (Some(m), Some(m0)) if m0 > 0.0 => m / m0,
            _ => 1.0,
        };
        [
            normalize(p.speed, 0.0, 500.0),
            normalize(p.alt, 0.0, 15_000.0),
            normalize(p.heading, 0.0, 360.0),
            normalize(p.pitch, -90.0, 90.0),
            normalize(p.roll, -180.0, 180.0),
            mass_ratio,
        ]
    }

    fn enemy_features(
        own: &PlatformObservation,
        enemy: Option<(&PlatformObservation, f64)>,
    ) -> [f64; 5] {
        let Some((enemy, distance)) = enemy else {
            return [1.0, 0.0, 0.0, 0.0, 0.0];
        };
        let (bearing, elevation) = geo::bearing_elevation(own, enemy);
        let in_range = if distance < Self::WEAPON_RANGE { 1.0 } else { 0.0 };
        [
            normalize(distance.min(Self::ENGAGEMENT_RANGE), 0.0, Self::ENGAGEMENT_RANGE),
            bearing / 180.0,
            elevation / 90.0,
            normalize((own.speed - enemy.speed).clamp(-500.0, 500.0), -500.0, 500.0),
            in_range,
        ]
    }
}

impl ObservationAdapter for CombatObserver {
    fn dimension(&self) -> usize {
        if self.contacts { 13 } else { 11 }
    }

    fn extract(&self, view: &StepView<'_>) -> Vec<f64> {
        let nearest = view.nearest_enemy();
        let mut state = Vec::with_capacity(self.dimension());
        state.extend(Self::ownship_features(view));
        state.extend(Self::enemy_features(view.ownship, nearest));

        if self.contacts {
            let own = GeoPoint::from(view.ownship);
            let contacts = view
                .enemies()
                .filter(|p| geo::distance(&own, &GeoPoint::from(*p)) < Self::SENSOR_RANGE)
                .count();
            state.push(contacts as f64);
            state.push(nearest.map_or(1.0, |(_, d)| (d / Self::BVR_SCALE).min(1.0)));
        }
        state
    }
}

// ── Reward ───────────────────────────────────────────────────────

/// Survival, engagement range, pointing angle, energy advantage, and a
/// penalty for harsh stick inputs. Scored against the nearest enemy.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombatReward;

impl CombatReward {
    const SURVIVAL: f64 = 0.01;
    const IDEAL_MIN: f64 = 5_000.0;
    const IDEAL_MAX: f64 = 10_000.0;
    const HARSH_INPUT: f64 = 0.8;
    const HARSH_PENALTY: f64 = 0.02;

    fn distance(d: f64) -> f64 {
        if (Self::IDEAL_MIN..=Self::IDEAL_MAX).contains(&d) {
            0.1
        } else if d < Self::IDEAL_MIN {
            -0.05 * (Self::IDEAL_MIN - d) / 1000.0
        } else {
            -0.02 * (d - Self::IDEAL_MAX) / 1000.0
        }
    }

    fn angle(own: &PlatformObservation, enemy: &PlatformObservation) -> f64 {
        let (bearing, elevation) = geo::bearing_elevation(own, enemy);
        let bearing = (1.0 - bearing.abs() / 30.0).max(0.0);
        let elevation = (1.0 - elevation.abs() / 15.0).max(0.0);
        (bearing + elevation) * 0.1
    }

    fn energy(own: &PlatformObservation, enemy: &PlatformObservation) -> f64 {
        let speed = (own.speed - enemy.speed) / 100.0;
        let altitude = (own.alt - enemy.alt) / 1000.0;
        (speed + altitude) * 0.1
    }
}

impl RewardCalculator for CombatReward {
    fn reward(&mut self, view: &StepView<'_>, action: &[f64]) -> Reward {
        let mut reward = Reward::default();
        reward.add("survival", Self::SURVIVAL);

        if let Some((enemy, d)) = view.nearest_enemy() {
            reward.add("distance", Self::distance(d));
            reward.add("angle", Self::angle(view.ownship, enemy));
            reward.add("energy", Self::energy(view.ownship, enemy));
        }

        let mut penalty = 0.0;
        for axis in [1, 2] {
            if action.get(axis).is_some_and(|v| v.abs() > Self::HARSH_INPUT) {
                penalty -= Self::HARSH_PENALTY;
            }
        }
        reward.add("action_penalty", penalty);
        reward
    }
}
