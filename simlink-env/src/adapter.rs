//! Episode bookkeeping on top of a [`Session`].
//!
//! The adapter owns the session, the episode counters, and the target
//! point. A [`Variant`] supplies the action encoding and the collaborators
//! that turn observations into features, rewards, and terminal flags.
//!
//! ```text
//!  reset ─▶ Session::reset ─▶ (ownship present? else one trim step)
//!        ─▶ pick target ─▶ features
//!  step  ─▶ clip ─▶ Session::step × action_repeat ─▶ StepView
//!        ─▶ features, reward, terminated, truncated
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use simlink_core::{ActionSpec, EnvObservation, PlatformObservation, Session, SimError, SlotData};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::components::{
    ObservationAdapter, RewardCalculator, StepView, TerminationChecker, VisualizationSink,
};
use crate::config::EpisodeConfig;
use crate::env::{ResetInfo, ResetOptions, SimEnv, StepInfo, StepOutcome};
use crate::error::EnvError;
use crate::geo::{self, GeoPoint};
use crate::space::BoxSpace;
use crate::variants::Variant;

/// Counters and anchors of the running episode.
#[derive(Debug, Clone)]
struct Episode {
    step_count: u32,
    cumulative_reward: f64,
    target: GeoPoint,
    origin: PlatformObservation,
    finished: bool,
}

pub struct EpisodeAdapter<T = TcpStream> {
    session: Session<T>,
    config: EpisodeConfig,
    variant: Box<dyn Variant>,
    space: BoxSpace,
    observer: Box<dyn ObservationAdapter>,
    reward: Box<dyn RewardCalculator>,
    termination: Box<dyn TerminationChecker>,
    sink: Option<Box<dyn VisualizationSink>>,
    rng: ChaCha8Rng,
    episode: Option<Episode>,
}

impl<T> EpisodeAdapter<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a session that has already been initialised.
    pub fn new(session: Session<T>, variant: Box<dyn Variant>, config: EpisodeConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
        Self {
            space: variant.action_space(),
            observer: variant.observer(),
            reward: variant.reward(&config),
            termination: variant.termination(&config),
            variant,
            session,
            config,
            sink: None,
            rng,
            episode: None,
        }
    }

    /// Attach a sink that sees every observation.
    pub fn with_sink(mut self, sink: Box<dyn VisualizationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    pub fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    /// Steps taken in the current episode, if one is running.
    pub fn episode_length(&self) -> Option<u32> {
        self.episode.as_ref().map(|e| e.step_count)
    }

    /// Target of the current episode, if one is running.
    pub fn target(&self) -> Option<GeoPoint> {
        self.episode.as_ref().map(|e| e.target)
    }

    /// The variant's neutral action, useful as a hold-course policy.
    pub fn trim_action(&self) -> Vec<f64> {
        self.variant.trim_action()
    }

    fn action_map(&self, action: &[f64]) -> BTreeMap<String, ActionSpec> {
        let spec = self.variant.encode_action(&self.config.object_id, action);
        BTreeMap::from([(self.config.slot.clone(), spec)])
    }

    fn random_target(&mut self, ownship: &PlatformObservation) -> GeoPoint {
        let (dx, dy) = geo::random_arc_offset(
            &mut self.rng,
            self.config.target_min_range,
            self.config.target_max_range,
        );
        geo::offset(&ownship.into(), dx, dy, 0.0)
    }
}

#[async_trait]
impl<T> SimEnv for EpisodeAdapter<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &'static str {
        self.variant.name()
    }

    fn action_space(&self) -> &BoxSpace {
        &self.space
    }

    fn observation_dim(&self) -> usize {
        self.observer.dimension()
    }

    async fn reset(&mut self, options: ResetOptions) -> Result<(Vec<f64>, ResetInfo), EnvError> {
        if let Some(seed) = options.seed {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
        }
        self.episode = None;

        let env_ids = self.session.config().env_ids.clone();
        let data = self.session.reset(&env_ids, options.custom_states).await?;

        let observation = match take_observation(data, &self.config.slot)
            .ok()
            .filter(|o| o.platform(&self.config.object_id).is_some())
        {
            Some(observation) => observation,
            None => {
                debug!("reset reply lacks the ownship; sending trim step");
                let trim = self.action_map(&self.variant.trim_action());
                let data = self.session.step(trim).await?;
                take_observation(data, &self.config.slot)?
            }
        };
        let ownship = find_ownship(&observation, &self.config.object_id)?.clone();

        let target = match options.target {
            Some(target) => target,
            None => self.random_target(&ownship),
        };

        self.reward.reset();
        let view = StepView {
            observation: &observation,
            ownship: &ownship,
            origin: &ownship,
            target: &target,
            step_count: 0,
        };
        let state = self.observer.extract(&view);
        record(&mut self.sink, &observation);

        info!(
            env = self.variant.name(),
            target_lat = target.lat,
            target_lon = target.lon,
            target_alt = target.alt,
            "episode started"
        );
        self.episode = Some(Episode {
            step_count: 0,
            cumulative_reward: 0.0,
            target,
            origin: ownship,
            finished: false,
        });

        let info = ResetInfo {
            target,
            sim_time: observation.sim_time,
            observation,
        };
        Ok((state, info))
    }

    async fn step(&mut self, action: &[f64]) -> Result<StepOutcome, EnvError> {
        if self.session.phase().is_closed() {
            return Err(SimError::SessionClosed.into());
        }
        match &self.episode {
            None => return Err(EnvError::NotReset),
            Some(e) if e.finished => return Err(EnvError::EpisodeFinished),
            Some(_) => {}
        }
        let expected = self.space.dim();
        if action.len() != expected {
            return Err(EnvError::ActionShape {
                expected,
                got: action.len(),
            });
        }

        let clipped = self.space.clip(action);
        let actions = self.action_map(&clipped);
        let mut data = self.session.step(actions.clone()).await?;
        for _ in 1..self.config.action_repeat.max(1) {
            data = self.session.step(actions.clone()).await?;
        }
        let observation = take_observation(data, &self.config.slot)?;
        let ownship = find_ownship(&observation, &self.config.object_id)?;

        let episode = self.episode.as_mut().ok_or(EnvError::NotReset)?;
        episode.step_count += 1;

        let view = StepView {
            observation: &observation,
            ownship,
            origin: &episode.origin,
            target: &episode.target,
            step_count: episode.step_count,
        };
        let state = self.observer.extract(&view);
        let reward = self.reward.reward(&view, &clipped);
        let termination = self.termination.terminated(&view);
        let truncated = self.termination.truncated(episode.step_count);
        let target_distance = view.target_distance();

        episode.cumulative_reward += reward.total;
        episode.finished = termination.is_some() || truncated;
        let (episode_length, episode_reward) = (episode.step_count, episode.cumulative_reward);

        debug!(
            step = episode_length,
            reward = reward.total,
            distance = target_distance,
            "step applied"
        );
        if let Some(reason) = termination {
            info!(%reason, steps = episode_length, episode_reward, "episode terminated");
        } else if truncated {
            info!(steps = episode_length, episode_reward, "episode truncated");
        }
        record(&mut self.sink, &observation);

        Ok(StepOutcome {
            state,
            reward: reward.total,
            terminated: termination.is_some(),
            truncated,
            info: StepInfo {
                episode_reward,
                episode_length,
                sim_time: observation.sim_time,
                target_distance,
                reward_components: reward.components,
                termination,
                observation,
            },
        })
    }

    async fn close(&mut self) -> Result<(), EnvError> {
        if let Some(mut sink) = self.sink.take() {
            if let Err(e) = sink.close() {
                warn!("visualization sink close failed: {e}");
            }
        }
        self.episode = None;
        self.session.close().await?;
        Ok(())
    }
}

fn take_observation(data: SlotData, slot: &str) -> Result<EnvObservation, EnvError> {
    data.into_inner()
        .remove(slot)
        .map(|frame| frame.obs)
        .ok_or_else(|| EnvError::NoObservation(slot.to_string()))
}

fn find_ownship<'a>(
    observation: &'a EnvObservation,
    object_id: &str,
) -> Result<&'a PlatformObservation, EnvError> {
    observation
        .platform(object_id)
        .ok_or_else(|| EnvError::PlatformMissing(object_id.to_string()))
}

fn record(sink: &mut Option<Box<dyn VisualizationSink>>, observation: &EnvObservation) {
    if let Some(sink) = sink.as_mut() {
        if let Err(e) = sink.record(observation) {
            warn!("visualization sink failed: {e}");
        }
    }
}
