//! Episode loop driven by a built-in policy.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use simlink_env::{EnvError, EpisodeAdapter, ResetOptions, SimEnv, Termination};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;

use crate::config::{Policy, RunConfig};

/// How one episode ended.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub episode: u32,
    pub steps: u32,
    pub reward: f64,
    pub termination: Option<Termination>,
    pub truncated: bool,
}

pub struct Runner {
    policy: Policy,
    episodes: u32,
    rng: ChaCha8Rng,
}

impl Runner {
    /// `seed` drives the random policy; `None` seeds from entropy.
    pub fn new(run: &RunConfig, seed: Option<u64>) -> Self {
        Self {
            policy: run.policy,
            episodes: run.episodes,
            rng: seed.map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64),
        }
    }

    /// Run every configured episode on `env`. Does not close it.
    pub async fn run<T>(
        &mut self,
        env: &mut EpisodeAdapter<T>,
    ) -> Result<Vec<EpisodeSummary>, EnvError>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let mut summaries = Vec::with_capacity(self.episodes as usize);
        for episode in 1..=self.episodes {
            let summary = self.episode(env, episode).await?;
            info!(
                episode,
                steps = summary.steps,
                reward = summary.reward,
                outcome = summary.termination.map_or("truncated", |t| match t {
                    Termination::Success => "success",
                    Termination::Crash => "crash",
                }),
                "episode finished"
            );
            summaries.push(summary);
        }
        Ok(summaries)
    }

    async fn episode<T>(
        &mut self,
        env: &mut EpisodeAdapter<T>,
        episode: u32,
    ) -> Result<EpisodeSummary, EnvError>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send,
    {
        env.reset(ResetOptions::default()).await?;
        loop {
            let action = self.action(env);
            let out = env.step(&action).await?;
            if out.done() {
                return Ok(EpisodeSummary {
                    episode,
                    steps: out.info.episode_length,
                    reward: out.info.episode_reward,
                    termination: out.info.termination,
                    truncated: out.truncated,
                });
            }
        }
    }

    fn action<T>(&mut self, env: &EpisodeAdapter<T>) -> Vec<f64>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send,
    {
        match self.policy {
            Policy::Trim => env.trim_action(),
            Policy::Random => env.action_space().sample(&mut self.rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use simlink_core::testing::{FakeSimulator, Reply};
    use simlink_core::{PlatformObservation, Session, SessionConfig};
    use simlink_env::{EnvRegistry, EpisodeConfig};
    use tokio::io::DuplexStream;
    use tokio::task::JoinHandle;

    async fn env(name: &str) -> (EpisodeAdapter<DuplexStream>, JoinHandle<Vec<Value>>) {
        let (client, server) = FakeSimulator::new().spawn(|cmd, _| match cmd {
            "reset" | "step" => Reply::platforms(
                0.0,
                vec![
                    PlatformObservation::at("1001", 30.0, 120.0, 6000.0),
                    PlatformObservation::at("2001", 30.05, 120.0, 6000.0),
                ],
            ),
            _ => Reply::ok(),
        });
        let mut session = Session::new(SessionConfig::default());
        session.connect_with(client).await.unwrap();
        let config = EpisodeConfig {
            max_steps: 2,
            action_repeat: 1,
            seed: Some(1),
            ..Default::default()
        };
        let env = EnvRegistry::with_builtin()
            .build(name, session, config)
            .unwrap();
        (env, server)
    }

    #[tokio::test]
    async fn runs_configured_episode_count() {
        let (mut env, _server) = env("point_tracking").await;
        let run = RunConfig {
            episodes: 3,
            ..Default::default()
        };
        let summaries = Runner::new(&run, Some(1)).run(&mut env).await.unwrap();
        assert_eq!(summaries.len(), 3);
        for (i, s) in summaries.iter().enumerate() {
            assert_eq!(s.episode, i as u32 + 1);
            assert_eq!(s.steps, 2);
            assert!(s.truncated);
            assert!(s.termination.is_none());
        }
    }

    #[tokio::test]
    async fn random_policy_stays_in_bounds() {
        let (mut env, server) = env("bvr_combat").await;
        let run = RunConfig {
            policy: Policy::Random,
            ..Default::default()
        };
        Runner::new(&run, Some(5)).run(&mut env).await.unwrap();
        env.close().await.unwrap();

        let seen = server.await.unwrap();
        let steps: Vec<_> = seen.iter().filter(|r| r["cmd"] == "step").collect();
        assert_eq!(steps.len(), 2);
        for step in steps {
            let action = &step["params"]["actions"]["0"];
            let throttle = action["throttle"].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&throttle));
            assert!(action["radar_mode"].as_u64().unwrap() <= 3);
        }
    }
}
