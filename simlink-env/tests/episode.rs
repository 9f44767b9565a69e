//! Episode tests against the scripted in-memory simulator.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;
use simlink_core::testing::{FakeSimulator, Reply};
use simlink_core::{EnvObservation, PlatformObservation, Session, SessionConfig, SimError};
use simlink_env::{
    EnvError, EpisodeAdapter, EpisodeConfig, GeoPoint, PointTracking, ResetOptions, SimEnv,
    Termination, VisualizationSink, geo,
};
use tokio::io::DuplexStream;
use tokio::task::JoinHandle;

// ── Helpers ──────────────────────────────────────────────────────

const LAT: f64 = 30.0;
const LON: f64 = 120.0;

fn ownship(alt: f64) -> Reply {
    Reply::platforms(1.0, vec![PlatformObservation::at("1001", LAT, LON, alt)])
}

fn config() -> EpisodeConfig {
    EpisodeConfig {
        action_repeat: 1,
        max_steps: 3,
        seed: Some(7),
        ..Default::default()
    }
}

/// Far enough that no step lands inside the success radius.
fn far_target() -> ResetOptions {
    ResetOptions {
        target: Some(geo::offset(&GeoPoint::new(LAT, LON, 6000.0), 12_000.0, 0.0, 0.0)),
        ..Default::default()
    }
}

async fn env_with<F>(
    config: EpisodeConfig,
    script: F,
) -> (EpisodeAdapter<DuplexStream>, JoinHandle<Vec<Value>>)
where
    F: FnMut(&str, &Value) -> Reply + Send + 'static,
{
    let (client, server) = FakeSimulator::new().spawn(script);
    let mut session = Session::new(SessionConfig::default());
    session.connect_with(client).await.unwrap();
    (
        EpisodeAdapter::new(session, Box::new(PointTracking), config),
        server,
    )
}

/// Ownship at 6000 m on reset; every step reports `step_alt`.
fn level_flight(step_alt: f64) -> impl FnMut(&str, &Value) -> Reply + Send + 'static {
    move |cmd, _| match cmd {
        "reset" => ownship(6000.0),
        "step" => ownship(step_alt),
        _ => Reply::ok(),
    }
}

fn commands(seen: &[Value]) -> Vec<&str> {
    seen.iter().filter_map(|r| r["cmd"].as_str()).collect()
}

// ── Termination ──────────────────────────────────────────────────

#[tokio::test]
async fn test_crash_below_altitude_floor_terminates() {
    let (mut env, _server) = env_with(config(), level_flight(900.0)).await;
    env.reset(far_target()).await.unwrap();

    let out = env.step(&[0.0, 0.0, 0.0, 1.0]).await.unwrap();
    assert!(out.terminated);
    assert!(!out.truncated);
    assert_eq!(out.reward, -10.0);
    assert_eq!(out.info.termination, Some(Termination::Crash));
    assert_eq!(out.info.episode_length, 1);
}

#[tokio::test]
async fn test_reaching_target_terminates_with_bonus() {
    let (mut env, _server) = env_with(config(), level_flight(6000.0)).await;
    let options = ResetOptions {
        target: Some(GeoPoint::new(LAT, LON, 6100.0)),
        ..Default::default()
    };
    env.reset(options).await.unwrap();

    let out = env.step(&[0.0, 0.0, 0.0, 1.0]).await.unwrap();
    assert!(out.terminated);
    assert_eq!(out.info.termination, Some(Termination::Success));
    assert_eq!(out.info.reward_components["success"], 10.0);
    assert!(out.reward > 9.9);
}

#[tokio::test]
async fn test_truncates_at_step_limit() {
    let (mut env, _server) = env_with(config(), level_flight(6000.0)).await;
    env.reset(far_target()).await.unwrap();

    for step in 1..=3u32 {
        let out = env.step(&[0.0, 0.0, 0.0, 1.0]).await.unwrap();
        assert!(!out.terminated);
        assert_eq!(out.truncated, step == 3, "step {step}");
        assert_eq!(out.info.episode_length, step);
    }
    assert!(matches!(
        env.step(&[0.0, 0.0, 0.0, 1.0]).await,
        Err(EnvError::EpisodeFinished)
    ));

    // A new episode starts from zero.
    env.reset(far_target()).await.unwrap();
    assert_eq!(env.episode_length(), Some(0));
    let out = env.step(&[0.0, 0.0, 0.0, 1.0]).await.unwrap();
    assert_eq!(out.info.episode_length, 1);
}

#[tokio::test]
async fn test_episode_reward_accumulates() {
    let (mut env, _server) = env_with(config(), level_flight(6000.0)).await;
    env.reset(far_target()).await.unwrap();

    let a = env.step(&[0.0, 0.0, 0.0, 1.0]).await.unwrap();
    let b = env.step(&[0.0, 0.0, 0.0, 1.0]).await.unwrap();
    assert!((b.info.episode_reward - (a.reward + b.reward)).abs() < 1e-9);
    assert!(a.reward < -1.0);
}

// ── Misuse ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_step_before_reset_is_rejected() {
    let (mut env, server) = env_with(config(), level_flight(6000.0)).await;
    assert!(matches!(
        env.step(&[0.0, 0.0, 0.0, 1.0]).await,
        Err(EnvError::NotReset)
    ));

    env.close().await.unwrap();
    let seen = server.await.unwrap();
    assert_eq!(commands(&seen), vec!["init", "close"]);
}

#[tokio::test]
async fn test_wrong_action_length_is_rejected() {
    let (mut env, _server) = env_with(config(), level_flight(6000.0)).await;
    env.reset(far_target()).await.unwrap();
    let err = env.step(&[0.0, 1.0]).await.unwrap_err();
    assert!(matches!(
        err,
        EnvError::ActionShape {
            expected: 4,
            got: 2
        }
    ));
}

#[tokio::test]
async fn test_operations_after_close_fail() {
    let (mut env, _server) = env_with(config(), level_flight(6000.0)).await;
    env.reset(far_target()).await.unwrap();
    env.close().await.unwrap();
    assert!(env.session().phase().is_closed());

    assert!(matches!(
        env.step(&[0.0, 0.0, 0.0, 1.0]).await,
        Err(EnvError::Sim(SimError::SessionClosed))
    ));
    assert!(matches!(
        env.reset(ResetOptions::default()).await,
        Err(EnvError::Sim(SimError::SessionClosed))
    ));
    assert!(matches!(
        env.close().await,
        Err(EnvError::Sim(SimError::SessionClosed))
    ));
}

#[tokio::test]
async fn test_missing_slot_is_reported() {
    let (mut env, _server) = env_with(config(), |cmd, _| match cmd {
        "reset" => ownship(6000.0),
        "step" => Reply::ok(),
        _ => Reply::ok(),
    })
    .await;
    env.reset(far_target()).await.unwrap();
    assert!(matches!(
        env.step(&[0.0, 0.0, 0.0, 1.0]).await,
        Err(EnvError::NoObservation(slot)) if slot == "0"
    ));
}

// ── Wire behaviour ───────────────────────────────────────────────

#[tokio::test]
async fn test_action_repeat_and_clipping() {
    let config = EpisodeConfig {
        action_repeat: 3,
        ..config()
    };
    let (mut env, server) = env_with(config, level_flight(6000.0)).await;
    env.reset(far_target()).await.unwrap();
    env.step(&[2.0, -0.5, 0.0, -1.0]).await.unwrap();
    env.close().await.unwrap();

    let seen = server.await.unwrap();
    let steps: Vec<_> = seen.iter().filter(|r| r["cmd"] == "step").collect();
    assert_eq!(steps.len(), 3);
    for step in steps {
        let action = &step["params"]["actions"]["0"];
        assert_eq!(action["objID"], "1001");
        assert_eq!(action["vals"], serde_json::json!([1.0, -0.5, 0.0, 0.0]));
    }
}

#[tokio::test]
async fn test_reset_without_ownship_sends_trim_step() {
    let (mut env, server) = env_with(config(), |cmd, _| match cmd {
        "reset" => Reply::platforms(0.0, vec![]),
        "step" => ownship(6000.0),
        _ => Reply::ok(),
    })
    .await;
    let (state, info) = env.reset(far_target()).await.unwrap();
    assert_eq!(state.len(), env.observation_dim());
    assert_eq!(info.observation.platforms.len(), 1);
    env.close().await.unwrap();

    let seen = server.await.unwrap();
    assert_eq!(commands(&seen), vec!["init", "reset", "step", "close"]);
    assert_eq!(
        seen[2]["params"]["actions"]["0"]["vals"],
        serde_json::json!([0.5, 0.0, 0.0, 1.0])
    );
}

#[tokio::test]
async fn test_seeded_targets_repeat() {
    let (mut env, _server) = env_with(config(), level_flight(6000.0)).await;
    let seeded = || ResetOptions {
        seed: Some(99),
        ..Default::default()
    };

    let (_, first) = env.reset(seeded()).await.unwrap();
    let (_, second) = env.reset(seeded()).await.unwrap();
    assert_eq!(first.target, second.target);

    let origin = GeoPoint::new(LAT, LON, 6000.0);
    let range = geo::distance(&origin, &first.target);
    assert!((12_000.0..15_000.0).contains(&range), "range {range}");
    assert_eq!(first.target.alt, 6000.0);
}

// ── Visualization ────────────────────────────────────────────────

struct CountingSink(Arc<AtomicUsize>);

impl VisualizationSink for CountingSink {
    fn record(&mut self, _observation: &EnvObservation) -> std::io::Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct BrokenSink;

impl VisualizationSink for BrokenSink {
    fn record(&mut self, _observation: &EnvObservation) -> std::io::Result<()> {
        Err(std::io::Error::other("disk full"))
    }
}

#[tokio::test]
async fn test_sink_sees_every_observation() {
    let frames = Arc::new(AtomicUsize::new(0));
    let (env, _server) = env_with(config(), level_flight(6000.0)).await;
    let mut env = env.with_sink(Box::new(CountingSink(frames.clone())));

    env.reset(far_target()).await.unwrap();
    env.step(&[0.0, 0.0, 0.0, 1.0]).await.unwrap();
    env.step(&[0.0, 0.0, 0.0, 1.0]).await.unwrap();
    assert_eq!(frames.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_sink_failure_does_not_fail_step() {
    let (env, _server) = env_with(config(), level_flight(6000.0)).await;
    let mut env = env.with_sink(Box::new(BrokenSink));

    env.reset(far_target()).await.unwrap();
    assert!(env.step(&[0.0, 0.0, 0.0, 1.0]).await.is_ok());
}
