//! Session state machine.
//!
//! A [`Session`] owns one transport for its whole life and turns
//! lifecycle operations into protocol calls, tracking the
//! [`SessionPhase`] as it goes. Fatal transport errors drop the transport
//! and park the session in `Failed`; every later operation except
//! [`Session::close`] fails fast.

use std::collections::BTreeMap;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{error, info, warn};

use crate::channel::Channel;
use crate::config::SessionConfig;
use crate::envelope::Response;
use crate::error::SimError;
use crate::message::Command;
use crate::poller::ReadinessPoller;
use crate::protocol::{
    ActionSpec, CloseParams, InitParams, PauseParams, PlatformInitState, PlatformObservation,
    ResetParams, SlotData, StepParams,
};
use crate::state::SessionPhase;

/// One control session with the simulator.
#[derive(Debug)]
pub struct Session<T = TcpStream> {
    config: SessionConfig,
    phase: SessionPhase,
    channel: Option<Channel<T>>,
    /// Why the session failed, reported by every later call.
    failure: Option<String>,
}

impl Session<TcpStream> {
    /// Open a TCP connection to the configured simulator and send `init`.
    pub async fn connect(&mut self) -> Result<(), SimError> {
        self.phase.begin_connect()?;
        let address = self.config.address();
        info!(%address, scenario = %self.config.scenario, "connecting to simulator");

        let stream = match TcpStream::connect(&address).await {
            Ok(stream) => stream,
            Err(e) => {
                let err = SimError::Io(e);
                self.fail(&err);
                return Err(err);
            }
        };
        if let Err(e) = stream.set_nodelay(true) {
            warn!("failed to set TCP_NODELAY: {e}");
        }
        self.initialize(stream).await
    }

    /// Connect, send `init`, and wait until `target` is observable.
    ///
    /// The socket is released on every failure path because the session is
    /// dropped with it.
    pub async fn open(
        config: SessionConfig,
        target: &str,
    ) -> Result<(Self, PlatformObservation), SimError> {
        let mut session = Self::new(config);
        session.connect().await?;
        let timeout = session.config.ready_timeout();
        let platform = session.wait_ready(target, timeout).await?;
        Ok((session, platform))
    }
}

impl<T> Session<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            phase: SessionPhase::Disconnected,
            channel: None,
            failure: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of requests issued on the current transport.
    pub fn requests_sent(&self) -> u64 {
        self.channel.as_ref().map_or(0, Channel::requests_sent)
    }

    /// Use an already-open transport and send `init`.
    pub async fn connect_with(&mut self, transport: T) -> Result<(), SimError> {
        self.phase.begin_connect()?;
        self.initialize(transport).await
    }

    async fn initialize(&mut self, transport: T) -> Result<(), SimError> {
        self.channel = Some(
            Channel::new(transport, self.config.wire).with_read_timeout(self.config.read_timeout()),
        );

        let params = InitParams {
            count: self.config.count,
            scenario: self.config.scenario.clone(),
        };
        match self.call(Command::Init, &params).await {
            Ok(_) => {
                self.phase.complete_init()?;
                info!(scenario = %params.scenario, count = params.count, "simulator accepted init");
                Ok(())
            }
            Err(e) => {
                // A rejected init leaves nothing usable on this transport.
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Freeze (`true`) or resume (`false`) simulation time.
    pub async fn pause(&mut self, paused: bool) -> Result<(), SimError> {
        self.ensure_open()?;
        self.phase.check_pause()?;
        self.call(Command::Pause, &PauseParams { state: paused }).await?;
        self.phase.apply_pause(paused)?;
        info!(paused, "simulation pause toggled");
        Ok(())
    }

    /// Reset environment instances and return their observations.
    pub async fn reset(
        &mut self,
        env_ids: &[u32],
        custom_states: Option<BTreeMap<String, PlatformInitState>>,
    ) -> Result<SlotData, SimError> {
        self.ensure_open()?;
        self.phase.check_reset()?;
        let params = ResetParams {
            env_ids: env_ids.to_vec(),
            custom_states,
        };
        let data = self.call(Command::Reset, &params).await?.slot_data()?;
        self.phase.complete_reset()?;
        Ok(data)
    }

    /// Reset the configured environment ids with no overrides.
    pub async fn reset_all(&mut self) -> Result<SlotData, SimError> {
        let env_ids = self.config.env_ids.clone();
        self.reset(&env_ids, None).await
    }

    /// Apply per-slot actions for one simulation tick.
    pub async fn step(
        &mut self,
        actions: BTreeMap<String, ActionSpec>,
    ) -> Result<SlotData, SimError> {
        self.ensure_open()?;
        self.phase.begin_step()?;
        let result = self.call(Command::Step, &StepParams { actions }).await;
        // `call` already moved a fatal failure to `Failed`.
        if self.phase == SessionPhase::Stepping {
            self.phase.finish_step()?;
        }
        result?.slot_data()
    }

    /// Poll with `reset` until `target` is reported or `timeout` elapses.
    pub async fn wait_ready(
        &mut self,
        target: &str,
        timeout: std::time::Duration,
    ) -> Result<PlatformObservation, SimError> {
        ReadinessPoller::new(self.config.poll_interval(), timeout)
            .wait_for(self, target)
            .await
    }

    /// Best-effort `close`, then tear down the transport.
    ///
    /// Failures of the `close` request are logged, never returned. Calling
    /// this on a closed session returns [`SimError::SessionClosed`].
    pub async fn close(&mut self) -> Result<(), SimError> {
        let was = self.phase;
        self.phase.begin_close()?;

        // Owned by this future, so dropping it mid-request releases the socket.
        if let Some(mut channel) = self.channel.take() {
            if !matches!(
                was,
                SessionPhase::Failed | SessionPhase::Stepping | SessionPhase::Closing
            ) {
                let params = CloseParams {
                    env_ids: self.config.env_ids.clone(),
                };
                match channel.call(Command::Close, &params).await {
                    Ok(resp) if !resp.is_ok() => {
                        warn!(msg = ?resp.msg, "simulator refused close");
                    }
                    Ok(_) => {}
                    Err(e) => warn!("close request failed: {e}"),
                }
            }
            if let Err(e) = channel.shutdown().await {
                warn!("transport shutdown failed: {e}");
            }
        }
        self.phase.finish_close()?;
        info!("session closed");
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────

    fn ensure_open(&mut self) -> Result<(), SimError> {
        match self.phase {
            SessionPhase::Closed | SessionPhase::Closing => Err(SimError::SessionClosed),
            SessionPhase::Failed => Err(SimError::SessionFailed(
                self.failure.clone().unwrap_or_else(|| "transport lost".into()),
            )),
            // A step future was dropped mid-call; its reply is still on the wire.
            SessionPhase::Stepping => {
                let err = SimError::Desynchronized("step".into());
                self.fail(&err);
                Err(err)
            }
            _ => Ok(()),
        }
    }

    /// Issue one call, mapping `status: "error"` to `Rejected` and moving
    /// the session to `Failed` on fatal errors.
    async fn call(
        &mut self,
        command: Command,
        params: &impl Serialize,
    ) -> Result<Response, SimError> {
        let Some(channel) = self.channel.as_mut() else {
            return Err(SimError::InvalidState {
                operation: command.wire_name(),
                phase: self.phase,
            });
        };
        let result = channel.call(command, params).await;
        match result {
            Ok(resp) => resp.into_result(command),
            Err(e) => {
                if e.is_fatal() {
                    self.fail(&e);
                } else {
                    warn!(%command, "call failed: {e}");
                }
                Err(e)
            }
        }
    }

    fn fail(&mut self, err: &SimError) {
        error!(phase = %self.phase, "session failed: {err}");
        self.phase.fail();
        self.failure = Some(err.to_string());
        // Dropping the channel releases the socket.
        self.channel = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SurfaceCommand;
    use crate::testing::{FakeSimulator, Reply};
    use tokio::io::DuplexStream;

    fn one_action() -> BTreeMap<String, ActionSpec> {
        let mut actions = BTreeMap::new();
        actions.insert(
            "0".to_string(),
            SurfaceCommand::new("1001", [0.5, 0.0, 0.0, 1.0]).into(),
        );
        actions
    }

    fn plane(alt: f64) -> PlatformObservation {
        PlatformObservation::at("1001", 30.0, 120.0, alt)
    }

    async fn initialized(
        script: impl FnMut(&str, &serde_json::Value) -> Reply + Send + 'static,
    ) -> (Session<DuplexStream>, tokio::task::JoinHandle<Vec<serde_json::Value>>) {
        let (transport, server) = FakeSimulator::new().spawn(script);
        let mut session = Session::new(SessionConfig::default());
        session.connect_with(transport).await.unwrap();
        (session, server)
    }

    #[tokio::test]
    async fn init_sends_scenario_and_count() {
        let (mut session, server) = initialized(|_, _| Reply::ok()).await;
        assert_eq!(session.phase(), SessionPhase::Initializing);
        session.close().await.unwrap();

        let seen = server.await.unwrap();
        assert_eq!(seen[0]["cmd"], "init");
        assert_eq!(seen[0]["params"]["scenario"], "testWzz");
        assert_eq!(seen[0]["params"]["count"], 1);
        assert_eq!(seen.last().unwrap()["cmd"], "close");
        assert_eq!(seen.last().unwrap()["params"]["env_ids"][0], 0);
    }

    #[tokio::test]
    async fn rejected_init_fails_session() {
        let (transport, _server) = FakeSimulator::new().spawn(|_, _| Reply::error("no scenario"));
        let mut session = Session::new(SessionConfig::default());

        let err = session.connect_with(transport).await.unwrap_err();
        assert!(matches!(err, SimError::Rejected { command: "init", .. }));
        assert!(session.phase().is_failed());
        assert!(matches!(
            session.reset_all().await,
            Err(SimError::SessionFailed(_))
        ));
    }

    #[tokio::test]
    async fn step_before_reset_is_invalid_state() {
        let (mut session, _server) = initialized(|_, _| Reply::ok()).await;
        let err = session.step(one_action()).await.unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidState {
                operation: "step",
                phase: SessionPhase::Initializing
            }
        ));
    }

    #[tokio::test]
    async fn reset_then_step_returns_observations() {
        let (mut session, server) = initialized(|cmd, _| match cmd {
            "reset" | "step" => Reply::platforms(0.016, vec![plane(5000.0)]),
            _ => Reply::ok(),
        })
        .await;

        let data = session.reset_all().await.unwrap();
        assert_eq!(data.observation("0").unwrap().platforms.len(), 1);
        assert_eq!(session.phase(), SessionPhase::Ready);

        let data = session.step(one_action()).await.unwrap();
        assert_eq!(data.find_platform("1001").unwrap().alt, 5000.0);
        assert_eq!(session.phase(), SessionPhase::Ready);
        session.close().await.unwrap();

        let seen = server.await.unwrap();
        assert_eq!(seen[2]["params"]["actions"]["0"]["objID"], "1001");
    }

    #[tokio::test]
    async fn pause_toggles_between_ready_and_paused() {
        let (mut session, _server) = initialized(|_, _| Reply::ok()).await;
        assert!(session.pause(true).await.is_err());

        session.reset_all().await.unwrap();
        session.pause(true).await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Paused);
        assert!(session.step(one_action()).await.is_err());

        session.pause(false).await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Ready);
    }

    #[tokio::test]
    async fn rejected_step_keeps_session_ready() {
        let (mut session, _server) = initialized(|cmd, _| match cmd {
            "step" => Reply::error("bad action"),
            _ => Reply::ok(),
        })
        .await;
        session.reset_all().await.unwrap();

        let err = session.step(one_action()).await.unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(session.phase(), SessionPhase::Ready);
    }

    #[tokio::test]
    async fn transport_loss_mid_step_fails_fast_afterwards() {
        let (mut session, _server) = initialized(|cmd, _| match cmd {
            "step" => Reply::Truncate,
            _ => Reply::ok(),
        })
        .await;
        session.reset_all().await.unwrap();

        let err = session.step(one_action()).await.unwrap_err();
        assert!(matches!(err, SimError::ConnectionClosed));
        assert!(session.phase().is_failed());

        assert!(matches!(
            session.step(one_action()).await,
            Err(SimError::SessionFailed(_))
        ));
        assert!(matches!(
            session.pause(true).await,
            Err(SimError::SessionFailed(_))
        ));

        // close still tears down and reaches Closed.
        session.close().await.unwrap();
        assert!(session.phase().is_closed());
    }

    #[tokio::test]
    async fn every_operation_after_close_is_session_closed() {
        let (mut session, _server) = initialized(|_, _| Reply::ok()).await;
        session.close().await.unwrap();

        assert!(matches!(session.reset_all().await, Err(SimError::SessionClosed)));
        assert!(matches!(session.step(one_action()).await, Err(SimError::SessionClosed)));
        assert!(matches!(session.pause(true).await, Err(SimError::SessionClosed)));
        assert!(matches!(session.close().await, Err(SimError::SessionClosed)));
        let (transport, _other) = FakeSimulator::new().spawn(|_, _| Reply::ok());
        assert!(matches!(
            session.connect_with(transport).await,
            Err(SimError::SessionClosed)
        ));
        assert!(matches!(
            session.wait_ready("1001", std::time::Duration::from_secs(1)).await,
            Err(SimError::SessionClosed)
        ));
    }

    #[tokio::test]
    async fn close_survives_refused_close_request() {
        let (mut session, _server) = initialized(|cmd, _| match cmd {
            "close" => Reply::Hangup,
            _ => Reply::ok(),
        })
        .await;
        session.close().await.unwrap();
        assert!(session.phase().is_closed());
    }

    #[tokio::test]
    async fn dropped_close_releases_transport_and_can_finish() {
        let (mut session, server) = initialized(|cmd, _| match cmd {
            "close" => Reply::Silent,
            _ => Reply::ok(),
        })
        .await;

        let cancelled =
            tokio::time::timeout(std::time::Duration::from_millis(50), session.close()).await;
        assert!(cancelled.is_err());
        assert_eq!(session.phase(), SessionPhase::Closing);
        assert_eq!(session.requests_sent(), 0);

        // The fake simulator only stops once the client end is gone.
        let seen = server.await.unwrap();
        assert_eq!(seen.last().unwrap()["cmd"], "close");

        session.close().await.unwrap();
        assert!(session.phase().is_closed());
        assert!(matches!(session.close().await, Err(SimError::SessionClosed)));
    }

    #[tokio::test]
    async fn close_without_connect() {
        let mut session: Session<DuplexStream> = Session::new(SessionConfig::default());
        session.close().await.unwrap();
        assert!(session.phase().is_closed());
        assert_eq!(session.requests_sent(), 0);
    }

    #[tokio::test]
    async fn refused_tcp_connect_fails_session() {
        // Bind then drop to get a port nobody is listening on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut session: Session = Session::new(SessionConfig {
            port,
            ..Default::default()
        });
        let err = session.connect().await.unwrap_err();
        assert!(err.is_fatal());
        assert!(session.phase().is_failed());
    }
}
