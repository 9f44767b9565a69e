//! Readiness polling.
//!
//! The simulator loads scenario assets asynchronously after accepting
//! `init`; the only observable readiness signal is the target platform
//! showing up in a `reset` reply. [`ReadinessPoller`] probes with `reset`
//! at a fixed interval on the calling task until the platform appears or
//! the deadline passes.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::SimError;
use crate::protocol::PlatformObservation;
use crate::session::Session;

/// Default delay between probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Bounded `reset` polling loop.
#[derive(Debug, Clone, Copy)]
pub struct ReadinessPoller {
    interval: Duration,
    timeout: Duration,
}

impl ReadinessPoller {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Poller with the default interval.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, timeout)
    }

    /// Probe until a platform named `target` is reported.
    ///
    /// Rejected or malformed probe replies are logged and retried. Fatal
    /// transport errors and lifecycle errors end the wait immediately. On
    /// timeout the session is left in whatever phase the last probe
    /// produced.
    pub async fn wait_for<T>(
        &self,
        session: &mut Session<T>,
        target: &str,
    ) -> Result<PlatformObservation, SimError>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        info!(target, timeout = ?self.timeout, "waiting for platform");
        let started = Instant::now();
        let mut probes = 0u32;

        loop {
            probes += 1;
            match session.reset_all().await {
                Ok(data) => {
                    if let Some(platform) = data.find_platform(target) {
                        info!(target, probes, elapsed = ?started.elapsed(), "platform ready");
                        return Ok(platform.clone());
                    }
                    let loaded = data.values().map(|f| f.obs.platforms.len()).sum::<usize>();
                    debug!(target, probes, loaded, "platform not reported yet");
                }
                Err(e @ (SimError::Rejected { .. } | SimError::Protocol(_))) => {
                    warn!(target, probes, "readiness probe failed: {e}");
                }
                Err(e) => return Err(e),
            }

            let elapsed = started.elapsed();
            if elapsed >= self.timeout {
                warn!(target, probes, ?elapsed, "platform not ready before deadline");
                return Err(SimError::NotReady {
                    target: target.to_string(),
                    elapsed,
                });
            }
            tokio::time::sleep(self.interval.min(self.timeout - elapsed)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::state::SessionPhase;
    use crate::testing::{FakeSimulator, Reply};

    fn platform(name: &str) -> PlatformObservation {
        PlatformObservation::at(name, 30.0, 120.0, 6000.0)
    }

    /// Session whose simulator reports `1001` starting from the `from`-th reset.
    async fn session_reporting_from(
        from: Option<u32>,
    ) -> Session<tokio::io::DuplexStream> {
        let mut resets = 0;
        let (transport, _server) = FakeSimulator::new().spawn(move |cmd, _| {
            if cmd != "reset" {
                return Reply::ok();
            }
            resets += 1;
            match from {
                Some(n) if resets >= n => {
                    Reply::platforms(0.0, vec![platform("2001"), platform("1001")])
                }
                _ => Reply::platforms(0.0, vec![]),
            }
        });
        let mut session = Session::new(SessionConfig::default());
        session.connect_with(transport).await.unwrap();
        session
    }

    #[tokio::test(start_paused = true)]
    async fn ready_on_third_probe_before_deadline() {
        let mut session = session_reporting_from(Some(3)).await;
        let started = Instant::now();

        let found = ReadinessPoller::with_timeout(Duration::from_secs(1))
            .wait_for(&mut session, "1001")
            .await
            .unwrap();

        assert_eq!(found.name, "1001");
        assert!(started.elapsed() <= Duration::from_secs(1));
        assert_eq!(session.phase(), SessionPhase::Ready);
        // init + three resets
        assert_eq!(session.requests_sent(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn never_ready_times_out_at_deadline() {
        let mut session = session_reporting_from(None).await;
        let started = Instant::now();

        let err = ReadinessPoller::with_timeout(Duration::from_secs(1))
            .wait_for(&mut session, "1001")
            .await
            .unwrap_err();

        let elapsed = started.elapsed();
        assert!(matches!(err, SimError::NotReady { ref target, .. } if target == "1001"));
        assert!(elapsed >= Duration::from_secs(1));
        assert!(elapsed < Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_probes_are_retried() {
        let mut resets = 0;
        let (transport, _server) = FakeSimulator::new().spawn(move |cmd, _| {
            if cmd != "reset" {
                return Reply::ok();
            }
            resets += 1;
            if resets == 1 {
                Reply::error("scenario loading")
            } else {
                Reply::platforms(0.0, vec![platform("1001")])
            }
        });
        let mut session = Session::new(SessionConfig::default());
        session.connect_with(transport).await.unwrap();

        let found = session
            .wait_ready("1001", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(found.alt, 6000.0);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_loss_aborts_polling() {
        let (transport, _server) = FakeSimulator::new().spawn(|cmd, _| match cmd {
            "reset" => Reply::Hangup,
            _ => Reply::ok(),
        });
        let mut session = Session::new(SessionConfig::default());
        session.connect_with(transport).await.unwrap();

        let err = session
            .wait_ready("1001", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(session.phase().is_failed());
    }
}
