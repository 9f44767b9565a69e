//! Domain-specific error types for the simulator session protocol.
//!
//! All fallible operations return `Result<T, SimError>`. Errors are split
//! into fatal transport failures, which poison the session, and per-call
//! failures, which leave the session usable. See [`SimError::is_fatal`].

use std::time::Duration;
use thiserror::Error;

use crate::state::SessionPhase;

/// The canonical error type for the simulator session protocol.
#[derive(Debug, Error)]
pub enum SimError {
    // ── Transport Errors (fatal) ─────────────────────────────────
    /// The peer closed the connection, possibly in the middle of a frame.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// The TCP/IO layer reported an error.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame declared a length beyond the codec limit.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// No reply arrived within the configured read timeout.
    #[error("no reply within {0:?}")]
    ReadTimeout(Duration),

    /// A previous call was abandoned between request and reply, so the
    /// next frame on the wire cannot be matched to a request.
    #[error("channel desynchronized: previous request {0} never completed")]
    Desynchronized(String),

    // ── Protocol Errors (non-fatal) ──────────────────────────────
    /// A reply was decoded but is not a valid response envelope.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The simulator answered with `status: "error"`.
    #[error("{command} rejected by simulator: {msg}")]
    Rejected { command: &'static str, msg: String },

    /// Encoding or decoding of a JSON payload failed.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    // ── Lifecycle Errors ─────────────────────────────────────────
    /// The operation is not valid in the current session phase.
    #[error("cannot {operation} while session is {phase}")]
    InvalidState {
        operation: &'static str,
        phase: SessionPhase,
    },

    /// The session was closed; no further calls are permitted.
    #[error("session closed")]
    SessionClosed,

    /// The session hit an unrecoverable transport failure earlier.
    #[error("session failed: {0}")]
    SessionFailed(String),

    /// The expected platform did not appear before the readiness deadline.
    #[error("platform {target} not ready after {elapsed:?}")]
    NotReady { target: String, elapsed: Duration },
}

impl SimError {
    /// Returns `true` when the error leaves the transport unusable.
    ///
    /// Fatal errors move the session to `Failed`; every later call then
    /// fails fast with [`SimError::SessionFailed`].
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SimError::ConnectionClosed
                | SimError::Io(_)
                | SimError::FrameTooLarge { .. }
                | SimError::ReadTimeout(_)
                | SimError::Desynchronized(_)
        )
    }

    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        SimError::Protocol(msg.into())
    }
}
