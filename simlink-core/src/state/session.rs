//! Session lifecycle phases.
//!
//! Models the lifecycle of one simulator session with validated
//! transitions that return `Result` instead of panicking.
//!
//! ```text
//!  Disconnected ──► Connecting ──► Initializing ──► Ready ◄──► Paused
//!                                       │           │  ▲
//!                                       │           ▼  │
//!                                       │         Stepping
//!                                       ▼
//!             (any) ──► Closing ──► Closed         (any) ──► Failed
//! ```

use std::fmt;

use crate::error::SimError;

// ── SessionPhase ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No transport. Initial state.
    #[default]
    Disconnected,

    /// Transport being opened and `init` in progress.
    Connecting,

    /// `init` accepted; the scenario may still be loading.
    Initializing,

    /// At least one reset succeeded; steps are allowed.
    Ready,

    /// Simulation time frozen by `pause(true)`.
    Paused,

    /// A `step` request is in flight.
    Stepping,

    /// Best-effort `close` in progress.
    Closing,

    /// Terminal. Every operation fails with `SessionClosed`.
    Closed,

    /// Transport lost. Every operation except `close` fails fast.
    Failed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl SessionPhase {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns `true` when a `step` would be accepted.
    pub fn can_step(&self) -> bool {
        matches!(self, Self::Ready)
    }

    fn invalid(self, operation: &'static str) -> SimError {
        SimError::InvalidState {
            operation,
            phase: self,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transition to `Connecting`.
    ///
    /// Valid from: `Disconnected`.
    pub fn begin_connect(&mut self) -> Result<(), SimError> {
        match self {
            Self::Disconnected => {
                *self = Self::Connecting;
                Ok(())
            }
            Self::Closed | Self::Closing => Err(SimError::SessionClosed),
            other => Err(other.invalid("connect")),
        }
    }

    /// Transition to `Initializing` once `init` is accepted.
    ///
    /// Valid from: `Connecting`.
    pub fn complete_init(&mut self) -> Result<(), SimError> {
        match self {
            Self::Connecting => {
                *self = Self::Initializing;
                Ok(())
            }
            other => Err(other.invalid("finish init")),
        }
    }

    /// Check that a `reset` may be issued.
    ///
    /// Valid from: `Initializing`, `Ready`, `Paused`.
    pub fn check_reset(&self) -> Result<(), SimError> {
        match self {
            Self::Initializing | Self::Ready | Self::Paused => Ok(()),
            other => Err(other.invalid("reset")),
        }
    }

    /// Transition to `Ready` after a successful reset.
    pub fn complete_reset(&mut self) -> Result<(), SimError> {
        self.check_reset()?;
        *self = Self::Ready;
        Ok(())
    }

    /// Check that a `pause` may be issued.
    ///
    /// Valid from: `Ready`, `Paused`.
    pub fn check_pause(&self) -> Result<(), SimError> {
        match self {
            Self::Ready | Self::Paused => Ok(()),
            other => Err(other.invalid("pause")),
        }
    }

    /// Apply an accepted pause flag: `true` → `Paused`, `false` → `Ready`.
    pub fn apply_pause(&mut self, paused: bool) -> Result<(), SimError> {
        self.check_pause()?;
        *self = if paused { Self::Paused } else { Self::Ready };
        Ok(())
    }

    /// Transition to `Stepping`.
    ///
    /// Valid from: `Ready`.
    pub fn begin_step(&mut self) -> Result<(), SimError> {
        match self {
            Self::Ready => {
                *self = Self::Stepping;
                Ok(())
            }
            other => Err(other.invalid("step")),
        }
    }

    /// Transition back to `Ready` once the step reply is in.
    ///
    /// Valid from: `Stepping`.
    pub fn finish_step(&mut self) -> Result<(), SimError> {
        match self {
            Self::Stepping => {
                *self = Self::Ready;
                Ok(())
            }
            other => Err(other.invalid("finish step")),
        }
    }

    /// Transition to `Closing`.
    ///
    /// Valid from any state except `Closed`. From `Closing` it resumes a
    /// teardown whose future was dropped.
    pub fn begin_close(&mut self) -> Result<(), SimError> {
        match self {
            Self::Closed => Err(SimError::SessionClosed),
            _ => {
                *self = Self::Closing;
                Ok(())
            }
        }
    }

    /// Transition to `Closed`.
    ///
    /// Valid from: `Closing`.
    pub fn finish_close(&mut self) -> Result<(), SimError> {
        match self {
            Self::Closing => {
                *self = Self::Closed;
                Ok(())
            }
            other => Err(other.invalid("finish close")),
        }
    }

    /// Force `Failed` after a transport error. `Closed` stays `Closed`.
    pub fn fail(&mut self) {
        if !self.is_closed() {
            *self = Self::Failed;
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
