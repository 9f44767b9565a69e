//! Errors raised by the episode adapter.

use simlink_core::SimError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvError {
    /// The underlying session call failed.
    #[error(transparent)]
    Sim(#[from] SimError),

    /// `step` was called before a successful `reset`.
    #[error("step called before reset")]
    NotReset,

    /// The episode already terminated or truncated.
    #[error("episode finished; call reset before stepping again")]
    EpisodeFinished,

    /// The reply carried no observation for the adapter's slot.
    #[error("no observation for slot {0}")]
    NoObservation(String),

    /// The controlled platform was absent from the slot observation.
    #[error("platform {0} missing from observation")]
    PlatformMissing(String),

    /// The action vector does not match the action space.
    #[error("action has {got} components, expected {expected}")]
    ActionShape { expected: usize, got: usize },

    /// The factory was asked for a name nobody registered.
    #[error("unknown environment {name:?}; available: {available:?}")]
    UnknownEnvironment {
        name: String,
        available: Vec<String>,
    },
}

impl EnvError {
    /// Returns `true` when the session underneath is unusable.
    pub fn is_fatal(&self) -> bool {
        match self {
            EnvError::Sim(e) => {
                e.is_fatal() || matches!(e, SimError::SessionClosed | SimError::SessionFailed(_))
            }
            _ => false,
        }
    }
}
