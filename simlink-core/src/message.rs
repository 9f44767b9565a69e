//! Command catalog of the simulator control channel.

use std::fmt;
use std::str::FromStr;

use crate::error::SimError;

// ── Command ──────────────────────────────────────────────────────

/// All commands understood by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Load a scenario with a number of environment instances.
    Init,
    /// Freeze or resume simulation time.
    Pause,
    /// Reset environment instances and report their observations.
    Reset,
    /// Apply per-slot actions and advance one simulation tick.
    Step,
    /// Release environment instances before disconnect.
    Close,
}

impl Command {
    /// Name carried in the request envelope's command field.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Command::Init => "init",
            Command::Pause => "pause",
            Command::Reset => "reset",
            Command::Step => "step",
            Command::Close => "close",
        }
    }
}

impl FromStr for Command {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(Command::Init),
            "pause" => Ok(Command::Pause),
            "reset" => Ok(Command::Reset),
            "step" => Ok(Command::Step),
            "close" => Ok(Command::Close),
            other => Err(SimError::protocol(format!("unknown command {other:?}"))),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
