//! Configuration for the episode runner.

use std::path::Path;

use serde::{Deserialize, Serialize};
use simlink_core::SessionConfig;
use simlink_env::EpisodeConfig;
use tracing_subscriber::fmt::MakeWriter;

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Simulator connection settings.
    pub session: SessionConfig,
    /// Episode shaping shared by all variants.
    pub episode: EpisodeConfig,
    /// What to run.
    pub run: RunConfig,
    /// Replay output.
    pub recording: RecordingConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Action source for the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Hold the variant's trim action.
    #[default]
    Trim,
    /// Uniform samples from the action space.
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Registered environment name.
    pub env: String,
    /// Episodes to run before closing.
    pub episodes: u32,
    pub policy: Policy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// ACMI output path. Empty disables recording.
    pub acmi_path: String,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive, e.g. `"info"` or `"simlink_core=debug"`.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            env: "point_tracking".into(),
            episodes: 1,
            policy: Policy::Trim,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// [`load`](Self::load) under a temporary subscriber writing to
    /// `writer`, for use before the configured subscriber exists.
    pub fn load_reporting<W>(path: &Path, writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let bootstrap = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(writer)
            .without_time()
            .finish();
        tracing::subscriber::with_default(bootstrap, || Self::load(path))
    }

    /// The default configuration as pretty TOML.
    pub fn default_toml() -> std::io::Result<String> {
        toml::to_string_pretty(&Self::default()).map_err(std::io::Error::other)
    }

    /// ACMI output path, if recording is enabled.
    pub fn acmi_path(&self) -> Option<&Path> {
        let path = self.recording.acmi_path.trim();
        (!path.is_empty()).then(|| Path::new(path))
    }
}

// ── Tests ────────────────────────────────────────────────────────
