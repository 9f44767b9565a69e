//! simlink entry point.
//!
//! ```text
//! simlink                          Run with simlink.toml (or defaults)
//! simlink --config <path>          Load a custom config TOML
//! simlink --env bvr_combat -n 5    Override environment and episode count
//! simlink --gen-config             Write default config to stdout
//! simlink --list-envs              List registered environments
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use simlink_cli::config::AppConfig;
use simlink_cli::runner::Runner;
use simlink_core::Session;
use simlink_env::{AcmiRecorder, EnvRegistry, SimEnv};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "simlink", about = "Run episodes against a flight simulator")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "simlink.toml")]
    config: PathBuf,

    /// Simulator host (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Simulator port (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Environment name (overrides config).
    #[arg(short, long)]
    env: Option<String>,

    /// Number of episodes (overrides config).
    #[arg(short = 'n', long)]
    episodes: Option<u32>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Print registered environment names and exit.
    #[arg(long)]
    list_envs: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let registry = EnvRegistry::with_builtin();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        println!("{}", AppConfig::default_toml()?);
        return Ok(());
    }

    if cli.list_envs {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }

    // Load config, then apply command-line overrides. The configured
    // subscriber needs the config, so loading reports to stderr directly.
    let mut config = AppConfig::load_reporting(&cli.config, std::io::stderr);
    if let Some(host) = cli.host {
        config.session.host = host;
    }
    if let Some(port) = cli.port {
        config.session.port = port;
    }
    if let Some(env) = cli.env {
        config.run.env = env;
    }
    if let Some(episodes) = cli.episodes {
        config.run.episodes = episodes;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("simlink v{}", env!("CARGO_PKG_VERSION"));
    info!("simulator: {}", config.session.address());
    info!("environment: {}", config.run.env);
    info!("episodes: {} ({:?} policy)", config.run.episodes, config.run.policy);

    // Fail before connecting if the name is unknown.
    if !registry.contains(&config.run.env) {
        error!(
            "unknown environment {:?}; available: {}",
            config.run.env,
            registry.names().join(", ")
        );
        std::process::exit(2);
    }

    let (session, ownship) =
        Session::open(config.session.clone(), &config.episode.object_id).await?;
    info!(
        "platform {} ready at {:.4},{:.4} alt {:.0} m",
        ownship.name, ownship.lat, ownship.lon, ownship.alt
    );

    let mut env = registry.build(&config.run.env, session, config.episode.clone())?;
    if let Some(path) = config.acmi_path() {
        match AcmiRecorder::create(path) {
            Ok(recorder) => env = env.with_sink(Box::new(recorder)),
            Err(e) => warn!("cannot record to {}: {e}", path.display()),
        }
    }

    let mut runner = Runner::new(&config.run, config.episode.seed);
    let result = tokio::select! {
        result = runner.run(&mut env) => result.map(Some),
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
            Ok(None)
        }
    };

    if let Err(e) = env.close().await {
        warn!("close failed: {e}");
    }

    if let Some(summaries) = result? {
        let total: f64 = summaries.iter().map(|s| s.reward).sum();
        let mean = total / summaries.len().max(1) as f64;
        info!("{} episodes, mean reward {mean:.3}", summaries.len());
    }
    Ok(())
}
