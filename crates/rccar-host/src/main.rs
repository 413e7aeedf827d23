//! RC car Host entry point.
//!
//! Runs on the vehicle: waits for a remote control Client, authenticates it
//! and executes its driving, camera and telemetry requests.
//!
//! ```text
//! main()
//!  ├─ load host.toml, apply CLI overrides
//!  ├─ generate + save a password on first start
//!  └─ run_host()              -- accept, serve, accept again
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rccar_host::infrastructure::server::run_host;
use rccar_host::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config_to, HostConfig,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// RC car Host.
///
/// Listens for one remote control Client at a time.
#[derive(Debug, Parser)]
#[command(name = "rccar-host", about = "Vehicle side of the RC car remote link", version)]
struct Cli {
    /// TCP port to accept the Client on. Overrides the settings file.
    #[arg(long, env = "RCCAR_PORT")]
    port: Option<u16>,

    /// IP address to bind to. Overrides the settings file.
    #[arg(long, env = "RCCAR_BIND")]
    bind: Option<String>,

    /// Password the Client must know. Overrides the settings file.
    #[arg(long, env = "RCCAR_PASSWORD")]
    password: Option<String>,

    /// Settings file to use instead of the platform default.
    #[arg(long, env = "RCCAR_HOST_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    fn apply_to(&self, config: &mut HostConfig) {
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if let Some(bind) = &self.bind {
            config.network.bind_address = bind.clone();
        }
        if let Some(password) = &self.password {
            config.security.password = Some(password.clone());
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = match &cli.config {
        Some(path) => path.clone(),
        None => config_file_path().context("locating the settings file")?,
    };
    let mut config = load_config_from(&path)
        .with_context(|| format!("loading settings from {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.host.log_level)),
        )
        .init();

    if cli.password.is_none() && config.ensure_password() {
        save_config_to(&config, &path)
            .with_context(|| format!("saving generated password to {}", path.display()))?;
        info!(path = %path.display(), "generated a new password");
    }
    cli.apply_to(&mut config);

    info!(
        port = config.network.port,
        bind = %config.network.bind_address,
        "RC car host starting"
    );

    tokio::select! {
        result = run_host(&config) => {
            if let Err(e) = &result {
                error!("host stopped: {e}");
            }
            result.context("serving clients")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for Ctrl+C")?;
            info!("received Ctrl+C, shutting down");
        }
    }

    info!("RC car host stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
