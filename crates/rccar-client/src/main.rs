//! RC car Client entry point.
//!
//! Connects to a Host, authenticates and turns console input into driving
//! and camera commands.
//!
//! ```text
//! main()
//!  ├─ resolve target: sharing URL, host[:port] or last saved connection
//!  ├─ connect + start_client_session()
//!  ├─ stdin task  ──RemoteControl::send──► session
//!  └─ session.run()
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rccar_client::application::client_logic::{start_client_session, ClientDependencies};
use rccar_client::application::control::RemoteControl;
use rccar_client::infrastructure::console::{parse_line, ConsoleInput, ConsoleListener};
use rccar_client::infrastructure::network::connect;
use rccar_client::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config_to, ClientConfig,
};
use rccar_core::domain::ConnectionParameter;
use rccar_core::service::location::{FeedLocationService, LocationService, LocationServiceFactory};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// RC car remote control.
#[derive(Debug, Parser)]
#[command(name = "rccar-client", about = "Remote control side of the RC car link", version)]
struct Cli {
    /// Sharing URL or `host[:port]`. Defaults to the last saved connection.
    target: Option<String>,

    /// Password of the Host. Overrides one contained in the target.
    #[arg(long, env = "RCCAR_PASSWORD")]
    password: Option<String>,

    /// Settings file to use instead of the platform default.
    #[arg(long, env = "RCCAR_CLIENT_CONFIG")]
    config: Option<PathBuf>,

    /// Remember this connection for the next start.
    #[arg(long)]
    save: bool,

    /// Forget the saved connection and exit.
    #[arg(long, conflicts_with_all = ["target", "save"])]
    forget: bool,
}

impl Cli {
    /// Works out which Host to connect to.
    fn connection_parameter(&self, config: &ClientConfig) -> anyhow::Result<ConnectionParameter> {
        let mut parameter = match self.target.as_deref() {
            Some(url) if url.contains("://") => ConnectionParameter::from_connection_url(url)
                .with_context(|| format!("invalid sharing URL {url:?}"))?,
            Some(target) => ConnectionParameter::from_host_with_port(target, None)
                .with_context(|| format!("invalid host {target:?}"))?,
            None => match config.last_connection() {
                Some(parameter) => parameter,
                None => bail!("no host given and no saved connection"),
            },
        };
        if let Some(password) = &self.password {
            parameter.password = Some(password.clone());
        }
        Ok(parameter)
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
                .unwrap_or_else(|_| EnvFilter::new(&config.client.log_level)),
        )
        .init();

    if cli.forget {
        config.reset_connection();
        save_config_to(&config, &path)
            .with_context(|| format!("saving settings to {}", path.display()))?;
        info!("saved connection forgotten");
        return Ok(());
    }

    let parameter = cli.connection_parameter(&config)?;
    if cli.save {
        config.save_connection(&parameter);
        save_config_to(&config, &path)
            .with_context(|| format!("saving settings to {}", path.display()))?;
    }

    info!(host = %parameter, "connecting");
    let stream = connect(&parameter).await.context("connecting to host")?;

    let location = config.location().map(|own| -> LocationServiceFactory {
        Box::new(move || -> Box<dyn LocationService> { Box::new(FeedLocationService::fixed(own)) })
    });
    let deps = ClientDependencies {
        parameter,
        settings: config.settings(),
        location,
        listener: Box::new(ConsoleListener),
    };
    let mut session = start_client_session(stream, deps);
    let control = RemoteControl::new(session.handle());

    // ── Console input ─────────────────────────────────────────────────────────
    let input = tokio::spawn(read_console(control.clone()));

    let interrupted = tokio::select! {
        _ = session.run() => false,
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for Ctrl+C")?;
            true
        }
    };
    if interrupted {
        info!("received Ctrl+C, disconnecting");
        session.close();
    }

    input.abort();
    info!("RC car client stopped");
    Ok(())
}

/// Forwards console commands until `quit`, end of input or session end.
async fn read_console(control: RemoteControl) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("reading console failed: {e}");
                break;
            }
        };
        match parse_line(&line) {
            Ok(Some(ConsoleInput::Control(command))) => {
                if control.send(command).is_err() {
                    return;
                }
            }
            Ok(Some(ConsoleInput::Quit)) => break,
            Ok(None) => {}
            Err(e) => warn!("{e}"),
        }
    }
    control.disconnect();
}

// ── Tests ─────────────────────────────────────────────────────────────────────
