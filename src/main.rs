//! HTTP Source
//!
//! Listens for HTTP POST requests and forwards each body as a message.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client POST ──▶ request id ─▶ trace ─▶ timeout ─▶ body limit
//!                         │
//!                         ▼
//!                  CORS ─▶ security gate ─▶ ingress handler
//!                                                 │
//!                                                 ▼
//!     202 Accepted ◀──────────────────────── ChannelSink ──▶ stdout (JSON lines)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use http_source::config::{load_config, validation::validate_config, SourceConfig};
use http_source::lifecycle::{self, spawn_signal_listener, Shutdown};
use http_source::observability::logging;

#[derive(Parser)]
#[command(name = "http-source")]
#[command(about = "Forward HTTP POST bodies as messages", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override `http.path_pattern`.
    #[arg(short, long)]
    path_pattern: Option<String>,
}

impl Cli {
    fn load(&self) -> Result<SourceConfig, String> {
        let mut config = match &self.config {
            Some(path) => load_config(path).map_err(|e| format!("{}: {e}", path.display()))?,
            None => SourceConfig::default(),
        };
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(pattern) = &self.path_pattern {
            config.http.path_pattern = pattern.clone();
        }
        validate_config(&config).map_err(|errors| {
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        })?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "http-source starting"
    );

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    if let Err(e) = lifecycle::run(config, shutdown).await {
        tracing::error!(error = %e, "http-source failed");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
