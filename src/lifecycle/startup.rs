//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the channel sink and the task draining it to stdout
//! - Build the HTTP server from a validated config
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds last (traffic only when ready)

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::SourceConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::routing::PatternError;
use crate::sink::{drain_json_lines, ChannelSink, MessageSink};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid path pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Run the source until `shutdown` fires, then flush the message stream.
pub async fn run(config: SourceConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    let (sink, receiver) = ChannelSink::from_config(&config.sink);
    let sink: Arc<dyn MessageSink> = Arc::new(sink);

    let drain = tokio::spawn(drain_json_lines(receiver, tokio::io::stdout()));

    let server = HttpServer::new(&config, sink)?;

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;
    tracing::info!(
        address = %listener.local_addr()?,
        path_pattern = %config.http.path_pattern,
        security = config.security.enabled,
        csrf = config.security.enabled && config.security.csrf_enabled,
        "Listening for messages"
    );

    server.run(listener, shutdown.subscribe()).await?;

    // The server owned the last sink handle, so the drain ends once the
    // channel is empty.
    match drain.await {
        Ok(Ok(count)) => tracing::info!(messages = count, "Message stream flushed"),
        Ok(Err(e)) => tracing::error!(error = %e, "Failed writing message stream"),
        Err(e) => tracing::error!(error = %e, "Drain task panicked"),
    }
    Ok(())
}
