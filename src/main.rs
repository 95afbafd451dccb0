//! GoldRush MCP Server Entry Point
//!
//! Parses configuration from flags and environment, sets up logging on
//! stderr and starts the selected transport:
//! - `stdio`: one session for the process, bound to `GOLDRUSH_API_KEY`
//! - `http`: a fresh session per request, bound to the caller's bearer token
//! - `both`: stdio in a background task with HTTP in the foreground

mod client;
mod core;
mod resources;
mod tools;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::client::{ClientConnector, HttpConnector};
use crate::core::config::{Config, LogFormat, TransportMode};
use crate::core::error::ConfigError;
use crate::core::server::{self, AppState, ServerInfo};
use crate::core::session::Session;

fn init_logging(config: &Config) {
    // RUST_LOG wins over --log-level when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false);

    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// Open the process-wide stdio session. A missing API key is fatal here.
fn open_stdio_session(config: &Config, connector: &HttpConnector) -> anyhow::Result<Session> {
    let api_key = config.require_api_key().inspect_err(|e| error!("{e}"))?;
    let client = connector.connect(&api_key).map_err(ConfigError::from)?;
    Session::open(client, config.session_settings()).context("failed to register tools")
}

fn app_state(config: &Config, connector: HttpConnector) -> AppState {
    AppState {
        server_info: ServerInfo::new(&config.server_name),
        connector: Arc::new(connector),
        settings: config.session_settings(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_logging(&config);

    info!(
        transport = ?config.transport,
        base_url = %config.base_url,
        max_pages = ?config.max_pages,
        "starting {}",
        config.server_name
    );

    let connector = HttpConnector::new(&config.base_url).context("failed to build HTTP client")?;
    let info = ServerInfo::new(&config.server_name);

    // Fail on a missing key before any listener is bound.
    let stdio_session = if config.transport.uses_stdio() {
        Some(open_stdio_session(&config, &connector)?)
    } else {
        None
    };

    match (config.transport, stdio_session) {
        (TransportMode::Stdio, Some(session)) => {
            server::run_server_stdio(session, info).await?;
        }
        (TransportMode::Both, Some(session)) => {
            let stdio_handle = tokio::spawn(async move {
                if let Err(e) = server::run_server_stdio(session, info).await {
                    error!(error = %e, "stdio server error");
                }
            });

            let state = app_state(&config, connector);
            let http_result = server::run_server_http(state, config.bind_addr(), config.worker_count()).await;

            // HTTP shut down; take stdio with it.
            stdio_handle.abort();
            http_result?;
        }
        _ => {
            let state = app_state(&config, connector);
            server::run_server_http(state, config.bind_addr(), config.worker_count()).await?;
        }
    }

    Ok(())
}
