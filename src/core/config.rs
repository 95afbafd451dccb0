//! Command line and environment configuration.
//!
//! Every flag can also be set through an environment variable, so the server
//! can be launched by MCP hosts that only pass an environment.

use clap::{Parser, ValueEnum};

use crate::client::http::DEFAULT_BASE_URL;
use crate::core::error::ConfigError;
use crate::core::session::SessionSettings;

/// Upper bound on HTTP worker threads when none are configured.
const MAX_DEFAULT_WORKERS: usize = 16;

/// GoldRush MCP server: blockchain data tools over the Model Context Protocol.
#[derive(Parser, Debug, Clone)]
#[command(name = "goldrush-mcp-server")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// GoldRush API key. Required for stdio; HTTP callers bring their own.
    #[arg(long, env = "GOLDRUSH_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Transport to serve MCP over
    #[arg(long, env = "MCP_TRANSPORT_MODE", value_enum, default_value = "stdio")]
    pub transport: TransportMode,

    /// Bind address for the HTTP transport
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the HTTP transport
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// GoldRush API base URL
    #[arg(long, env = "GOLDRUSH_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// HTTP worker threads (default: CPU count, at most 16)
    #[arg(long, env = "WORKER_THREADS")]
    pub workers: Option<usize>,

    /// Stop all-pages tools after this many pages
    #[arg(long, env = "MAX_AGGREGATED_PAGES")]
    pub max_pages: Option<usize>,

    /// Server name reported by `initialize`
    #[arg(long, env = "SERVER_NAME", default_value = "goldrush-mcp-server")]
    pub server_name: String,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportMode {
    /// Line-delimited JSON-RPC on stdin/stdout
    Stdio,
    /// JSON-RPC over `POST /mcp`
    Http,
    /// Stdio and HTTP side by side
    Both,
}

impl TransportMode {
    pub fn uses_stdio(self) -> bool {
        matches!(self, TransportMode::Stdio | TransportMode::Both)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    /// The configured API key, trimmed. Blank keys count as missing.
    pub fn require_api_key(&self) -> Result<String, ConfigError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .ok_or(ConfigError::MissingApiKey)
    }

    pub fn worker_count(&self) -> usize {
        self.workers
            .filter(|&n| n > 0)
            .unwrap_or_else(|| num_cpus::get().clamp(1, MAX_DEFAULT_WORKERS))
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            max_pages: self.max_pages.filter(|&n| n > 0),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["goldrush-mcp-server"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Config::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = parse(&[
            "--transport",
            "http",
            "--port",
            "8080",
            "--max-pages",
            "5",
            "--log-format",
            "json",
        ]);

        assert_eq!(config.transport, TransportMode::Http);
        assert_eq!(config.bind_addr(), format!("{}:8080", config.host));
        assert_eq!(config.session_settings().max_pages, Some(5));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let config = parse(&["--api-key", "   "]);
        assert!(matches!(config.require_api_key(), Err(ConfigError::MissingApiKey)));

        let config = parse(&["--api-key", " cqt_key "]);
        assert_eq!(config.require_api_key().unwrap(), "cqt_key");
    }

    #[test]
    fn test_worker_count_is_bounded() {
        let config = parse(&["--workers", "0"]);
        let workers = config.worker_count();
        assert!((1..=MAX_DEFAULT_WORKERS).contains(&workers));

        assert_eq!(parse(&["--workers", "3"]).worker_count(), 3);
    }

    #[test]
    fn test_invalid_transport_rejected() {
        assert!(Config::try_parse_from(["goldrush-mcp-server", "--transport", "sse"]).is_err());
    }

    #[test]
    fn test_stdio_modes() {
        assert!(TransportMode::Stdio.uses_stdio());
        assert!(TransportMode::Both.uses_stdio());
        assert!(!TransportMode::Http.uses_stdio());
    }
}
