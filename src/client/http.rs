//! reqwest-backed upstream.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{ApiError, ApiRequest, ClientConnector, GoldRushClient, Upstream};

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://api.covalenthq.com";

/// Standard GoldRush response envelope.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: bool,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    error_code: Option<Value>,
}

impl Envelope {
    fn into_result(self) -> Result<Value, ApiError> {
        if self.error {
            return Err(ApiError::Upstream {
                code: render_code(self.error_code),
                message: self
                    .error_message
                    .unwrap_or_else(|| "unknown upstream error".to_string()),
            });
        }
        Ok(self.data.unwrap_or(Value::Null))
    }
}

fn render_code(code: Option<Value>) -> String {
    match code {
        Some(Value::String(code)) => code,
        Some(Value::Null) | None => "unknown".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Talks to the GoldRush REST API with one bearer credential.
pub struct HttpUpstream {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpUpstream {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn get(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(path = %request.path, "GoldRush request");

        let mut builder = self.http.get(&url).bearer_auth(&self.api_key);
        if !request.query.is_empty() {
            builder = builder.query(request.query.pairs());
        }
        let response = builder.send().await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            // Error bodies are usually envelopes too; fall back to the raw text.
            let message = serde_json::from_slice::<Envelope>(&body)
                .ok()
                .and_then(|envelope| envelope.error_message)
                .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice::<Envelope>(&body)
            .map_err(|e| ApiError::Malformed(e.to_string()))?
            .into_result()
    }
}

/// Hands out [`HttpUpstream`]-backed clients for a given credential.
///
/// The connection pool is shared; credentials never are.
#[derive(Clone)]
pub struct HttpConnector {
    http: reqwest::Client,
    base_url: String,
}

impl HttpConnector {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }
}

impl ClientConnector for HttpConnector {
    fn connect(&self, api_key: &str) -> Result<GoldRushClient, ApiError> {
        let upstream = HttpUpstream::new(self.http.clone(), &self.base_url, api_key);
        Ok(GoldRushClient::new(std::sync::Arc::new(upstream)))
    }
}
