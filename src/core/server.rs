//! MCP Server Implementation
//!
//! This module contains the protocol front-end of the server:
//! - JSON-RPC 2.0 request/response structures and error codes
//! - Method routing onto a [`Session`]
//! - HTTP server setup with Actix Web, with per-request credentials
//! - STDIO server implementation for line-based communication

use actix_web::{
    App, HttpRequest, HttpResponse, HttpServer,
    http::header,
    middleware::{Compress, DefaultHeaders, Logger},
    web,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::client::ClientConnector;
use crate::core::error::RegistryError;
use crate::core::session::{Session, SessionSettings};

/// Invalid JSON was received.
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid request object.
pub const INVALID_REQUEST: i32 = -32600;
/// The method (or tool) does not exist.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameters, including tool argument schema violations.
pub const INVALID_PARAMS: i32 = -32602;
/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i32 = -32603;
/// Generic server error, used for unsupported HTTP methods.
pub const SERVER_ERROR: i32 = -32000;
/// Missing or invalid credential.
pub const UNAUTHORIZED: i32 = -32001;
/// The requested resource URI is not registered.
pub const RESOURCE_NOT_FOUND: i32 = -32002;

/// Protocol revisions this server speaks, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];

/// Server identity reported by `initialize`.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    /// Server name as reported in MCP initialize responses
    pub name: String,
    /// Server version string as reported in MCP initialize responses
    pub version: String,
}

impl ServerInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// JSON-RPC 2.0 request structure for MCP protocol.
///
/// All MCP requests follow the JSON-RPC 2.0 specification. The jsonrpc field
/// must be "2.0", id is optional (None for notifications), method specifies
/// the MCP method to call, and params contains method-specific parameters.
#[derive(Deserialize, Debug)]
pub struct MCPRequest {
    /// JSON-RPC version identifier, must be "2.0"
    jsonrpc: String,
    /// Request ID for correlating responses. None indicates a notification.
    #[serde(default)]
    id: Option<Value>,
    /// MCP method name (e.g., "initialize", "tools/list", "tools/call")
    method: String,
    /// Method-specific parameters as JSON value
    #[serde(default)]
    params: Option<Value>,
}

/// JSON-RPC 2.0 response structure for MCP protocol.
///
/// Responses must include jsonrpc "2.0", the request id, and either a result
/// or an error. The id is null when the request could not be read at all.
#[derive(Serialize, Debug)]
pub struct MCPResponse {
    /// JSON-RPC version identifier, always "2.0"
    jsonrpc: &'static str,
    /// Request ID from the original request
    id: Option<Value>,
    /// Response result, present when request succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    /// Error information, present when request failed
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<MCPError>,
}

impl MCPResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<Value>, error: MCPError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC 2.0 error structure.
///
/// Errors follow the JSON-RPC 2.0 error format with a numeric code, message,
/// and optional additional data.
#[derive(Serialize, Debug)]
pub struct MCPError {
    /// JSON-RPC error code (e.g., -32601 for method not found)
    code: i32,
    /// Human-readable error message
    message: String,
    /// Optional additional error data
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl MCPError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<RegistryError> for MCPError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownTool(_) => MCPError::new(METHOD_NOT_FOUND, err.to_string()),
            RegistryError::UnknownResource(ref uri) => {
                let data = json!({ "uri": uri });
                MCPError::new(RESOURCE_NOT_FOUND, err.to_string()).with_data(data)
            }
            RegistryError::InvalidParams { tool, violations } => {
                MCPError::new(INVALID_PARAMS, format!("Invalid arguments for tool {tool}"))
                    .with_data(json!(violations))
            }
            other => MCPError::new(INTERNAL_ERROR, other.to_string()),
        }
    }
}

/// `tools/call` parameters.
#[derive(Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// `resources/read` parameters.
#[derive(Deserialize)]
struct ReadResourceParams {
    uri: String,
}

fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, MCPError> {
    let params = params.ok_or_else(|| MCPError::new(INVALID_PARAMS, "Invalid params: missing params"))?;
    serde_json::from_value(params).map_err(|e| MCPError::new(INVALID_PARAMS, format!("Invalid params: {e}")))
}

fn to_result<T: Serialize>(value: T) -> Result<Value, MCPError> {
    serde_json::to_value(value).map_err(|e| MCPError::new(INTERNAL_ERROR, e.to_string()))
}

/// Handle MCP initialize method.
///
/// Echoes the client's protocol version when it is one we speak, otherwise
/// answers with the newest supported version and lets the client decide.
///
/// # Arguments
/// * `info` - Server identity to report
/// * `params` - Raw initialize params; only `protocolVersion` is read
fn handle_initialize(info: &ServerInfo, params: Option<Value>) -> Value {
    // Client capabilities and clientInfo are accepted but not acted on
    let requested = params
        .as_ref()
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str);
    let version = requested
        .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(v))
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0]);

    json!({
        "protocolVersion": version,
        "capabilities": {
            "tools": { "listChanged": false },
            "resources": { "subscribe": false, "listChanged": false }
        },
        "serverInfo": {
            "name": info.name,
            "version": info.version
        }
    })
}

/// Route one method call onto the session.
///
/// Registry errors convert into JSON-RPC errors through `From<RegistryError>`,
/// so `?` is enough to pick the right error code.
async fn route(session: &Session, info: &ServerInfo, method: &str, params: Option<Value>) -> Result<Value, MCPError> {
    match method {
        "initialize" => Ok(handle_initialize(info, params)),
        // Ping carries no payload either way
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": session.tools()? })),
        "tools/call" => {
            // Handler failures come back as an isError result, not an Err
            let call: CallToolParams = parse_params(params)?;
            to_result(session.dispatch(&call.name, call.arguments).await?)
        }
        "resources/list" => Ok(json!({ "resources": session.resources()? })),
        "resources/templates/list" => Ok(json!({ "resourceTemplates": session.resource_templates()? })),
        "resources/read" => {
            let read: ReadResourceParams = parse_params(params)?;
            to_result(session.read(&read.uri).await?)
        }
        _ => Err(MCPError::new(METHOD_NOT_FOUND, format!("Method not found: {method}"))),
    }
}

/// Handle one decoded JSON-RPC message.
///
/// Returns `None` for notifications, which never get a response.
///
/// # Arguments
/// * `session` - Ready session the request runs against
/// * `info` - Server identity, used by `initialize`
/// * `req` - The decoded request
pub async fn handle_request(session: &Session, info: &ServerInfo, req: MCPRequest) -> Option<MCPResponse> {
    // No id means a notification: act on nothing and stay silent
    let Some(id) = req.id else {
        debug!(method = %req.method, "notification received");
        return None;
    };

    // Only JSON-RPC 2.0 is spoken
    if req.jsonrpc != "2.0" {
        return Some(MCPResponse::failure(
            Some(id),
            MCPError::new(INVALID_REQUEST, "Invalid Request: jsonrpc must be \"2.0\""),
        ));
    }

    debug!(method = %req.method, "handling request");
    Some(match route(session, info, &req.method, req.params).await {
        Ok(result) => MCPResponse::success(Some(id), result),
        Err(error) => {
            warn!(method = %req.method, code = error.code, reason = %error.message, "request failed");
            MCPResponse::failure(Some(id), error)
        }
    })
}

/// Decode raw bytes into a request, or the error response to send back.
///
/// Unreadable JSON answers with id null; well-formed JSON that is not a
/// request keeps whatever id it carried.
pub fn parse_message(raw: &[u8]) -> Result<MCPRequest, MCPResponse> {
    // First pass: is it JSON at all?
    let value: Value = serde_json::from_slice(raw).map_err(|e| {
        MCPResponse::failure(None, MCPError::new(PARSE_ERROR, format!("Parse error: {e}")))
    })?;
    // Second pass: is it a request? Keep the id for the error if not
    let id = value.get("id").cloned();
    serde_json::from_value(value).map_err(|e| {
        MCPResponse::failure(id, MCPError::new(INVALID_REQUEST, format!("Invalid Request: {e}")))
    })
}

/// Application state shared across all worker threads in HTTP mode.
///
/// Holds no per-caller data: every request opens its own session from the
/// connector with the caller's credential.
pub struct AppState {
    pub server_info: ServerInfo,
    pub connector: Arc<dyn ClientConnector>,
    pub settings: SessionSettings,
}

/// Health check endpoint handler.
///
/// Returns a simple JSON response indicating the server is running.
/// Used by load balancers and monitoring systems to verify server availability.
async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": state.server_info.name
    }))
}

/// Extract the bearer credential from the Authorization header.
///
/// Missing headers, other schemes and blank tokens all yield `None`.
fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized()
        .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
        .json(MCPResponse::failure(
            None,
            MCPError::new(UNAUTHORIZED, "Unauthorized: a bearer token is required"),
        ))
}

/// MCP JSON-RPC request handler for HTTP mode.
///
/// Authenticates the caller, opens a session bound to the caller's
/// credential, handles the message and closes the session again. No state
/// survives between requests.
///
/// # Arguments
/// * `state` - Shared application state holding the client connector
/// * `req` - The HTTP request, read for its Authorization header
/// * `body` - Raw request body containing one JSON-RPC message
async fn mcp_post(state: web::Data<AppState>, req: HttpRequest, body: web::Bytes) -> HttpResponse {
    // Authenticate before touching the body
    let Some(api_key) = bearer_token(&req) else {
        warn!("rejected MCP request without a usable bearer token");
        return unauthorized();
    };

    let message = match parse_message(&body) {
        Ok(message) => message,
        Err(response) => return HttpResponse::BadRequest().json(response),
    };

    // Build a client for this caller's credential and register everything on it
    let mut session = match state
        .connector
        .connect(&api_key)
        .map_err(|e| e.to_string())
        .and_then(|client| Session::open(client, state.settings).map_err(|e| e.to_string()))
    {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "failed to open session");
            return HttpResponse::InternalServerError().json(MCPResponse::failure(
                message.id,
                MCPError::new(INTERNAL_ERROR, "Internal server error"),
            ));
        }
    };

    let response = handle_request(&session, &state.server_info, message).await;
    session.close();

    // Notifications are acknowledged with an empty 202
    match response {
        Some(response) => HttpResponse::Ok().json(response),
        None => HttpResponse::Accepted().finish(),
    }
}

/// Reject GET and DELETE on the MCP endpoint: there are no server-initiated
/// streams and no sessions to terminate.
async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .insert_header((header::ALLOW, "POST"))
        .json(MCPResponse::failure(
            None,
            MCPError::new(SERVER_ERROR, "Method not allowed."),
        ))
}

/// Register the HTTP routes. `AppState` must be provided as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health)).service(
        web::resource("/mcp")
            .route(web::post().to(mcp_post))
            .route(web::get().to(method_not_allowed))
            .route(web::delete().to(method_not_allowed)),
    );
}

/// Run the MCP server in HTTP mode.
///
/// # Configuration
/// The server is configured with:
/// - Worker threads: from configuration (CPU count, max 16, by default)
/// - Max connections: 10,000 concurrent connections
/// - Connection rate limit: 1,000 connections per second
/// - Keep-alive: 30 seconds
/// - Request timeout: 30 seconds
/// - Disconnect timeout: 2 seconds
/// - Shutdown timeout: 10 seconds
pub async fn run_server_http(state: AppState, bind_addr: String, workers: usize) -> std::io::Result<()> {
    info!(
        name = %state.server_info.name,
        version = %state.server_info.version,
        bind = %bind_addr,
        workers,
        "MCP server starting (HTTP mode)"
    );

    let state = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            // Enable compression for JSON responses (gzip/brotli)
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            // %r = request line, %s = status, %Dms = duration in milliseconds
            .wrap(Logger::new("%r %s %Dms"))
            .configure(configure)
    })
    .workers(workers)
    .max_connections(10000)
    .max_connection_rate(1000)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}

/// Handle one line of the stdio stream.
async fn handle_line(session: &Session, info: &ServerInfo, line: &str) -> Option<MCPResponse> {
    match parse_message(line.as_bytes()) {
        Ok(message) => handle_request(session, info, message).await,
        Err(response) => {
            warn!("unreadable message on stdin");
            Some(response)
        }
    }
}

/// Run the MCP server in STDIO mode.
///
/// Reads JSON-RPC messages line-by-line from stdin and writes responses to
/// stdout, one per line. Logging goes to stderr so stdout stays a clean
/// protocol stream. Requests are handled one at a time against the single
/// process-wide session, which is closed when stdin ends.
pub async fn run_server_stdio(mut session: Session, info: ServerInfo) -> std::io::Result<()> {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

    info!(name = %info.name, version = %info.version, "MCP server starting (STDIO mode)");

    // Buffered I/O with 8KB buffers, as messages are small and frequent
    let mut stdin = BufReader::with_capacity(8192, tokio::io::stdin()).lines();
    let mut stdout = BufWriter::with_capacity(8192, tokio::io::stdout());

    while let Some(line) = stdin.next_line().await? {
        // Blank lines between messages are tolerated
        if line.trim().is_empty() {
            continue;
        }

        // Notifications produce no output line
        let Some(response) = handle_line(&session, &info, &line).await else {
            continue;
        };

        let response_json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "failed to serialize response");
                continue;
            }
        };

        // One response per line; flush right away so the client is not kept waiting.
        stdout.write_all(response_json.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    session.close();
    info!(state = ?session.state(), "stdin closed, session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::FakeUpstream;
    use crate::client::{ApiError, ApiRequest, GoldRushClient, Upstream};
    use actix_web::test;
    use async_trait::async_trait;
    use tokio::sync::Barrier;

    /// Serves `/v1/chains/` with the credential it was built for, so tests
    /// can see which caller a session belongs to.
    struct EchoKeyConnector;

    impl ClientConnector for EchoKeyConnector {
        fn connect(&self, api_key: &str) -> Result<GoldRushClient, ApiError> {
            let upstream = FakeUpstream::new().with("/v1/chains/", json!({ "key": api_key }));
            Ok(GoldRushClient::new(Arc::new(upstream)))
        }
    }

    /// Like [`EchoKeyConnector`], but every upstream call waits until all
    /// parties of the barrier are in flight.
    struct RendezvousConnector(Arc<Barrier>);

    struct RendezvousUpstream {
        key: String,
        barrier: Arc<Barrier>,
    }

    #[async_trait]
    impl Upstream for RendezvousUpstream {
        async fn get(&self, _request: &ApiRequest) -> Result<Value, ApiError> {
            self.barrier.wait().await;
            Ok(json!({ "key": self.key }))
        }
    }

    impl ClientConnector for RendezvousConnector {
        fn connect(&self, api_key: &str) -> Result<GoldRushClient, ApiError> {
            Ok(GoldRushClient::new(Arc::new(RendezvousUpstream {
                key: api_key.to_string(),
                barrier: Arc::clone(&self.0),
            })))
        }
    }

    struct BrokenConnector;

    impl ClientConnector for BrokenConnector {
        fn connect(&self, _api_key: &str) -> Result<GoldRushClient, ApiError> {
            Err(ApiError::Malformed("no client".into()))
        }
    }

    fn state(connector: Arc<dyn ClientConnector>) -> web::Data<AppState> {
        web::Data::new(AppState {
            server_info: ServerInfo::new("goldrush-test"),
            connector,
            settings: SessionSettings::default(),
        })
    }

    fn local_session() -> Session {
        Session::open(
            GoldRushClient::new(Arc::new(FakeUpstream::new())),
            SessionSettings::default(),
        )
        .unwrap()
    }

    async fn call(session: &Session, message: Value) -> Value {
        let info = ServerInfo::new("goldrush-test");
        let request: MCPRequest = serde_json::from_value(message).unwrap();
        let response = handle_request(session, &info, request).await.unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_negotiates_version() {
        let session = local_session();

        let known = call(
            &session,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocolVersion": "2024-11-05"}}),
        )
        .await;
        assert_eq!(known["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(known["result"]["serverInfo"]["name"], "goldrush-test");
        assert!(known["result"]["capabilities"]["resources"].is_object());

        let unknown = call(
            &session,
            json!({"jsonrpc": "2.0", "id": 2, "method": "initialize", "params": {"protocolVersion": "1999-01-01"}}),
        )
        .await;
        assert_eq!(unknown["result"]["protocolVersion"], SUPPORTED_PROTOCOL_VERSIONS[0]);
    }

    #[tokio::test]
    async fn test_unknown_method_and_tool() {
        let session = local_session();

        let method = call(&session, json!({"jsonrpc": "2.0", "id": 1, "method": "prompts/list"})).await;
        assert_eq!(method["error"]["code"], METHOD_NOT_FOUND);

        let tool = call(
            &session,
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {"name": "nope"}}),
        )
        .await;
        assert_eq!(tool["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(tool["error"]["message"], "Unknown tool: nope");
    }

    #[tokio::test]
    async fn test_schema_violation_is_invalid_params() {
        let session = local_session();

        let response = call(
            &session,
            json!({
                "jsonrpc": "2.0",
                "id": "a",
                "method": "tools/call",
                "params": {"name": "token_balances", "arguments": {"chainName": "eth-mainnet"}}
            }),
        )
        .await;

        assert_eq!(response["id"], "a");
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
        assert!(response["error"]["data"].as_array().is_some_and(|v| !v.is_empty()));
    }

    #[tokio::test]
    async fn test_resources_methods() {
        let session = local_session();

        let listed = call(&session, json!({"jsonrpc": "2.0", "id": 1, "method": "resources/list"})).await;
        assert_eq!(listed["result"]["resources"].as_array().map(Vec::len), Some(3));

        let templates = call(
            &session,
            json!({"jsonrpc": "2.0", "id": 2, "method": "resources/templates/list"}),
        )
        .await;
        assert_eq!(
            templates["result"]["resourceTemplates"][0]["uriTemplate"],
            "status://chain/{chainName}"
        );

        let missing = call(
            &session,
            json!({"jsonrpc": "2.0", "id": 3, "method": "resources/read", "params": {"uri": "config://nothing"}}),
        )
        .await;
        assert_eq!(missing["error"]["code"], RESOURCE_NOT_FOUND);

        let chains = call(
            &session,
            json!({"jsonrpc": "2.0", "id": 4, "method": "resources/read", "params": {"uri": "config://supported-chains"}}),
        )
        .await;
        assert_eq!(chains["result"]["contents"][0]["mimeType"], "application/json");
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let session = local_session();
        let info = ServerInfo::new("goldrush-test");
        let line = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        assert!(handle_line(&session, &info, line).await.is_none());
    }

    #[tokio::test]
    async fn test_parse_error_has_null_id() {
        let session = local_session();
        let info = ServerInfo::new("goldrush-test");

        let response = handle_line(&session, &info, "{not json").await.unwrap();
        let response = serde_json::to_value(response).unwrap();

        assert_eq!(response["id"], Value::Null);
        assert_eq!(response["error"]["code"], PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_closed_session_reports_internal_error() {
        let mut session = local_session();
        session.close();

        let response = call(&session, json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})).await;
        assert_eq!(response["error"]["code"], INTERNAL_ERROR);
    }

    #[actix_web::test]
    async fn test_bearer_token_parsing() {
        let with = |value: &str| {
            let req = test::TestRequest::default()
                .insert_header((header::AUTHORIZATION, value))
                .to_http_request();
            bearer_token(&req)
        };

        assert_eq!(with("Bearer abc").as_deref(), Some("abc"));
        assert_eq!(with("bearer  abc ").as_deref(), Some("abc"));
        assert_eq!(with("Bearer "), None);
        assert_eq!(with("Bearer"), None);
        assert_eq!(with("Basic abc"), None);
        assert_eq!(bearer_token(&test::TestRequest::default().to_http_request()), None);
    }

    #[actix_web::test]
    async fn test_post_without_authorization_is_401() {
        let app = test::init_service(App::new().app_data(state(Arc::new(EchoKeyConnector))).configure(configure)).await;

        for auth in [None, Some("Bearer ")] {
            let mut req = test::TestRequest::post()
                .uri("/mcp")
                .set_json(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}));
            if let Some(auth) = auth {
                req = req.insert_header((header::AUTHORIZATION, auth));
            }
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), 401);

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"]["code"], UNAUTHORIZED);
        }
    }

    #[actix_web::test]
    async fn test_get_and_delete_are_405() {
        let app = test::init_service(App::new().app_data(state(Arc::new(EchoKeyConnector))).configure(configure)).await;

        for req in [test::TestRequest::get(), test::TestRequest::delete()] {
            let resp = test::call_service(&app, req.uri("/mcp").to_request()).await;
            assert_eq!(resp.status(), 405);

            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"]["code"], SERVER_ERROR);
        }
    }

    #[actix_web::test]
    async fn test_tools_list_over_http() {
        let app = test::init_service(App::new().app_data(state(Arc::new(EchoKeyConnector))).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/mcp")
            .insert_header((header::AUTHORIZATION, "Bearer key"))
            .set_json(json!({"jsonrpc": "2.0", "id": 7, "method": "tools/list"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["id"], 7);
        assert_eq!(body["result"]["tools"].as_array().map(Vec::len), Some(31));
    }

    fn all_chains_request(key: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/mcp")
            .insert_header((header::AUTHORIZATION, format!("Bearer {key}")))
            .set_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": {"name": "all_chains"}
            }))
    }

    /// The credential the upstream saw, read back out of a tool result.
    fn echoed_key(body: &Value) -> Value {
        let text = body["result"]["content"][0]["text"].as_str().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();
        payload["key"].clone()
    }

    #[actix_web::test]
    async fn test_credentials_are_isolated_per_request() {
        let app = test::init_service(App::new().app_data(state(Arc::new(EchoKeyConnector))).configure(configure)).await;

        for key in ["alpha", "beta", "alpha"] {
            let body: Value = test::call_and_read_body_json(&app, all_chains_request(key).to_request()).await;
            assert_eq!(echoed_key(&body), key);
        }
    }

    #[actix_web::test]
    async fn test_concurrent_requests_keep_their_own_credentials() {
        // Both upstream calls must be pending at once before either returns.
        let connector = RendezvousConnector(Arc::new(Barrier::new(2)));
        let app = test::init_service(App::new().app_data(state(Arc::new(connector))).configure(configure)).await;

        let (alpha, beta): (Value, Value) = futures_util::join!(
            test::call_and_read_body_json(&app, all_chains_request("alpha").to_request()),
            test::call_and_read_body_json(&app, all_chains_request("beta").to_request())
        );

        assert_eq!(echoed_key(&alpha), "alpha");
        assert_eq!(echoed_key(&beta), "beta");
    }

    #[actix_web::test]
    async fn test_notification_is_accepted() {
        let app = test::init_service(App::new().app_data(state(Arc::new(EchoKeyConnector))).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/mcp")
            .insert_header((header::AUTHORIZATION, "Bearer key"))
            .set_json(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), 202);
    }

    #[actix_web::test]
    async fn test_session_failure_is_500() {
        let app = test::init_service(App::new().app_data(state(Arc::new(BrokenConnector))).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/mcp")
            .insert_header((header::AUTHORIZATION, "Bearer key"))
            .set_json(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 500);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], INTERNAL_ERROR);
        assert_eq!(body["id"], 1);
    }

    #[actix_web::test]
    async fn test_malformed_body_is_parse_error() {
        let app = test::init_service(App::new().app_data(state(Arc::new(EchoKeyConnector))).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/mcp")
            .insert_header((header::AUTHORIZATION, "Bearer key"))
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{\"jsonrpc\":")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], PARSE_ERROR);
        assert_eq!(body["id"], Value::Null);
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(App::new().app_data(state(Arc::new(EchoKeyConnector))).configure(configure)).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "goldrush-test");
    }
}
