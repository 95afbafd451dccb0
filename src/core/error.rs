//! Error types for the MCP layer.

use thiserror::Error;

use crate::client::ApiError;

/// Failure raised inside a tool or resource handler.
///
/// These never cross the dispatch boundary as protocol errors for tools:
/// the dispatcher renders them into an `isError` tool result.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Validated arguments could not be mapped onto the handler's types.
    #[error("invalid arguments: {0}")]
    Arguments(String),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Registry and dispatch failures. These surface as JSON-RPC errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool already registered: {0}")]
    DuplicateTool(String),

    #[error("resource already registered: {0}")]
    DuplicateResource(String),

    #[error("invalid schema for tool {tool}: {message}")]
    InvalidSchema { tool: String, message: String },

    #[error("invalid URI template {template}: {message}")]
    InvalidTemplate { template: String, message: String },

    #[error("session is not ready")]
    NotReady,

    #[error("session is closed")]
    Closed,

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Resource not found: {0}")]
    UnknownResource(String),

    /// Arguments violated the tool's parameter schema.
    #[error("Invalid params for tool {tool}")]
    InvalidParams { tool: String, violations: Vec<String> },

    /// A resource handler failed outright (as opposed to a soft failure).
    #[error("Failed to read resource {uri}: {source}")]
    ResourceFailed {
        uri: String,
        #[source]
        source: ToolError,
    },
}

/// Startup configuration problems. Fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GOLDRUSH_API_KEY is required for stdio transport (set the variable or pass --api-key)")]
    MissingApiKey,

    #[error("failed to build upstream client: {0}")]
    Client(#[from] ApiError),
}
