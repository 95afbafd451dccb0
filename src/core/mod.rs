//! MCP core: configuration, registries, sessions and the protocol server.

pub mod config;
pub mod encoder;
pub mod error;
pub mod pagination;
pub mod registry;
pub mod schema;
pub mod server;
pub mod session;
