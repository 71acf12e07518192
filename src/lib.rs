//! MySQL MCP Server Library
//!
//! Exposes a MySQL database to AI assistants as two MCP tools, `query` and
//! `execute`, served as line-delimited JSON-RPC 2.0 over stdio. Every
//! statement is checked against the configured permission flags before it
//! reaches the database.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::{AppConfig, Config};
pub use db::DatabaseGateway;
pub use error::DbError;
pub use mcp::McpService;
