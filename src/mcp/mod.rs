//! MCP protocol handling.
//!
//! `protocol` holds the JSON-RPC 2.0 wire types; `service` routes decoded
//! messages to the database tools.

pub mod protocol;
pub mod service;

pub use protocol::{ErrorObject, Message, Response, RpcError, ToolCall};
pub use service::McpService;
