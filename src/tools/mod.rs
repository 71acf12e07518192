//! MCP tool implementations.
//!
//! This module contains the two database tools and what gates them:
//! - `query`: run a read statement and return its rows
//! - `execute`: run a write statement and return its effect
//! - `sql_classifier`: leading-keyword statement classification
//! - `guard`: permission flags and the DROP/TRUNCATE block
//! - `manifest`: tool names, aliases and input schema

pub mod format;
pub mod guard;
pub mod manifest;
pub mod query;
pub mod sql_classifier;
pub mod write;

pub use format::{ToolContent, ToolResult};
pub use guard::Permission;
pub use manifest::{Tool, ToolDefinition, tool_capabilities, tool_definitions};
pub use query::QueryToolHandler;
pub use sql_classifier::{StatementKind, classify};
pub use write::WriteToolHandler;
