//! MCP method dispatcher.
//!
//! `McpService` reads newline-delimited JSON-RPC messages, routes each one
//! to its handler and writes exactly one response line per request.
//! Notifications and client-sent responses are never answered. Messages are
//! handled one at a time, in arrival order.

use crate::config::DEFAULT_CONNECTION;
use crate::db::DatabaseGateway;
use crate::error::{DbError, DbResult};
use crate::mcp::protocol::{Envelope, Message, Response, RpcError, ToolCall};
use crate::models::SqlArguments;
use crate::tools::{QueryToolHandler, Tool, ToolResult, WriteToolHandler};
use crate::tools::{tool_capabilities, tool_definitions};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

/// MCP protocol revision this server speaks.
pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "MySQL MCP Server";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Acknowledgements of `initialize`; silent even when they carry an id.
const INITIALIZED_METHODS: &[&str] = &["initialized", "notifications/initialized"];

pub struct McpService {
    query: QueryToolHandler,
    write: WriteToolHandler,
}

impl McpService {
    /// Create a service whose tools run against the `default` connection.
    pub fn new(gateway: Arc<DatabaseGateway>) -> Self {
        Self::with_connection(gateway, DEFAULT_CONNECTION)
    }

    pub fn with_connection(gateway: Arc<DatabaseGateway>, connection: &str) -> Self {
        Self {
            query: QueryToolHandler::new(Arc::clone(&gateway), connection),
            write: WriteToolHandler::new(gateway, connection),
        }
    }

    /// Serve until the reader reaches end of input.
    ///
    /// A read failure ends the loop with an error. A failed write is logged
    /// and the loop moves on to the next message.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> DbResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        let mut handled: u64 = 0;

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf).await.map_err(|e| {
                error!(error = %e, "Failed to read from input");
                DbError::Io(e)
            })?;
            if read == 0 {
                info!(messages = handled, "Input closed, stopping");
                return Ok(());
            }
            handled += 1;

            let line = trim_line_ending(&buf);
            if let Some(response) = self.handle_line(line).await {
                if let Err(e) = write_response(&mut writer, &response).await {
                    error!(error = %e, "Failed to write response");
                }
            }
        }
    }

    /// Handle one raw line; `None` when nothing should be written back.
    pub async fn handle_line(&self, line: &[u8]) -> Option<Response> {
        let envelope = match Envelope::parse(line) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, len = line.len(), "Failed to parse message");
                return Some(Response::from_error(Value::Null, e));
            }
        };

        if envelope
            .jsonrpc
            .as_deref()
            .is_some_and(|v| v != crate::mcp::protocol::JSONRPC_VERSION)
        {
            debug!(jsonrpc = ?envelope.jsonrpc, "Unexpected jsonrpc version");
        }

        self.handle_message(envelope.into_message()).await
    }

    pub async fn handle_message(&self, message: Message) -> Option<Response> {
        match message {
            Message::Request { method, .. } if INITIALIZED_METHODS.contains(&method.as_str()) => {
                debug!(method = %method, "Client confirmed initialization");
                None
            }
            Message::Request { id, method, params } => {
                Some(self.handle_request(id, &method, params).await)
            }
            Message::Notification { method, .. } => {
                debug!(method = %method, "Notification received");
                None
            }
            Message::Response { id } => {
                debug!(id = ?id, "Ignoring response from client");
                None
            }
            Message::Invalid { id, reason } => {
                warn!(reason = %reason, "Invalid request");
                Some(Response::from_error(id, RpcError::InvalidRequest(reason)))
            }
        }
    }

    async fn handle_request(&self, id: Value, method: &str, params: Option<Value>) -> Response {
        debug!(id = %id, method = %method, "Handling request");

        match self.dispatch(method, params).await {
            Ok(result) => Response::success(id, result),
            Err(e) => {
                match &e {
                    RpcError::Application(db) => {
                        warn!(id = %id, method = %method, kind = db.kind(), error = %db, "Request failed")
                    }
                    other => debug!(id = %id, method = %method, error = %other, "Request rejected"),
                }
                Response::from_error(id, e)
            }
        }
    }

    async fn dispatch(&self, method: &str, params: Option<Value>) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(self.initialize(params.as_ref())),
            "tools/list" => Ok(json!({ "tools": tool_definitions() })),
            "tools/call" | "mcp/callTool" => self.call_tool(params).await,
            "ping" => Ok(json!({})),
            other => Err(RpcError::MethodNotFound(other.to_string())),
        }
    }

    fn initialize(&self, params: Option<&Value>) -> Value {
        let client = params
            .and_then(|p| p.get("clientInfo"))
            .and_then(|c| c.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!(client = %client, "Client initialized");

        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION
            },
            "capabilities": {
                "tools": tool_capabilities()
            }
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, RpcError> {
        let call = ToolCall::from_params(params)?;
        let tool =
            Tool::from_name(&call.name).ok_or_else(|| RpcError::ToolNotFound(call.name.clone()))?;
        let args: SqlArguments = serde_json::from_value(call.arguments)
            .map_err(|e| RpcError::InvalidParams(e.to_string()))?;

        debug!(tool = tool.name(), called_as = %call.name, "Calling tool");

        let result = match tool {
            Tool::Query => ToolResult::pretty_json(&self.query.query(args).await?)?,
            Tool::Execute => ToolResult::pretty_json(&self.write.execute(args).await?)?,
        };
        Ok(serde_json::to_value(result).map_err(DbError::from)?)
    }
}

/// Strip a trailing `\n` or `\r\n`.
fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Write one response as a single line and flush.
async fn write_response<W>(writer: &mut W, response: &Response) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(response)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_line_ending() {
        assert_eq!(trim_line_ending(b"{}\n"), b"{}");
        assert_eq!(trim_line_ending(b"{}\r\n"), b"{}");
        assert_eq!(trim_line_ending(b"{}"), b"{}");
        assert_eq!(trim_line_ending(b"\n"), b"");
    }

    #[tokio::test]
    async fn test_write_response_is_one_line() {
        let mut out = Vec::new();
        let response = Response::success(json!(1), json!({"text": "a\nb"}));
        write_response(&mut out, &response).await.unwrap();

        assert_eq!(out.iter().filter(|b| **b == b'\n').count(), 1);
        assert_eq!(out.last(), Some(&b'\n'));
    }
}
