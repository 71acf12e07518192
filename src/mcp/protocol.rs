//! JSON-RPC 2.0 envelopes for MCP over line-delimited stdio.
//!
//! Each inbound line is one JSON object. It is decoded into an [`Envelope`]
//! and classified as a request, a notification, or a response sent by the
//! client. Outbound lines are [`Response`]s.

use crate::error::DbError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Error codes used by the server.
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    /// Every database, permission and serialization failure
    pub const APPLICATION_ERROR: i32 = -32000;
}

/// Any inbound JSON-RPC object, before classification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// `None` when the key is absent; `Some(Value::Null)` for `"id": null`.
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// What an envelope turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Has a method and an id; gets exactly one response.
    Request {
        id: Value,
        method: String,
        params: Option<Value>,
    },
    /// Has a method and no id; never answered.
    Notification {
        method: String,
        params: Option<Value>,
    },
    /// A response sent by the client; ignored.
    Response { id: Option<Value> },
    /// Neither a call nor a response.
    Invalid { id: Value, reason: String },
}

impl Envelope {
    /// Decode one line.
    pub fn parse(line: &[u8]) -> Result<Self, RpcError> {
        serde_json::from_slice(line).map_err(|e| RpcError::ParseError(e.to_string()))
    }

    /// Anything carrying `result` or `error` is a response, even with a method.
    pub fn into_message(self) -> Message {
        if self.result.is_some() || self.error.is_some() {
            return Message::Response { id: self.id };
        }
        match (self.method, self.id) {
            (Some(method), Some(id)) => Message::Request {
                id,
                method,
                params: self.params,
            },
            (Some(method), None) => Message::Notification {
                method,
                params: self.params,
            },
            (None, id) => Message::Invalid {
                id: id.unwrap_or(Value::Null),
                reason: "missing method".to_string(),
            },
        }
    }
}

/// A JSON-RPC 2.0 response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    /// Echoes the request id; `null` when the request could not be read
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    /// Create a successful response
    pub fn success(id: Value, result: Value) -> Self {
        Response {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Value, error: ErrorObject) -> Self {
        Response {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Create an error response from RpcError
    pub fn from_error(id: Value, err: RpcError) -> Self {
        Response::error(id, err.into())
    }
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Failure while handling one message.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Application(#[from] DbError),
}

impl RpcError {
    /// Get the error code
    pub fn code(&self) -> i32 {
        match self {
            RpcError::ParseError(_) => codes::PARSE_ERROR,
            RpcError::InvalidRequest(_) => codes::INVALID_REQUEST,
            RpcError::MethodNotFound(_) | RpcError::ToolNotFound(_) => codes::METHOD_NOT_FOUND,
            RpcError::InvalidParams(_) => codes::INVALID_PARAMS,
            RpcError::Application(_) => codes::APPLICATION_ERROR,
        }
    }
}

impl From<RpcError> for ErrorObject {
    fn from(err: RpcError) -> Self {
        let code = err.code();
        let (message, detail) = match err {
            RpcError::Application(e) => return e.into(),
            RpcError::ParseError(detail) => ("Parse error", detail),
            RpcError::InvalidRequest(detail) => ("Invalid Request", detail),
            RpcError::MethodNotFound(method) => ("Method not found", method),
            RpcError::ToolNotFound(name) => ("Tool not found", name),
            RpcError::InvalidParams(detail) => ("Invalid params", detail),
        };
        ErrorObject {
            code,
            message: message.to_string(),
            data: Some(Value::String(detail)),
        }
    }
}

/// A `tools/call` (or `mcp/callTool`) request, normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    /// As sent by the client; `{}` when omitted
    pub arguments: Value,
}

impl ToolCall {
    /// Extract the tool name and arguments from request params.
    ///
    /// Arguments are read from `params.arguments`, falling back to
    /// `params.params`; when neither is present they default to `{}`.
    pub fn from_params(params: Option<Value>) -> Result<Self, RpcError> {
        let Some(Value::Object(mut params)) = params else {
            return Err(RpcError::InvalidParams(
                "params must be an object with a tool name".to_string(),
            ));
        };

        let name = match params.remove("name") {
            Some(Value::String(name)) => name,
            _ => return Err(RpcError::InvalidParams("missing tool name".to_string())),
        };

        let arguments = [params.remove("arguments"), params.remove("params")]
            .into_iter()
            .flatten()
            .find(|v| !v.is_null())
            .unwrap_or_else(|| Value::Object(Map::new()));

        Ok(Self { name, arguments })
    }
}
