//! Error types for the MySQL MCP Server.
//!
//! This module defines the failure taxonomy using `thiserror`. Every variant
//! that can surface while serving requests maps onto the JSON-RPC application
//! error code; startup-only variants abort the process before the loop runs.

use crate::mcp::protocol::{ErrorObject, codes};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Permission denied: {operation} operations are not allowed")]
    PermissionDenied { operation: String },

    #[error("Forbidden statement: {keyword} operations are not allowed")]
    ForbiddenStatement { keyword: String },

    #[error("Read-only tool: {operation} statements are not allowed, use SELECT, SHOW or DESCRIBE")]
    NotReadOnly { operation: String },

    #[error("Connection not found: {connection_id}")]
    ConnectionNotFound { connection_id: String },

    /// Backend failure. The message is the backend's own text.
    #[error("{message}")]
    Backend {
        message: String,
        /// e.g., "42S02" for an unknown table
        sql_state: Option<String>,
    },

    #[error("Connection '{connection_id}' failed: {message}")]
    Connection {
        connection_id: String,
        message: String,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to serialize result: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbError {
    /// Create a permission denied error.
    pub fn permission_denied(operation: impl Into<String>) -> Self {
        Self::PermissionDenied {
            operation: operation.into(),
        }
    }

    /// Create a forbidden statement error.
    pub fn forbidden_statement(keyword: impl Into<String>) -> Self {
        Self::ForbiddenStatement {
            keyword: keyword.into(),
        }
    }

    /// Create an error for a non-read statement sent to the read-only tool.
    pub fn not_read_only(operation: impl Into<String>) -> Self {
        Self::NotReadOnly {
            operation: operation.into(),
        }
    }

    /// Create a connection not found error.
    pub fn connection_not_found(connection_id: impl Into<String>) -> Self {
        Self::ConnectionNotFound {
            connection_id: connection_id.into(),
        }
    }

    /// Create a backend error with optional SQL state.
    pub fn backend(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Backend {
            message: message.into(),
            sql_state,
        }
    }

    /// Create a startup connection error.
    pub fn connection(connection_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            connection_id: connection_id.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// SQLSTATE reported by the backend, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Backend { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }

    /// Short machine-readable category, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PermissionDenied { .. } => "permission_denied",
            Self::ForbiddenStatement { .. } => "forbidden_statement",
            Self::NotReadOnly { .. } => "not_read_only",
            Self::ConnectionNotFound { .. } => "connection_not_found",
            Self::Backend { .. } => "backend",
            Self::Connection { .. } => "connection",
            Self::Config { .. } => "config",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// Database errors keep the server's message verbatim so the caller sees
/// exactly what MySQL reported.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::backend(db_err.message(), code)
            }
            other => DbError::backend(other.to_string(), None),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;

/// Convert DbError to a JSON-RPC error object.
///
/// Every steady-state failure is an application error (`-32000`); the
/// SQLSTATE, when the backend reported one, travels in `data`.
impl From<DbError> for ErrorObject {
    fn from(err: DbError) -> Self {
        let data = err
            .sql_state()
            .map(|state| serde_json::json!({ "sqlState": state }));
        ErrorObject {
            code: codes::APPLICATION_ERROR,
            message: err.to_string(),
            data,
        }
    }
}
