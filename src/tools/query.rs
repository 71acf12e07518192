//! Query execution tool.
//!
//! This module implements the `query` MCP tool. Only SELECT, SHOW and
//! DESCRIBE statements go through to the gateway's read path; everything
//! else is turned away before it reaches the database.

use crate::db::DatabaseGateway;
use crate::error::DbResult;
use crate::models::{RowSet, SqlArguments};
use crate::tools::guard::check_read_only;
use std::sync::Arc;
use tracing::{info, warn};

pub struct QueryToolHandler {
    gateway: Arc<DatabaseGateway>,
    connection: String,
}

impl QueryToolHandler {
    pub fn new(gateway: Arc<DatabaseGateway>, connection: impl Into<String>) -> Self {
        Self {
            gateway,
            connection: connection.into(),
        }
    }

    pub async fn query(&self, input: SqlArguments) -> DbResult<RowSet> {
        let kind = check_read_only(&input.sql).inspect_err(|e| {
            warn!(connection = %self.connection, error = %e, "Query rejected");
        })?;

        let result = self.gateway.query(&self.connection, &input.sql).await?;

        info!(
            connection = %self.connection,
            statement = %kind,
            rows = result.row_count(),
            "Query executed"
        );
        Ok(result)
    }
}
