//! Write operation tool.
//!
//! This module implements the `execute` MCP tool for INSERT, UPDATE and
//! DELETE statements. Each is gated on its own permission flag; DROP and
//! TRUNCATE never run.

use crate::db::DatabaseGateway;
use crate::error::DbResult;
use crate::models::{EffectSummary, SqlArguments};
use crate::tools::sql_classifier::classify;
use std::sync::Arc;
use tracing::{info, warn};

pub struct WriteToolHandler {
    gateway: Arc<DatabaseGateway>,
    connection: String,
}

impl WriteToolHandler {
    pub fn new(gateway: Arc<DatabaseGateway>, connection: impl Into<String>) -> Self {
        Self {
            gateway,
            connection: connection.into(),
        }
    }

    pub async fn execute(&self, input: SqlArguments) -> DbResult<EffectSummary> {
        let kind = classify(&input.sql);
        if kind.is_forbidden() {
            warn!(connection = %self.connection, statement = %kind, "Forbidden statement rejected");
        }
        self.gateway.permission().check(kind)?;

        let summary = self.gateway.exec(&self.connection, &input.sql).await?;

        info!(
            connection = %self.connection,
            statement = %kind,
            rows_affected = summary.rows_affected,
            last_insert_id = summary.last_insert_id,
            "Write operation executed"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_CONNECTION, PoolOptions, Permission};
    use crate::error::DbError;
    use crate::models::ConnectionConfig;

    async fn handler(permission: Permission) -> WriteToolHandler {
        let config =
            ConnectionConfig::new(DEFAULT_CONNECTION, "sqlite::memory:", PoolOptions::default())
                .unwrap();
        let gateway = DatabaseGateway::connect(vec![config], permission).await.unwrap();
        let handler = WriteToolHandler::new(Arc::new(gateway), DEFAULT_CONNECTION);
        handler
            .execute(SqlArguments::new(
                "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)",
            ))
            .await
            .unwrap();
        handler
    }

    #[test]
    fn test_execute_input_deserialization() {
        let json = r#"{"sql": "INSERT INTO users (name) VALUES ('a')"}"#;
        let input: SqlArguments = serde_json::from_str(json).unwrap();
        assert!(input.sql.starts_with("INSERT"));
    }

    #[tokio::test]
    async fn test_insert_allowed() {
        let handler = handler(Permission {
            allow_insert: true,
            ..Permission::default()
        })
        .await;

        let summary = handler
            .execute(SqlArguments::new("INSERT INTO users (name) VALUES ('alice')"))
            .await
            .unwrap();
        assert_eq!(summary.rows_affected, 1);
        assert_eq!(summary.last_insert_id, 1);
    }

    #[tokio::test]
    async fn test_insert_denied_by_default() {
        let handler = handler(Permission::default()).await;
        let err = handler
            .execute(SqlArguments::new("INSERT INTO users (name) VALUES ('bob')"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_truncate_always_denied() {
        let handler = handler(Permission::allow_all()).await;
        let err = handler
            .execute(SqlArguments::new("TRUNCATE TABLE users"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForbiddenStatement { .. }));
    }

    #[tokio::test]
    async fn test_update_and_delete_counts() {
        let handler = handler(Permission::allow_all()).await;
        handler
            .execute(SqlArguments::new("INSERT INTO users (name) VALUES ('a'), ('b'), ('c')"))
            .await
            .unwrap();

        let updated = handler
            .execute(SqlArguments::new("UPDATE users SET name = 'x' WHERE id > 1"))
            .await
            .unwrap();
        assert_eq!(updated.rows_affected, 2);

        let deleted = handler
            .execute(SqlArguments::new("DELETE FROM users"))
            .await
            .unwrap();
        assert_eq!(deleted.rows_affected, 3);
    }
}
