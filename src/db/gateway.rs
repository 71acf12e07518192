//! Permission-gated access to the named connections.
//!
//! The gateway owns every pool and the permission flags. It is built once at
//! startup and shared read-only by the tool handlers.

use crate::config::AppConfig;
use crate::db::executor::QueryExecutor;
use crate::db::pool::{ConnectionManager, DbPool};
use crate::error::DbResult;
use crate::models::{ConnectionConfig, EffectSummary, RowSet};
use crate::tools::guard::Permission;
use crate::tools::sql_classifier::classify;
use tracing::{error, info, warn};

#[derive(Debug)]
pub struct DatabaseGateway {
    connections: ConnectionManager,
    permission: Permission,
    executor: QueryExecutor,
}

impl DatabaseGateway {
    /// Open every connection named in the configuration.
    pub async fn from_config(config: &AppConfig) -> DbResult<Self> {
        Self::connect(config.connection_configs()?, config.permission).await
    }

    /// Open and probe one pool per configuration.
    ///
    /// Fails if any connection cannot be opened; nothing stays open on failure.
    pub async fn connect(configs: Vec<ConnectionConfig>, permission: Permission) -> DbResult<Self> {
        let connections = ConnectionManager::connect_all(configs).await?;
        info!(
            connections = connections.connection_count(),
            allow_query = permission.allow_query,
            allow_insert = permission.allow_insert,
            allow_update = permission.allow_update,
            allow_delete = permission.allow_delete,
            "Database gateway ready"
        );
        Ok(Self::new(connections, permission))
    }

    pub fn new(connections: ConnectionManager, permission: Permission) -> Self {
        Self {
            connections,
            permission,
            executor: QueryExecutor::new(),
        }
    }

    pub fn permission(&self) -> &Permission {
        &self.permission
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    /// Run a row-returning statement.
    ///
    /// Gated on `allow_query` only; the statement text is not inspected.
    pub async fn query(&self, connection: &str, sql: &str) -> DbResult<RowSet> {
        if let Err(e) = self.permission.check_query() {
            warn!(connection = %connection, "Query rejected: querying is disabled");
            return Err(e);
        }
        let pool = self.pool(connection)?;

        self.executor.fetch_all(pool, sql).await.inspect_err(|e| {
            error!(connection = %connection, error = %e, "Query failed");
        })
    }

    /// Run a statement for its effect.
    ///
    /// The statement is classified first: DROP/TRUNCATE are always rejected,
    /// INSERT/UPDATE/DELETE need their flag, reads need `allow_query`.
    pub async fn exec(&self, connection: &str, sql: &str) -> DbResult<EffectSummary> {
        let kind = classify(sql);
        if let Err(e) = self.permission.check(kind) {
            warn!(connection = %connection, statement = %kind, "Statement rejected");
            return Err(e);
        }
        let pool = self.pool(connection)?;

        self.executor.execute(pool, sql).await.inspect_err(|e| {
            error!(connection = %connection, statement = %kind, error = %e, "Statement failed");
        })
    }

    fn pool(&self, connection: &str) -> DbResult<&DbPool> {
        self.connections.get_pool(connection).inspect_err(|_| {
            warn!(connection = %connection, "Unknown connection");
        })
    }

    /// Close every pool.
    pub async fn close(&self) {
        self.connections.close_all().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, PoolOptions};
    use crate::error::DbError;
    use crate::models::CellValue;

    async fn gateway(permission: Permission) -> DatabaseGateway {
        let config = ConnectionConfig::new("default", "sqlite::memory:", PoolOptions::default()).unwrap();
        DatabaseGateway::connect(vec![config], permission).await.unwrap()
    }

    #[tokio::test]
    async fn test_query_select_one() {
        let gw = gateway(Permission::default()).await;
        let rs = gw.query("default", "SELECT 1").await.unwrap();
        assert_eq!(rs.columns, vec!["1"]);
        assert_eq!(rs.rows, vec![vec![CellValue::Int64(1)]]);
    }

    #[tokio::test]
    async fn test_query_denied_when_disabled() {
        let gw = gateway(Permission {
            allow_query: false,
            ..Permission::default()
        })
        .await;
        assert!(matches!(
            gw.query("default", "SELECT 1").await,
            Err(DbError::PermissionDenied { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_connection() {
        let gw = gateway(Permission::default()).await;
        assert!(matches!(
            gw.query("other", "SELECT 1").await,
            Err(DbError::ConnectionNotFound { .. })
        ));
        assert!(matches!(
            gw.exec("other", "CREATE TABLE t (id INT)").await,
            Err(DbError::ConnectionNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_exec_gating() {
        let gw = gateway(Permission {
            allow_insert: true,
            ..Permission::default()
        })
        .await;

        gw.exec("default", "CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)")
            .await
            .unwrap();
        let summary = gw.exec("default", "INSERT INTO t (v) VALUES ('x')").await.unwrap();
        assert_eq!(summary.rows_affected, 1);
        assert_eq!(summary.last_insert_id, 1);

        assert!(matches!(
            gw.exec("default", "UPDATE t SET v = 'y'").await,
            Err(DbError::PermissionDenied { .. })
        ));
        assert!(matches!(
            gw.exec("default", "DELETE FROM t").await,
            Err(DbError::PermissionDenied { .. })
        ));
    }

    #[tokio::test]
    async fn test_exec_forbidden_even_with_all_flags() {
        let gw = gateway(Permission::allow_all()).await;
        gw.exec("default", "CREATE TABLE t (id INTEGER)").await.unwrap();

        assert!(matches!(
            gw.exec("default", "DROP TABLE t").await,
            Err(DbError::ForbiddenStatement { .. })
        ));
        assert!(matches!(
            gw.exec("default", "  truncate table t").await,
            Err(DbError::ForbiddenStatement { .. })
        ));
        // Table still there.
        assert!(gw.query("default", "SELECT * FROM t").await.is_ok());
    }

    #[tokio::test]
    async fn test_from_config_with_url() {
        let mut config = AppConfig::default();
        config.databases.clear();
        config
            .databases
            .insert("default".to_string(), DatabaseConfig::from_url("sqlite::memory:"));

        let gw = DatabaseGateway::from_config(&config).await.unwrap();
        assert_eq!(gw.connections().list_connections(), vec!["default"]);
        gw.close().await;
    }
}
