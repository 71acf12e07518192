//! Connection-related data models.
//!
//! This module turns a named database entry from the configuration into the
//! backend-specific target the pool layer connects to.

use crate::config::{DatabaseConfig, PoolOptions};
use serde::{Deserialize, Serialize};
use url::Url;

/// Supported database types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// Includes MariaDB
    MySQL,
    SQLite,
}

impl DatabaseType {
    /// Parse database type from a connection string.
    pub fn from_connection_string(connection_string: &str) -> Option<Self> {
        let lower = connection_string.to_lowercase();
        if lower.starts_with("mysql://") || lower.starts_with("mariadb://") {
            Some(Self::MySQL)
        } else if lower.starts_with("sqlite:") {
            Some(Self::SQLite)
        } else {
            None
        }
    }

    /// Get the display name for this database type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MySQL => "MySQL",
            Self::SQLite => "SQLite",
        }
    }

    pub fn is_sqlite(&self) -> bool {
        matches!(self, Self::SQLite)
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Resolved configuration for one named connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub id: String,
    pub db_type: DatabaseType,
    /// Contains sensitive data - never log
    pub connection_string: String,
    pub pool_options: PoolOptions,
}

impl ConnectionConfig {
    /// Create a new connection configuration from a full connection URL.
    pub fn new(
        id: impl Into<String>,
        connection_string: impl Into<String>,
        pool_options: PoolOptions,
    ) -> Result<Self, ConnectionConfigError> {
        let id = id.into();
        let connection_string = connection_string.into();

        if id.is_empty() {
            return Err(ConnectionConfigError::EmptyId);
        }
        if !id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConnectionConfigError::InvalidId(id));
        }

        let db_type = DatabaseType::from_connection_string(&connection_string)
            .ok_or_else(|| ConnectionConfigError::UnknownDatabaseType(mask(&connection_string)))?;

        pool_options
            .validate()
            .map_err(ConnectionConfigError::InvalidPoolOptions)?;

        Ok(Self {
            id,
            db_type,
            connection_string,
            pool_options,
        })
    }

    /// Build a connection from a `databases` entry.
    ///
    /// An explicit `url` wins; otherwise a `mysql://` URL is assembled from
    /// the host/port/user/password/dbname fields with proper percent-encoding.
    pub fn from_database_config(
        name: &str,
        config: &DatabaseConfig,
    ) -> Result<Self, ConnectionConfigError> {
        let pool_options = config.pool.clone().unwrap_or_default();
        match config.url.as_deref().filter(|u| !u.trim().is_empty()) {
            Some(url) => Self::new(name, url.trim(), pool_options),
            None => Self::new(name, mysql_url(config)?, pool_options),
        }
    }

    /// Get a display-safe version of the connection string (credentials masked).
    pub fn masked_connection_string(&self) -> String {
        mask(&self.connection_string)
    }
}

fn mysql_url(config: &DatabaseConfig) -> Result<String, ConnectionConfigError> {
    let invalid = |reason: String| ConnectionConfigError::InvalidAddress(reason);

    let mut url = Url::parse(&format!("mysql://{}", config.host))
        .map_err(|e| invalid(format!("host '{}': {e}", config.host)))?;
    url.set_port(Some(config.port))
        .map_err(|_| invalid(format!("port {}", config.port)))?;
    url.set_username(&config.user)
        .map_err(|_| invalid(format!("user '{}'", config.user)))?;
    if !config.password.is_empty() {
        url.set_password(Some(&config.password))
            .map_err(|_| invalid("password".to_string()))?;
    }
    url.set_path(&config.dbname);
    Ok(url.to_string())
}

fn mask(connection_string: &str) -> String {
    match Url::parse(connection_string) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("****"));
            url.to_string()
        }
        _ => connection_string.to_string(),
    }
}

/// Errors that can occur when creating a connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionConfigError {
    #[error("Connection ID cannot be empty")]
    EmptyId,

    #[error("Connection ID contains invalid characters: {0}")]
    InvalidId(String),

    #[error("Unknown database type in connection string: {0}")]
    UnknownDatabaseType(String),

    #[error("Invalid connection address: {0}")]
    InvalidAddress(String),

    #[error("Invalid pool options: {0}")]
    InvalidPoolOptions(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(host: &str, port: u16, user: &str, password: &str, dbname: &str) -> DatabaseConfig {
        DatabaseConfig {
            host: host.to_string(),
            port,
            user: user.to_string(),
            password: password.to_string(),
            dbname: dbname.to_string(),
            url: None,
            pool: None,
        }
    }

    #[test]
    fn test_database_type_from_connection_string() {
        assert_eq!(
            DatabaseType::from_connection_string("mysql://localhost/db"),
            Some(DatabaseType::MySQL)
        );
        assert_eq!(
            DatabaseType::from_connection_string("MariaDB://localhost/db"),
            Some(DatabaseType::MySQL)
        );
        assert_eq!(
            DatabaseType::from_connection_string("sqlite::memory:"),
            Some(DatabaseType::SQLite)
        );
        assert_eq!(
            DatabaseType::from_connection_string("sqlite://path/to/db"),
            Some(DatabaseType::SQLite)
        );
        assert_eq!(
            DatabaseType::from_connection_string("postgres://localhost/db"),
            None
        );
    }

    #[test]
    fn test_from_fields_builds_mysql_url() {
        let config =
            ConnectionConfig::from_database_config("default", &fields("db.local", 3307, "app", "pw", "shop"))
                .unwrap();
        assert_eq!(config.db_type, DatabaseType::MySQL);
        assert_eq!(config.connection_string, "mysql://app:pw@db.local:3307/shop");
    }

    #[test]
    fn test_from_fields_encodes_password() {
        let config = ConnectionConfig::from_database_config(
            "default",
            &fields("localhost", 3306, "root", "p@ss:word/#", "test"),
        )
        .unwrap();
        assert!(!config.connection_string.contains("p@ss:word/#"));
        let parsed = Url::parse(&config.connection_string).unwrap();
        assert_eq!(parsed.host_str(), Some("localhost"));
        assert_eq!(parsed.path(), "/test");
    }

    #[test]
    fn test_from_fields_empty_password() {
        let config =
            ConnectionConfig::from_database_config("default", &fields("localhost", 3306, "root", "", "test"))
                .unwrap();
        assert_eq!(config.connection_string, "mysql://root@localhost:3306/test");
    }

    #[test]
    fn test_url_overrides_fields() {
        let mut cfg = fields("localhost", 3306, "root", "", "test");
        cfg.url = Some("sqlite::memory:".to_string());
        let config = ConnectionConfig::from_database_config("local", &cfg).unwrap();
        assert_eq!(config.db_type, DatabaseType::SQLite);
        assert_eq!(config.connection_string, "sqlite::memory:");
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        let mut cfg = fields("localhost", 3306, "root", "", "test");
        cfg.url = Some("postgres://u:secret@h/db".to_string());
        let result = ConnectionConfig::from_database_config("pg", &cfg);
        match result {
            Err(ConnectionConfigError::UnknownDatabaseType(s)) => assert!(!s.contains("secret")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_masked_connection_string() {
        let config =
            ConnectionConfig::from_database_config("default", &fields("localhost", 3306, "root", "secret", "test"))
                .unwrap();
        let masked = config.masked_connection_string();
        assert!(!masked.contains("secret"));
        assert!(masked.contains("****"));
    }

    #[test]
    fn test_connection_config_empty_id() {
        let result = ConnectionConfig::new("", "mysql://localhost/db", PoolOptions::default());
        assert!(matches!(result, Err(ConnectionConfigError::EmptyId)));
    }

    #[test]
    fn test_connection_config_invalid_id() {
        let result = ConnectionConfig::new("test conn", "mysql://localhost/db", PoolOptions::default());
        assert!(matches!(result, Err(ConnectionConfigError::InvalidId(_))));
    }

    #[test]
    fn test_invalid_pool_options_rejected() {
        let pool = PoolOptions {
            max_connections: Some(0),
            ..Default::default()
        };
        let result = ConnectionConfig::new("default", "mysql://localhost/db", pool);
        assert!(matches!(result, Err(ConnectionConfigError::InvalidPoolOptions(_))));
    }
}
