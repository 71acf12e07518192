//! Configuration handling for the MySQL MCP Server.
//!
//! Two layers live here: the command line surface (clap, every flag also
//! readable from an `MCP_*` variable) and the configuration document that
//! names the database connections and the permission flags. The document is
//! resolved from the environment first and from the JSON file last.

use crate::error::{DbError, DbResult};
use crate::models::ConnectionConfig;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

pub use crate::tools::guard::Permission;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_CONNECTION: &str = "default";

pub const DEFAULT_MYSQL_HOST: &str = "localhost";
pub const DEFAULT_MYSQL_PORT: u16 = 3306;
pub const DEFAULT_MYSQL_USER: &str = "root";
pub const DEFAULT_MYSQL_DATABASE: &str = "test";

// Pool configuration defaults
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_MAX_CONNECTIONS_SQLITE: u32 = 1;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;
pub const DEFAULT_MAX_LIFETIME_SECS: u64 = 180;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Connection pool configuration options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolOptions {
    /// Maximum connections in pool (default: 10 for MySQL, 1 for SQLite)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    /// Connections kept open while idle (default: 1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_connections: Option<u32>,
    /// Maximum connection lifetime in seconds (default: 180, none for SQLite)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_lifetime_secs: Option<u64>,
    /// Idle timeout in seconds (default: 60, none for SQLite)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout_secs: Option<u64>,
    /// Connection acquire timeout in seconds (default: 30)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquire_timeout_secs: Option<u64>,
}

impl PoolOptions {
    /// Get max_connections with default value based on database type.
    pub fn max_connections_or_default(&self, is_sqlite: bool) -> u32 {
        self.max_connections.unwrap_or(if is_sqlite {
            DEFAULT_MAX_CONNECTIONS_SQLITE
        } else {
            DEFAULT_MAX_CONNECTIONS
        })
    }

    /// Get min_connections with default value.
    pub fn min_connections_or_default(&self) -> u32 {
        self.min_connections.unwrap_or(DEFAULT_MIN_CONNECTIONS)
    }

    /// Connections to an SQLite file or memory database are never recycled
    /// unless asked to, since recycling drops an in-memory database.
    pub fn max_lifetime_or_default(&self, is_sqlite: bool) -> Option<Duration> {
        match (self.max_lifetime_secs, is_sqlite) {
            (Some(secs), _) => Some(Duration::from_secs(secs)),
            (None, true) => None,
            (None, false) => Some(Duration::from_secs(DEFAULT_MAX_LIFETIME_SECS)),
        }
    }

    pub fn idle_timeout_or_default(&self, is_sqlite: bool) -> Option<Duration> {
        match (self.idle_timeout_secs, is_sqlite) {
            (Some(secs), _) => Some(Duration::from_secs(secs)),
            (None, true) => None,
            (None, false) => Some(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS)),
        }
    }

    /// Get acquire_timeout with default value.
    pub fn acquire_timeout_or_default(&self) -> Duration {
        Duration::from_secs(
            self.acquire_timeout_secs
                .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        )
    }

    /// Validate pool options and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(max) = self.max_connections {
            if max == 0 {
                return Err("max_connections must be greater than 0".to_string());
            }
        }
        if let Some(min) = self.min_connections {
            if let Some(max) = self.max_connections {
                if min > max {
                    return Err(format!(
                        "min_connections ({}) cannot exceed max_connections ({})",
                        min, max
                    ));
                }
            }
        }
        if self.acquire_timeout_secs == Some(0) {
            return Err("acquire_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// One entry under `databases` in the configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Sensitive - never log
    pub password: String,
    pub dbname: String,
    /// Full connection URL; overrides the fields above when set.
    /// Accepts `mysql://`, `mariadb://` and `sqlite:` URLs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolOptions>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MYSQL_HOST.to_string(),
            port: DEFAULT_MYSQL_PORT,
            user: DEFAULT_MYSQL_USER.to_string(),
            password: String::new(),
            dbname: DEFAULT_MYSQL_DATABASE.to_string(),
            url: None,
            pool: None,
        }
    }
}

impl DatabaseConfig {
    /// Connection backed by a URL instead of discrete fields.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }
}

/// The configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub databases: BTreeMap<String, DatabaseConfig>,
    pub permission: Permission,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            databases: default_databases(),
            permission: Permission::default(),
        }
    }
}

fn default_databases() -> BTreeMap<String, DatabaseConfig> {
    BTreeMap::from([(DEFAULT_CONNECTION.to_string(), DatabaseConfig::default())])
}

/// Parse a boolean flag the lenient way environment variables are written.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "y"
    )
}

impl AppConfig {
    /// Resolve the configuration document.
    ///
    /// Sources are tried in order and the first one present wins:
    /// JSON-valued environment variables, flat `MYSQL_*` variables, dotted
    /// `env.*` variables, then the JSON file at `path`. Empty variables
    /// count as unset.
    pub fn load<F>(path: &Path, env: F) -> DbResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(config) = Self::from_json_env(&lookup) {
            info!(source = "json-env", "Configuration loaded");
            return Ok(config);
        }
        if let Some(config) = Self::from_flat_env(&lookup) {
            info!(source = "mysql-env", "Configuration loaded");
            return Ok(config);
        }
        if let Some(config) = Self::from_dotted_env(&lookup) {
            info!(source = "dotted-env", "Configuration loaded");
            return Ok(config);
        }
        Self::from_file(path)
    }

    /// Load the configuration from a JSON file.
    ///
    /// A missing file yields the defaults. A file with an empty `databases`
    /// map gets the default connection.
    pub fn from_file(path: &Path) -> DbResult<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&contents).map_err(|e| {
            DbError::config(format!("invalid config file '{}': {e}", path.display()))
        })?;
        if config.databases.is_empty() {
            config.databases = default_databases();
        }

        info!(
            source = "file",
            path = %path.display(),
            connections = config.databases.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Write the document as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> DbResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Configuration written");
        Ok(())
    }

    /// Resolve every named entry into a connection configuration.
    pub fn connection_configs(&self) -> DbResult<Vec<ConnectionConfig>> {
        self.databases
            .iter()
            .map(|(name, db)| {
                ConnectionConfig::from_database_config(name, db)
                    .map_err(|e| DbError::config(format!("database '{name}': {e}")))
            })
            .collect()
    }

    fn from_json_env(env: &impl Fn(&str) -> Option<String>) -> Option<Self> {
        for (databases_key, permission_key) in
            [("databases", "permission"), ("env.databases", "env.permission")]
        {
            let databases = env(databases_key);
            let permission = env(permission_key);
            if databases.is_some() || permission.is_some() {
                return Some(Self::overlay_json(databases, permission));
            }
        }

        let document = env("env")?;
        match serde_json::from_str::<AppConfig>(&document) {
            Ok(mut config) => {
                if config.databases.is_empty() {
                    config.databases = default_databases();
                }
                Some(config)
            }
            Err(e) => {
                warn!(variable = "env", error = %e, "Ignoring malformed configuration variable");
                None
            }
        }
    }

    fn overlay_json(databases: Option<String>, permission: Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = databases {
            match serde_json::from_str::<BTreeMap<String, DatabaseConfig>>(&raw) {
                Ok(parsed) if !parsed.is_empty() => config.databases = parsed,
                Ok(_) => debug!("Empty databases variable, keeping default connection"),
                Err(e) => {
                    warn!(variable = "databases", error = %e, "Ignoring malformed configuration variable")
                }
            }
        }
        if let Some(raw) = permission {
            match serde_json::from_str::<Permission>(&raw) {
                Ok(parsed) => config.permission = parsed,
                Err(e) => {
                    warn!(variable = "permission", error = %e, "Ignoring malformed configuration variable")
                }
            }
        }
        config
    }

    fn from_flat_env(env: &impl Fn(&str) -> Option<String>) -> Option<Self> {
        let host = env("MYSQL_HOST");
        let user = env("MYSQL_USER");
        if host.is_none() && user.is_none() {
            return None;
        }

        let mut db = DatabaseConfig::default();
        if let Some(host) = host {
            db.host = host;
        }
        if let Some(user) = user {
            db.user = user;
        }
        if let Some(port) = env("MYSQL_PORT") {
            db.port = parse_port(&port);
        }
        if let Some(password) = env("MYSQL_PASS").or_else(|| env("MYSQL_PASSWORD")) {
            db.password = password;
        }
        if let Some(dbname) = env("MYSQL_DB").or_else(|| env("DEFAULT_DATABASE")) {
            db.dbname = dbname;
        }

        let flag = |primary: &str, fallback: &str| {
            env(primary)
                .or_else(|| env(fallback))
                .is_some_and(|v| parse_bool(&v))
        };

        Some(Self {
            databases: BTreeMap::from([(DEFAULT_CONNECTION.to_string(), db)]),
            permission: Permission {
                allow_query: true,
                allow_insert: flag("ALLOW_INSERT_OPERATION", "ALLOW_INSERT"),
                allow_update: flag("ALLOW_UPDATE_OPERATION", "ALLOW_UPDATE"),
                allow_delete: flag("ALLOW_DELETE_OPERATION", "ALLOW_DELETE"),
            },
        })
    }

    fn from_dotted_env(env: &impl Fn(&str) -> Option<String>) -> Option<Self> {
        let prefix = format!("env.databases.{DEFAULT_CONNECTION}");
        let host = env(&format!("{prefix}.host"))?;

        let defaults = DatabaseConfig::default();
        let db = DatabaseConfig {
            host,
            port: env(&format!("{prefix}.port"))
                .map(|p| parse_port(&p))
                .unwrap_or(DEFAULT_MYSQL_PORT),
            user: env(&format!("{prefix}.user")).unwrap_or(defaults.user),
            password: env(&format!("{prefix}.password")).unwrap_or_default(),
            dbname: env(&format!("{prefix}.dbname")).unwrap_or(defaults.dbname),
            url: None,
            pool: None,
        };

        let flag = |name: &str, default: bool| {
            env(&format!("env.permission.{name}"))
                .map(|v| parse_bool(&v))
                .unwrap_or(default)
        };

        Some(Self {
            databases: BTreeMap::from([(DEFAULT_CONNECTION.to_string(), db)]),
            permission: Permission {
                allow_query: flag("allow_query", true),
                allow_insert: flag("allow_insert", false),
                allow_update: flag("allow_update", false),
                allow_delete: flag("allow_delete", false),
            },
        })
    }
}

fn parse_port(value: &str) -> u16 {
    match value.trim().parse::<u16>() {
        Ok(port) if port > 0 => port,
        _ => {
            warn!(value, "Invalid MySQL port, using default");
            DEFAULT_MYSQL_PORT
        }
    }
}

/// Command line surface of the MySQL MCP Server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mysql-mcp-server",
    about = "MCP server exposing a MySQL database to AI assistants over stdio",
    version,
    author
)]
pub struct Config {
    /// Path of the JSON configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH, env = "MCP_CONFIG")]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,

    /// Enable full logging output (by default only warnings and errors reach stderr)
    #[arg(long, env = "MCP_ENABLE_LOGS")]
    pub enable_logs: bool,

    /// Write logs to this file instead of stderr (implies --enable-logs)
    #[arg(long, value_name = "PATH", env = "MCP_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Write the default configuration document to --config and exit
    #[arg(long, env = "MCP_WRITE_DEFAULT_CONFIG")]
    pub write_default_config: bool,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether the configured log level and destination apply.
    pub fn logging_enabled(&self) -> bool {
        self.enable_logs || self.log_file.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG_PATH),
            log_level: "info".to_string(),
            json_logs: false,
            enable_logs: false,
            log_file: None,
            write_default_config: false,
        }
    }
}
