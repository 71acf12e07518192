//! Stdio transport for the MCP server.
//!
//! Reads JSON-RPC messages from stdin and writes responses to stdout.
//! Diagnostics never go to stdout.

use crate::db::DatabaseGateway;
use crate::error::DbResult;
use crate::mcp::McpService;
use crate::transport::Transport;
use std::sync::Arc;
use tokio::io::{BufReader, stdin, stdout};
use tokio::signal;
use tracing::{info, warn};

pub struct StdioTransport {
    gateway: Arc<DatabaseGateway>,
    service: McpService,
}

impl StdioTransport {
    pub fn new(gateway: Arc<DatabaseGateway>) -> Self {
        Self {
            service: McpService::new(Arc::clone(&gateway)),
            gateway,
        }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> DbResult<()> {
        info!("Starting MCP server with stdio transport");

        let (result, shutdown_requested) = tokio::select! {
            result = self.service.serve(BufReader::new(stdin()), stdout()) => (result, false),
            _ = wait_for_signal() => {
                info!("Shutdown signal received");
                (Ok(()), true)
            }
        };

        info!("Closing all database connections");
        self.gateway.close().await;

        if shutdown_requested {
            // A pending stdin read keeps the runtime from shutting down.
            info!("Exiting process");
            std::process::exit(0);
        }

        result
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}

/// Wait for SIGINT or SIGTERM.
///
/// If a handler cannot be installed, that signal is never reported.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_CONNECTION, Permission, PoolOptions};
    use crate::models::ConnectionConfig;

    #[tokio::test]
    async fn test_stdio_transport_creation() {
        let config =
            ConnectionConfig::new(DEFAULT_CONNECTION, "sqlite::memory:", PoolOptions::default())
                .unwrap();
        let gateway = DatabaseGateway::connect(vec![config], Permission::default())
            .await
            .unwrap();
        let transport = StdioTransport::new(Arc::new(gateway));
        assert_eq!(transport.name(), "stdio");
    }
}
