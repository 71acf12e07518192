//! MySQL MCP Server - Main entry point.
//!
//! Serves the `query` and `execute` tools over stdio. Unless logging is
//! enabled only warnings and errors are reported, on stderr. Nothing is ever
//! logged to stdout.

use mysql_mcp_server::config::{AppConfig, Config};
use mysql_mcp_server::db::DatabaseGateway;
use mysql_mcp_server::transport::{StdioTransport, Transport};
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use tracing::{error, info};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Level kept when logging is not enabled.
const DEFAULT_QUIET_LEVEL: &str = "warn";

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) -> std::io::Result<()> {
    if !config.logging_enabled() {
        tracing_subscriber::registry()
            .with(EnvFilter::new(DEFAULT_QUIET_LEVEL))
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::io::stderr),
            )
            .init();
        return Ok(());
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let writer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json().with_writer(writer)).init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Config::parse_args();

    if let Err(e) = init_tracing(&cli) {
        eprintln!("Error: cannot open log file: {e}");
        std::process::exit(1);
    }

    if cli.write_default_config {
        AppConfig::default().save(&cli.config)?;
        eprintln!("Default configuration written to {}", cli.config.display());
        return Ok(());
    }

    info!("Starting MySQL MCP Server v{}", env!("CARGO_PKG_VERSION"));

    let app_config = AppConfig::load(&cli.config, |key| std::env::var(key).ok())?;

    let gateway = match DatabaseGateway::from_config(&app_config).await {
        Ok(gateway) => Arc::new(gateway),
        Err(e) => {
            error!(error = %e, "Failed to initialize database gateway");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let transport = StdioTransport::new(gateway);
    info!(transport = transport.name(), "Serving");

    if let Err(e) = transport.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
