//! Demo network service for the service logger.
//!
//! Loads configuration, installs the logger's sinks as the global `tracing`
//! subscriber, and serves an echo endpoint whose requests are logged with `reqId`.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use service_logger::config::{load_config, ServiceConfig};
use service_logger::http::HttpServer;
use service_logger::observability::{compose_layers, parse_severity};

#[derive(Parser)]
#[command(name = "service-logger")]
#[command(about = "Echo service demonstrating the structured logger", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Human-readable console output.
    #[arg(long)]
    pretty: bool,

    /// Record the call site of every log line.
    #[arg(long)]
    debug: bool,

    /// Minimum level (debug, info, warning, error, fatal, panic).
    #[arg(short, long)]
    level: Option<String>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if cli.pretty {
        config.logging.pretty = true;
    }
    if cli.debug {
        config.logging.debug = true;
    }
    if let Some(level) = &cli.level {
        config.logging.level = parse_severity(level)?;
    }
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    // Sinks sit directly on the registry; the env filter only trims other crates.
    tracing_subscriber::registry()
        .with(compose_layers(std::io::stdout, &config.logging)?)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "service_logger=debug,tower_http=debug".into()),
        )
        .init();

    info!(
        min_level = %config.logging.level,
        file_logging = config.logging.file.enabled,
        "service-logger v0.1.0 starting"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    HttpServer::new().run(listener).await?;

    info!("Shutdown complete");
    Ok(())
}
