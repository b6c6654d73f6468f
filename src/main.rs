//! Vigil: an aggregating health-check endpoint.
//!
//! This is the application entry point. It loads configuration from a TOML
//! file, initializes tracing, builds the probes and the engine (any invalid
//! probe aborts startup), sets up the Axum router and starts the HTTP server.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use vigil::config::{AppConfig, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use vigil::engine::HealthCheckEngine;
use vigil::http::start_server;
use vigil::routes::create_router;
use vigil::state::AppState;

/// Vigil: aggregate health checks behind a single endpoint
#[derive(Parser, Debug)]
#[command(name = "vigil", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log level filter (e.g., "vigil=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = AppConfig::load(&args.config)?;

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let fmt_layer = match config.logging.format.as_str() {
        "json" => tracing_subscriber::fmt::layer().json().boxed(),
        _ => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&log_filter))
        .with(fmt_layer)
        .init();

    tracing::info!(path = %args.config, "Loaded configuration");

    let engine = HealthCheckEngine::from_config(&config.health, &config.probes)?;
    tracing::info!(
        probes = ?engine.probe_names(),
        timeout_secs = engine.timeout().as_secs(),
        mount_path = %config.health.mount_path,
        format = ?config.health.format,
        "Initialized health check engine"
    );
    if config.probes.is_empty() {
        tracing::warn!("No probes configured, the health endpoint will always report OK");
    }

    let state = AppState::new(engine, &config.health.mount_path);
    let app = create_router(state);

    start_server(app, &config.http).await?;

    Ok(())
}
