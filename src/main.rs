use anyhow::Result;
use gemini_relay::{config, server};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Parses a level or a full directive list such as `info,tower_http=debug`
fn log_filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives).map_err(|e| {
        anyhow::anyhow!(
            "Invalid log filter '{}': {}. Valid levels: error, warn, info, debug, trace",
            directives,
            e
        )
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (before logging setup)
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.server.logs.level.clone());

    let filter = match log_filter(&log_level) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();

    info!("Starting Gemini relay with log level: {}", log_level);
    info!("Configuration loaded: {:?}", config.gemini);

    server::run(config).await?;

    Ok(())
}
