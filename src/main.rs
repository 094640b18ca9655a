//! ChatRelay Server: real-time chat relay over WebSockets.
//!
//! Main entry point that loads configuration, installs logging, and
//! starts the server.

use tracing_subscriber::{EnvFilter, fmt};

use chatrelay_core::config::AppConfig;
use chatrelay_core::error::AppError;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!("Starting ChatRelay v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = chatrelay_api::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load `config/default.toml`, then `config/{CHATRELAY_ENV}.toml`, then
/// `CHATRELAY__*` environment overrides.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("CHATRELAY_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}
