pub mod api;
pub mod assessment;
pub mod config;
pub mod upload;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::api::{start_server, ApiContext};
use crate::assessment::AssessmentError;
use crate::config::{Config, ConfigError};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Model client error: {0}")]
    Client(#[from] AssessmentError),

    #[error("Server error: {0}")]
    Server(String),
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Load configuration, start the server, and run until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = Config::from_env()?;
    tracing::info!(backend = ?config.backend, addr = %config.socket_addr(), "Configuration loaded");

    // The blocking HTTP client must not be built on an async worker.
    let client = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || config.build_client())
            .await
            .map_err(|e| StartupError::Server(e.to_string()))??
    };
    let ctx = ApiContext::new(client).with_max_upload_bytes(config.max_upload_bytes);

    let mut server = start_server(ctx, config.socket_addr(), config.static_dir.clone())
        .await
        .map_err(StartupError::Server)?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
    }

    server.shutdown();
    server.wait().await;
    Ok(())
}
