//! Server binary: parses flags, loads configuration and serves `/generate`
//! until Ctrl+C.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use qrmark_lib::app::SharedState;
use qrmark_lib::config::{AppConfig, Args};
use qrmark_lib::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    qrmark_lib::load_dotenv();
    let config = AppConfig::load(&args)?;
    tracing::info!(
        addr = %config.addr,
        max_upload_bytes = config.max_upload_bytes,
        max_size = config.max_size,
        error_level = %config.error_level,
        "Starting QR code server"
    );

    let state = SharedState::new(config);

    let shutdown_token = state.shutdown_token().clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutting down...");
                shutdown_token.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for Ctrl+C: {e}"),
        }
    });

    server::start_server(state).await
}
