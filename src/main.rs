// src/main.rs

use std::process::ExitCode;
use std::sync::Arc;

use gasless_mcp_server::{blockchain::EvmConnector, config::Config, mcp::transport, AppState};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gasless_mcp_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("❌ Failed to load configuration: {}", e);
            e.log_summary();
            return ExitCode::FAILURE;
        }
    };
    config.log_summary();

    let state = AppState::new(config, Arc::new(EvmConnector));
    transport::run_stdio(state).await;
    ExitCode::SUCCESS
}
