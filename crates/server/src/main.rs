mod bootstrap;
mod bridge;
mod health;

use std::time::Duration;

use anyhow::Result;
use legaltune_core::config::{AppConfig, LoadOptions};
use tracing_subscriber::EnvFilter;

use crate::health::HealthState;

fn init_logging(config: &AppConfig) {
    use legaltune_core::config::LogFormat::*;

    // RUST_LOG wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.trim().to_ascii_lowercase()));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        HealthState {
            sessions: app.sessions.clone(),
            transport_mode: bootstrap::TRANSPORT_MODE,
            ocr_binary: app.ocr_binary.clone(),
        },
    )
    .await?;

    let pruner = bootstrap::spawn_session_pruner(
        app.sessions.clone(),
        Duration::from_secs(app.config.session.idle_ttl_secs),
    );

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        analysis_mode = ?app.runtime.analysis(),
        "legaltune-server started"
    );

    tokio::select! {
        result = app.polling_runner.start() => result?,
        result = wait_for_shutdown() => result?,
    }

    if let Some(pruner) = pruner {
        pruner.abort();
    }
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "legaltune-server stopping"
    );

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
