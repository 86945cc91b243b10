use std::path::PathBuf;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use legaltune_agent::SessionStore;
use serde::Serialize;
use tracing::{error, info};

#[derive(Clone)]
pub struct HealthState {
    pub sessions: Arc<SessionStore>,
    pub transport_mode: &'static str,
    pub ocr_binary: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub ocr: HealthCheck,
    pub transport_mode: &'static str,
    pub active_sessions: usize,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn spawn(bind_address: &str, port: u16, state: HealthState) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(state)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

/// Always answers 200 while the process runs; a missing OCR binary only
/// degrades image and scanned PDF uploads.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let ocr = match &state.ocr_binary {
        Some(binary) => HealthCheck { status: "ready", detail: format!("tesseract at {}", binary.display()) },
        None => HealthCheck { status: "unavailable", detail: "tesseract binary not found".to_string() },
    };

    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck { status: "ready", detail: "legaltune-server runtime initialized".to_string() },
        ocr,
        transport_mode: state.transport_mode,
        active_sessions: state.sessions.len().await,
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}
