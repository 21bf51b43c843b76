/**
 * Health Routes
 * Endpoints for checking backend health status
 */
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::{routes::blog::publication_date, state::AppState};

// Track server start time for uptime calculation
lazy_static::lazy_static! {
    static ref SERVER_START: Instant = Instant::now();
}

/// Initialize the server start time
pub fn init_start_time() {
    lazy_static::initialize(&SERVER_START);
}

/// Response for GET /
#[derive(Debug, Serialize, Deserialize)]
pub struct ServerStatus {
    pub message: String,
    pub timestamp: String,
}

/// Simple health response
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: String,
    pub uptime: u64,
}

/// Single service check result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCheck {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET / - Server status with today's date
pub async fn server_status() -> Json<ServerStatus> {
    Json(ServerStatus {
        message: "Server is running smoothly".to_string(),
        timestamp: publication_date(),
    })
}

/// GET /health - Simple health ping
pub async fn health_ping() -> impl IntoResponse {
    Json(SimpleHealthResponse {
        status: "ok".to_string(),
        uptime: SERVER_START.elapsed().as_secs(),
    })
}

/// GET /health/database - Database health check
pub async fn health_database(State(state): State<AppState>) -> Json<ServiceCheck> {
    match state.store.ping().await {
        Ok(duration) => Json(ServiceCheck {
            status: "healthy".to_string(),
            response_time: Some(duration.as_millis() as u64),
            error: None,
        }),
        Err(e) => {
            tracing::warn!("Database health check failed: {}", e);
            Json(ServiceCheck {
                status: "unhealthy".to_string(),
                response_time: None,
                error: Some("database unreachable".to_string()),
            })
        }
    }
}
