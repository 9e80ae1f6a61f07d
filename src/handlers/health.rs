use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::time::Instant;
use utoipa::ToSchema;

/// Component health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
    Degraded,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DatabaseCheck {
    pub status: ComponentStatus,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QueueCheck {
    pub status: ComponentStatus,
    pub backend: String,
    pub queue: String,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthChecks {
    pub database: DatabaseCheck,
    pub queue: QueueCheck,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub version: String,
    pub checks: HealthChecks,
}

/// Liveness plus a database and broker ping. Always answers 200; a failing
/// component only degrades the reported status.
#[utoipa::path(
    get,
    path = "/health",
    summary = "Health check",
    responses((status = 200, description = "Service health", body = HealthResponse)),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let started = Instant::now();
    let db_result = crate::db::check_connection(&state.db).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let database = match db_result {
        Ok(()) => DatabaseCheck {
            status: ComponentStatus::Up,
            latency_ms,
            error: None,
        },
        Err(e) => DatabaseCheck {
            status: ComponentStatus::Down,
            latency_ms,
            error: Some(e.to_string()),
        },
    };

    let started = Instant::now();
    let queue_result = state.queue.health_check().await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let queue = QueueCheck {
        status: if queue_result.is_ok() {
            ComponentStatus::Up
        } else {
            ComponentStatus::Down
        },
        backend: state.queue.backend_name().to_string(),
        queue: state.services.dispatcher.queue_name().to_string(),
        latency_ms,
        error: queue_result.err().map(|e| e.to_string()),
    };

    let status = if database.status == ComponentStatus::Up && queue.status == ComponentStatus::Up {
        ComponentStatus::Up
    } else {
        ComponentStatus::Degraded
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks { database, queue },
    })
}
