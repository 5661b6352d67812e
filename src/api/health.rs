//! Health check and statistics endpoints.

use axum::{
    extract::State,
    Json,
};
use serde::Serialize;

use crate::notification::DispatcherStatsSnapshot;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub transport: TransportHealthResponse,
    pub queue: QueueHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct TransportHealthResponse {
    pub state: String,
    pub available: bool,
    pub configured: bool,
}

#[derive(Debug, Serialize)]
pub struct QueueHealthResponse {
    pub enabled: bool,
    pub backend: String,
    /// Jobs waiting; absent when the backend cannot be reached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub notifications: DispatcherStatsSnapshot,
    pub transport: TransportStats,
    pub templates: usize,
}

#[derive(Debug, Serialize)]
pub struct TransportStats {
    pub state: String,
    pub available: bool,
    pub configured: bool,
    pub last_verified_ms: i64,
    pub verifications_succeeded: u32,
    pub verifications_failed: u32,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime_seconds = state.start_time.elapsed().as_secs();
    let transport = state.transport.status();

    let pending = match state.queue.len().await {
        Ok(pending) => Some(pending),
        Err(e) => {
            tracing::warn!(error = %e, "Queue length unavailable for health check");
            None
        }
    };

    // Running without a transport is a supported mode; a configured one that
    // is down is not
    let status = if transport.configured && !transport.available {
        "degraded"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        transport: TransportHealthResponse {
            state: state.transport.state().as_str().to_string(),
            available: transport.available,
            configured: transport.configured,
        },
        queue: QueueHealthResponse {
            enabled: state.settings.queue.enabled,
            backend: state.queue.backend_type().to_string(),
            pending,
        },
    })
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let transport = state.transport.status();
    let health = state.transport.health_stats();

    Json(StatsResponse {
        notifications: state.dispatcher.stats(),
        transport: TransportStats {
            state: health.state.as_str().to_string(),
            available: transport.available,
            configured: transport.configured,
            last_verified_ms: health.last_verified_ms,
            verifications_succeeded: health.verifications_succeeded,
            verifications_failed: health.verifications_failed,
        },
        templates: state.registry.len(),
    })
}
