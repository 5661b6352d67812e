use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::{api_key_auth, AppState};

use super::health::{health, stats};
use super::metrics::prometheus_metrics;
use super::notifications::{
    bulk_notifications, queue_notification, send_notification, validate_address,
};
use super::templates::list_templates;

pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health, stats & metrics
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        // Notification endpoints, behind the API key when one is configured
        .nest(
            "/api/v1",
            Router::new()
                .route("/notifications/send", post(send_notification))
                .route("/notifications/queue", post(queue_notification))
                .route("/notifications/bulk", post(bulk_notifications))
                .route("/addresses/validate", post(validate_address))
                .route("/templates", get(list_templates))
                .route_layer(middleware::from_fn_with_state(state, api_key_auth)),
        )
}
