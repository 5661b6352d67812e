use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::AppState;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// API key authentication middleware.
///
/// Checks `X-API-Key` against `api.key`. With no key configured every
/// request passes (development mode).
pub async fn api_key_auth(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let Some(expected_key) = state.settings.api.key.as_deref().filter(|k| !k.is_empty()) else {
        return next.run(req).await;
    };

    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if key == expected_key => next.run(req).await,
        Some(_) => {
            tracing::warn!(path = %req.uri().path(), "Invalid API key provided");
            unauthorized("Invalid API key")
        }
        None => {
            tracing::warn!(path = %req.uri().path(), "Missing API key header");
            unauthorized("Missing API key")
        }
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": {
                "code": "UNAUTHORIZED",
                "message": message,
            }
        })),
    )
        .into_response()
}
