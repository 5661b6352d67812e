//! Template listing endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::AppState;

/// Response for listing templates
#[derive(Debug, Serialize)]
pub struct TemplateListResponse {
    /// Registered template names, sorted
    pub templates: Vec<String>,

    /// Total count
    pub total: usize,
}

/// GET /api/v1/templates - List registered templates
#[tracing::instrument(name = "http.list_templates", skip(state))]
pub async fn list_templates(State(state): State<AppState>) -> Json<TemplateListResponse> {
    let templates = state.registry.names();
    let total = templates.len();

    Json(TemplateListResponse { templates, total })
}
