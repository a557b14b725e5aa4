//! Unversioned handlers: health, metrics and the schema catalogue.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use super::{ApiResponse, AppState};
use crate::error::{ErrorCode, TesseraError};
use crate::schema::SchemaSummary;

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Prometheus text exposition. 404 when metrics are disabled.
pub async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    if !state.metrics.is_enabled() {
        return (StatusCode::NOT_FOUND, "metrics disabled").into_response();
    }

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
        .into_response()
}

pub async fn list_schemas(State(state): State<AppState>) -> ApiResponse<Vec<String>> {
    ApiResponse::success(state.registry.entity_names())
}

pub async fn describe_schema(
    State(state): State<AppState>,
    Path(entity): Path<String>,
) -> Result<ApiResponse<SchemaSummary>, TesseraError> {
    state
        .registry
        .summary(&entity)
        .map(ApiResponse::success)
        .ok_or_else(|| TesseraError::new(ErrorCode::UnknownEntity, format!("Unknown entity: {}", entity)))
}
