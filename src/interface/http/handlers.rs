use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

use crate::application::AggregationService;
use crate::domain::{ContainerId, ContainerRecord};
use crate::ports::{RuntimeError, RuntimeResult};

/// Any failure behind a data endpoint; always answered with 500 and `{error}`
#[derive(Debug, Error)]
#[error("{context}: {source}")]
pub struct ApiError {
    context: &'static str,
    #[source]
    source: RuntimeError,
}

impl ApiError {
    fn new(context: &'static str, source: RuntimeError) -> Self {
        Self { context, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        error!("{}", message);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message }))).into_response()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AggregationService>,
}

impl AppState {
    /// Run a service call under the request timeout.
    async fn within<T>(&self, call: impl Future<Output = RuntimeResult<T>>) -> RuntimeResult<T> {
        let limit = self.service.timeout();
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(RuntimeError::Timeout(limit)))
    }
}

/// Handler for GET /api/health
pub async fn health_handler(State(state): State<AppState>) -> Response {
    match state.service.health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "service": "dockpulse",
                "runtime": "available"
            })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "degraded",
                "service": "dockpulse",
                "runtime": "unavailable",
                "error": e.to_string()
            })),
        )
            .into_response(),
    }
}

/// Handler for GET /api/containers: engine-native listing, stopped containers included
pub async fn containers_handler(State(state): State<AppState>) -> Result<Json<Vec<serde_json::Value>>, ApiError> {
    state
        .within(state.service.list_all())
        .await
        .map(Json)
        .map_err(|e| ApiError::new("failed to list containers", e))
}

/// Handler for GET /api/containers/{id}/stats: engine-native single-shot stats
pub async fn container_stats_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = ContainerId::new(id);
    state
        .within(state.service.container_stats(&id))
        .await
        .map(Json)
        .map_err(|e| ApiError::new("failed to get container stats", e))
}

/// Handler for GET /api/containers/stats: normalized records for running containers.
///
/// `collect` enforces the request timeout itself so that a stuck container
/// is omitted rather than failing the response.
pub async fn all_stats_handler(State(state): State<AppState>) -> Result<Json<Vec<ContainerRecord>>, ApiError> {
    let outcome = state
        .service
        .collect()
        .await
        .map_err(|e| ApiError::new("failed to collect container stats", e))?;

    if !outcome.omitted.is_empty() {
        let omitted: Vec<&str> = outcome.omitted.iter().map(|o| o.name.as_str()).collect();
        info!(
            returned = outcome.records.len(),
            omitted = ?omitted,
            "serving partial container stats"
        );
    }
    Ok(Json(outcome.records))
}
