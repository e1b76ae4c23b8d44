use std::sync::Arc;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::application::AggregationService;
use crate::interface::web::static_handler;

use super::handlers::{all_stats_handler, container_stats_handler, containers_handler, health_handler, AppState};

pub fn create_router(service: Arc<AggregationService>) -> Router {
    let state = AppState { service };

    Router::new()
        // API routes
        .route("/api/health", get(health_handler))
        .route("/api/containers", get(containers_handler))
        .route("/api/containers/stats", get(all_stats_handler))
        .route("/api/containers/{id}/stats", get(container_stats_handler))
        // Embedded dashboard
        .fallback(static_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
