use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the application router with all routes and layers
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        // Layers run bottom-up: the request id must exist before the trace span is made
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Recommendations
        .route("/recommendations/assemble", post(handlers::assemble))
        .route("/recommendations/:user_id", get(handlers::recommend))
        .route("/recommendations/:user_id/affinity", get(handlers::affinity_only))
        .route("/recommendations/:user_id/content", get(handlers::content_only))
        // Models
        .route("/models/reload", post(handlers::reload_models))
}
