use axum::{
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::{make_request_span, request_id_middleware},
    services::{CatalogProvider, RecommendationService},
};

pub mod movies;
pub mod recommendations;

/// Shared state handed to every handler
pub struct AppState {
    pub catalog: Arc<dyn CatalogProvider>,
    pub recommender: RecommendationService,
}

impl AppState {
    pub fn new(catalog: Arc<dyn CatalogProvider>, recommender: RecommendationService) -> Self {
        Self {
            catalog,
            recommender,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations", post(recommendations::recommend))
        .route("/movies/search", get(movies::search))
        .route("/movies/:id", get(movies::details))
        .route("/genres", get(movies::genres))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
