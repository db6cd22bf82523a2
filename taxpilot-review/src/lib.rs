//! taxpilot-review library - Reviewer service
//!
//! Small service over the shared review queue: licensed reviewers list
//! flagged items and record dispositions. This is the only surface where
//! `NotFound` is returned to the caller as a hard error.

use std::sync::Arc;

use axum::routing::{get, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use taxpilot_common::store::ReviewStore;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub reviews: Arc<dyn ReviewStore>,
}

impl AppState {
    pub fn new(reviews: Arc<dyn ReviewStore>) -> Self {
        Self { reviews }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/reviews", get(api::list_reviews))
        .route("/api/reviews/:id", put(api::resolve_review))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
