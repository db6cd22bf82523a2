//! taxpilot-agent library - Conversational tax-filing agent
//!
//! Wires the intent classifier, session state machine, confidence gate,
//! and review queue behind the chat/upload HTTP API.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod engine;
pub mod extract;
pub mod gate;
pub mod intent;
pub mod remote;
pub mod sessions;

use extract::DocumentExtractor;
use remote::RemoteAgentClient;
use sessions::SessionManager;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SessionManager>,
    pub extractor: Arc<dyn DocumentExtractor>,
    /// Remote reasoning collaborator, tried before the local responder.
    pub remote: Option<Arc<RemoteAgentClient>>,
}

impl AppState {
    pub fn new(
        manager: Arc<SessionManager>,
        extractor: Arc<dyn DocumentExtractor>,
        remote: Option<Arc<RemoteAgentClient>>,
    ) -> Self {
        Self { manager, extractor, remote }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(api::post_chat))
        .route("/api/session/:id", get(api::get_session))
        .route("/api/tax-return/:id", get(api::get_tax_return))
        .route("/api/upload", post(api::post_upload))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
