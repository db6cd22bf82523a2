//! Chat endpoint
//!
//! The single inbound contract of the conversational core. When a remote
//! reasoning agent is configured it is tried first; on any failure the
//! local deterministic responder answers instead. No code path returns an
//! error to the end user — a failed transition becomes a clarifying
//! message.

use axum::{extract::State, Json};
use tracing::{error, warn};

use taxpilot_common::api::{ChatRequest, ChatResponse, StageInfo};
use taxpilot_common::types::Stage;

use crate::AppState;

/// Session id used when the caller does not supply one (demo mode).
const DEFAULT_SESSION: &str = "demo";

/// POST /api/chat
pub async fn post_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let session_id = request
        .session_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_SESSION);

    // Remote reasoning first, when configured; failures fall through.
    if let Some(remote) = &state.remote {
        match remote.complete(session_id, &request.message).await {
            Ok(response) => return Json(response),
            Err(e) => {
                warn!(session_id, error = %e, "remote agent unavailable, using local responder");
            }
        }
    }

    match state.manager.handle_message(session_id, &request.message).await {
        Ok(response) => Json(response),
        Err(e) => {
            error!(session_id, error = %e, "chat transition failed");
            Json(ChatResponse {
                message: "I'm having trouble processing your request. Please try again."
                    .to_string(),
                cards: Vec::new(),
                stage_info: StageInfo {
                    current_stage: Stage::Intake,
                    confidence: 0.0,
                    needs_review: false,
                },
            })
        }
    }
}
