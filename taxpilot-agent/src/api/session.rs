//! Session and tax-return view endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::error;

use taxpilot_common::api::{SessionResponse, TaxReturnResponse};

use crate::AppState;

/// GET /api/session/:id
///
/// Read-only snapshot of a session; `null` when the id has never spoken.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<SessionResponse> {
    let session = match state.manager.snapshot(&session_id).await {
        Ok(session) => session,
        Err(e) => {
            error!(%session_id, error = %e, "session snapshot failed");
            None
        }
    };
    Json(SessionResponse { session })
}

/// GET /api/tax-return/:id
///
/// The last computed result for a session, if any.
pub async fn get_tax_return(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<TaxReturnResponse> {
    let result = match state.manager.snapshot(&session_id).await {
        Ok(session) => session.and_then(|s| s.last_result),
        Err(e) => {
            error!(%session_id, error = %e, "tax return lookup failed");
            None
        }
    };
    Json(TaxReturnResponse { result })
}
