//! Document upload endpoint
//!
//! Alternative income-declaration entry point: the uploaded bytes go
//! through the document extractor and the extracted fields feed the same
//! transition as a typed income declaration.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use taxpilot_common::api::UploadResponse;
use taxpilot_common::Error;

use crate::AppState;

/// Query parameters for document upload
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub session_id: Option<String>,
    pub filename: Option<String>,
}

/// POST /api/upload?session_id=...&filename=...
///
/// Body is the raw document bytes.
pub async fn post_upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<UploadResponse>, UploadError> {
    if body.is_empty() {
        return Err(UploadError::NoFile);
    }

    let session_id = query
        .session_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .unwrap_or("demo");
    let filename = query.filename.unwrap_or_else(|| "upload.jpg".to_string());

    let extracted = state
        .extractor
        .extract_fields(&body)
        .await
        .map_err(UploadError::Extraction)?;

    info!(session_id, filename = %filename, size = body.len(),
        employer = %extracted.employer, "document extracted");

    let chat = state
        .manager
        .ingest_document(session_id, &extracted)
        .await
        .map_err(UploadError::Ingest)?;

    Ok(Json(UploadResponse {
        success: true,
        filename,
        size: body.len(),
        extracted,
        chat,
    }))
}

/// Upload API errors
#[derive(Debug)]
pub enum UploadError {
    NoFile,
    Extraction(Error),
    Ingest(Error),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            UploadError::NoFile => (StatusCode::BAD_REQUEST, "No file provided".to_string()),
            UploadError::Extraction(Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, msg)
            }
            UploadError::Extraction(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Extraction failed: {e}"))
            }
            UploadError::Ingest(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Upload failed: {e}"))
            }
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
