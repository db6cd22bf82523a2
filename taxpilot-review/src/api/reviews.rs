//! Review queue endpoints
//!
//! Listing returns every item regardless of status so the dashboard can
//! show history. Resolution overwrites an already-terminal item (the store
//! logs the overwrite); an unknown id is a hard 404 to the reviewer.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use taxpilot_common::api::{ResolveRequest, ResolveResponse, ReviewListResponse};
use taxpilot_common::Error;

use crate::AppState;

/// GET /api/reviews
pub async fn list_reviews(
    State(state): State<AppState>,
) -> Result<Json<ReviewListResponse>, ReviewError> {
    let items = state.reviews.list().await?;
    Ok(Json(ReviewListResponse { items }))
}

/// PUT /api/reviews/:id
pub async fn resolve_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, ReviewError> {
    let item = state
        .reviews
        .resolve(id, request.status, request.reviewer_notes)
        .await?;

    info!(%id, status = %item.status, "review item resolved");

    Ok(Json(ResolveResponse { success: true, item }))
}

/// Review API errors
#[derive(Debug)]
pub struct ReviewError(Error);

impl From<Error> for ReviewError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            e => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use taxpilot_common::store::{MemoryReviewStore, ReviewStore};
    use taxpilot_common::types::{ReviewItem, ReviewStatus};

    use crate::{build_router, AppState};

    async fn setup() -> (axum::Router, Arc<MemoryReviewStore>) {
        let store = Arc::new(MemoryReviewStore::new());
        let router = build_router(AppState::new(store.clone()));
        (router, store)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_empty() {
        let (app, _) = setup().await;
        let response = app
            .oneshot(Request::get("/api/reviews").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["items"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_list_returns_all_statuses() {
        let (app, store) = setup().await;
        let pending = ReviewItem::pending("s1", "Withholding Rate", "2.0%", "low", 0.65);
        let resolved = ReviewItem::pending("s2", "Large Refund Amount", "$9,000", "check", 0.60);
        store.insert(&pending).await.unwrap();
        store.insert(&resolved).await.unwrap();
        store
            .resolve(resolved.id, ReviewStatus::Approved, None)
            .await
            .unwrap();

        let response = app
            .oneshot(Request::get("/api/reviews").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_roundtrip() {
        let (app, store) = setup().await;
        let item = ReviewItem::pending("s1", "Filing Status Optimization", "single", "hoh", 0.68);
        store.insert(&item).await.unwrap();

        let request = Request::put(format!("/api/reviews/{}", item.id))
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"status": "modified", "reviewer_notes": "switched to head_of_household"}"#,
            ))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["item"]["status"], "modified");
        assert!(!body["item"]["resolved_at"].is_null());

        let stored = store.get(item.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReviewStatus::Modified);
    }

    #[tokio::test]
    async fn test_resolve_unknown_id_is_404() {
        let (app, _) = setup().await;
        let request = Request::put(format!("/api/reviews/{}", uuid::Uuid::new_v4()))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"status": "approved", "reviewer_notes": ""}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_resolve_pending_status_is_400() {
        let (app, store) = setup().await;
        let item = ReviewItem::pending("s1", "f", "v", "r", 0.5);
        store.insert(&item).await.unwrap();

        let request = Request::put(format!("/api/reviews/{}", item.id))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"status": "pending", "reviewer_notes": null}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = setup().await;
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["module"], "taxpilot-review");
    }
}
