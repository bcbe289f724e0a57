mod page;
mod routes;
pub mod upload;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::{ErrorKind, ExportError};
use crate::export;
use crate::session::{SessionId, SessionRegistry};

/// Limit on a multipart photo upload.
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// Limit on JSON bodies. A data URI carries a photo of up to
/// [`MAX_PHOTO_BYTES`] inflated by a third.
pub const MAX_BODY_BYTES: usize = 14 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown session {0}")]
    SessionNotFound(SessionId),
    #[error("no poem has been generated yet")]
    NoResult,
    #[error("{0}")]
    InvalidUpload(String),
    #[error("photo exceeds the {} MiB upload limit", MAX_PHOTO_BYTES / (1024 * 1024))]
    PayloadTooLarge,
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::NoResult => StatusCode::CONFLICT,
            ApiError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Export(err) => {
                let body = json!({
                    "error": err.to_string(),
                    "kind": ErrorKind::ExportFailure,
                    "notification": export::export_failed(err),
                });
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(page::index))
        .route("/health", get(|| async { "ok" }))
        .route("/api/sessions", post(routes::create_session))
        .route("/api/sessions/:id", get(routes::session_view))
        .route("/api/sessions/:id/poem", post(routes::submit_data_uri))
        .route(
            "/api/sessions/:id/upload",
            post(routes::upload_photo).layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES)),
        )
        .route("/api/sessions/:id/export/poem", get(routes::export_poem))
        .route("/api/sessions/:id/export/image", get(routes::export_photo))
        .route("/api/sessions/:id/share", post(routes::share_result))
        .route("/api/sessions/:id/copy", post(routes::copy_result))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}
