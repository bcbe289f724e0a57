use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{upload, ApiError, AppState};
use crate::export::{self, Download, ShareCapabilities, SharePlan};
use crate::presenter::{present, ResultView};
use crate::session::{PoemSuccess, SessionController, SessionId, SubmitOutcome};

pub const NOTICE_HEADER: &str = "x-poem-notice";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: SessionId,
    pub view: ResultView,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub photo_data_uri: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub view: ResultView,
    pub superseded: bool,
}

fn session(state: &AppState, id: SessionId) -> Result<Arc<SessionController>, ApiError> {
    state.sessions.get(&id).ok_or(ApiError::SessionNotFound(id))
}

fn completed(session: &SessionController) -> Result<Arc<PoemSuccess>, ApiError> {
    session.snapshot().success().cloned().ok_or(ApiError::NoResult)
}

fn submit_response(session: &SessionController, outcome: SubmitOutcome) -> SubmitResponse {
    match outcome {
        SubmitOutcome::Completed(state) => SubmitResponse {
            view: present(&state),
            superseded: false,
        },
        SubmitOutcome::Superseded { .. } => SubmitResponse {
            view: present(&session.snapshot()),
            superseded: true,
        },
    }
}

/// POST /api/sessions
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let (session_id, session) = state.sessions.create();
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id,
            view: present(&session.snapshot()),
        }),
    )
}

/// GET /api/sessions/:id
pub async fn session_view(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<Json<ResultView>, ApiError> {
    let session = session(&state, id)?;
    Ok(Json(present(&session.snapshot())))
}

/// POST /api/sessions/:id/poem
pub async fn submit_data_uri(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let session = session(&state, id)?;
    let outcome = session.submit(request.photo_data_uri).await;
    Ok(Json(submit_response(&session, outcome)))
}

/// POST /api/sessions/:id/upload
pub async fn upload_photo(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    multipart: Multipart,
) -> Result<Json<SubmitResponse>, ApiError> {
    let session = session(&state, id)?;
    let image = upload::read_photo(multipart).await?;
    info!(session = %id, mime = image.mime_type(), "photo uploaded");
    let outcome = session.submit(image.as_str()).await;
    Ok(Json(submit_response(&session, outcome)))
}

/// GET /api/sessions/:id/export/poem
pub async fn export_poem(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<Response, ApiError> {
    let session = session(&state, id)?;
    let result = completed(&session)?;
    attachment(export::export_poem_as_text(&result))
}

/// GET /api/sessions/:id/export/image
pub async fn export_photo(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<Response, ApiError> {
    let session = session(&state, id)?;
    let result = completed(&session)?;
    attachment(export::export_image(&result)?)
}

/// POST /api/sessions/:id/share
///
/// Returns the plan the page runs against the browser's share sheet and
/// clipboard.
pub async fn share_result(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(capabilities): Json<ShareCapabilities>,
) -> Result<Json<SharePlan>, ApiError> {
    let session = session(&state, id)?;
    let result = completed(&session)?;
    let image_url = format!("/api/sessions/{id}/export/image");
    let plan = export::plan_share(&result, capabilities, &image_url);
    info!(session = %id, steps = plan.steps.len(), "share planned");
    Ok(Json(plan))
}

/// POST /api/sessions/:id/copy
pub async fn copy_result(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<Json<SharePlan>, ApiError> {
    let session = session(&state, id)?;
    let result = completed(&session)?;
    Ok(Json(export::plan_copy(&result)))
}

fn attachment(download: Download) -> Result<Response, ApiError> {
    let header_value = |value: String| {
        HeaderValue::from_str(&value).map_err(|e| ApiError::Internal(e.to_string()))
    };

    let content_type = header_value(download.content_type)?;
    let disposition = header_value(format!("attachment; filename=\"{}\"", download.file_name))?;
    let notice = header_value(download.notification.description)?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (HeaderName::from_static(NOTICE_HEADER), notice),
        ],
        download.bytes,
    )
        .into_response())
}
