//! Session lifecycle and status query handlers
//!
//! POST /sessions, GET /status/:session_id,
//! POST /sessions/:session_id/progress, POST /sessions/:session_id/failure

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::{
    db::RecordStore,
    error::{ApiError, ApiResult},
    models::{CreateSessionResponse, ReportedProgress, Session, StatusResponse},
    AppState,
};

/// POST /sessions request; the id is generated when omitted
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default, rename = "sessionId", alias = "session_id")]
    pub session_id: Option<String>,
}

/// POST /sessions/:session_id/failure request
#[derive(Debug, Deserialize)]
pub struct FailureRequest {
    #[serde(alias = "reason", alias = "message")]
    pub error: String,
}

/// POST /sessions
pub async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionRequest>>,
) -> ApiResult<(StatusCode, Json<CreateSessionResponse>)> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let session = match request.session_id {
        Some(id) => Session::with_id(id),
        None => Session::new(),
    };

    state.store.create_session(&session).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.session_id,
            created_at: session.created_at,
        }),
    ))
}

/// GET /status/:session_id
pub async fn get_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    Ok(Json(state.status.status(&session_id).await?))
}

/// POST /sessions/:session_id/progress
pub async fn report_progress(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(progress): Json<ReportedProgress>,
) -> ApiResult<StatusCode> {
    if progress.percent > 100 {
        return Err(ApiError::BadRequest(format!(
            "Progress must be 0-100, got {}",
            progress.percent
        )));
    }
    state.store.report_progress(&session_id, &progress).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /sessions/:session_id/failure
pub async fn report_failure(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<FailureRequest>,
) -> ApiResult<StatusCode> {
    if request.error.trim().is_empty() {
        return Err(ApiError::BadRequest("Failure reason must not be empty".to_string()));
    }
    state.store.mark_failed(&session_id, request.error.trim()).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/status/:session_id", get(get_status))
        .route("/sessions/:session_id/progress", post(report_progress))
        .route("/sessions/:session_id/failure", post(report_failure))
}
