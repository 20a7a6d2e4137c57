//! services/api/src/web/sessions.rs
//!
//! Study-session handlers: creation by tutors, public listing by approval
//! status, and moderation updates by tutors or admins.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use studyhub_core::domain::{ApprovalStatus, NewStudySession, StudySessionUpdate};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;
use crate::web::{port_error_response, PageQuery};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub title: String,
    pub description: String,
    pub tutor_name: String,
    pub tutor_email: String,
    pub registration_fee: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionRequest {
    pub status: Option<ApprovalStatus>,
    pub registration_fee: Option<f64>,
    pub rejection_reason: Option<String>,
}

/// Parses the `{status}` path segment; `all` means no filter.
fn parse_status_filter(raw: &str) -> Result<Option<ApprovalStatus>, (StatusCode, String)> {
    if raw == "all" {
        return Ok(None);
    }
    raw.parse::<ApprovalStatus>()
        .map(Some)
        .map_err(|e| (StatusCode::BAD_REQUEST, e))
}

/// POST /create-study-session - Create a session (tutor only). New sessions
/// start pending with zero participants.
#[utoipa::path(
    post,
    path = "/create-study-session",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created"),
        (status = 400, description = "Invalid registration fee"),
        (status = 401, description = "Not a tutor")
    )
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if !req.registration_fee.is_finite() || req.registration_fee < 0.0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "registrationFee must be a non-negative number".to_string(),
        ));
    }

    let session = state
        .db
        .create_session(NewStudySession {
            title: req.title,
            description: req.description,
            tutor_name: req.tutor_name,
            tutor_email: req.tutor_email,
            registration_fee: req.registration_fee,
        })
        .await
        .map_err(port_error_response)?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /session/{id} - Fetch one session. A malformed id fails extraction
/// with 400; a missing one returns 404.
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session = state
        .db
        .get_session_by_id(session_id)
        .await
        .map_err(port_error_response)?;

    Ok(Json(session))
}

/// GET /sessions/{status} - Paginated session list filtered by approval
/// status (`pending`, `approved`, `rejected`, or `all`). Public.
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    Path(status): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let filter = parse_status_filter(&status)?;

    let sessions = state
        .db
        .list_sessions(filter, query.to_page())
        .await
        .map_err(port_error_response)?;

    Ok(Json(sessions))
}

/// GET /sessions/{status}/count - Total sessions matching the same filter as
/// the list endpoint, regardless of page/size.
pub async fn count_sessions_handler(
    State(state): State<Arc<AppState>>,
    Path(status): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let filter = parse_status_filter(&status)?;

    let count = state
        .db
        .count_sessions(filter)
        .await
        .map_err(port_error_response)?;

    Ok(Json(serde_json::json!({ "count": count })))
}

/// GET /tutorSessions/{email} - Sessions owned by one tutor (tutor only).
pub async fn tutor_sessions_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let sessions = state
        .db
        .list_sessions_by_tutor(&email)
        .await
        .map_err(port_error_response)?;

    Ok(Json(sessions))
}

/// PATCH /study-session/{id} - Update status, fee, or rejection reason
/// (tutor or admin).
pub async fn update_session_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<UpdateSessionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Some(fee) = req.registration_fee {
        if !fee.is_finite() || fee < 0.0 {
            return Err((
                StatusCode::BAD_REQUEST,
                "registrationFee must be a non-negative number".to_string(),
            ));
        }
    }

    let session = state
        .db
        .update_session(
            session_id,
            StudySessionUpdate {
                status: req.status,
                registration_fee: req.registration_fee,
                rejection_reason: req.rejection_reason,
            },
        )
        .await
        .map_err(port_error_response)?;

    Ok(Json(session))
}
