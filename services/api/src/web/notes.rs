//! services/api/src/web/notes.rs
//!
//! Note CRUD. Every operation is scoped to the authenticated caller's email:
//! the owner filter travels into the store query, so a known note id belonging
//! to someone else behaves exactly like a missing note.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use studyhub_core::domain::NewNote;
use uuid::Uuid;

use crate::web::auth::Identity;
use crate::web::port_error_response;
use crate::web::state::AppState;

#[derive(Deserialize)]
pub struct NotePayload {
    pub title: String,
    pub content: String,
}

/// POST /note - Create a note owned by the caller.
pub async fn create_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<NotePayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let note = state
        .db
        .create_note(NewNote {
            owner_email: identity.email,
            title: req.title,
            content: req.content,
        })
        .await
        .map_err(port_error_response)?;

    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /notes/{email} - List the caller's notes. The path email must match
/// the authenticated identity.
pub async fn list_notes_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if email != identity.email {
        return Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string()));
    }

    let notes = state
        .db
        .list_notes_by_owner(&identity.email)
        .await
        .map_err(port_error_response)?;

    Ok(Json(notes))
}

/// PUT /note/{id} - Update one of the caller's notes.
pub async fn update_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(note_id): Path<Uuid>,
    Json(req): Json<NotePayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let note = state
        .db
        .update_note(note_id, &identity.email, &req.title, &req.content)
        .await
        .map_err(port_error_response)?;

    Ok(Json(note))
}

/// DELETE /note/{id} - Delete one of the caller's notes.
pub async fn delete_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(note_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .delete_note(note_id, &identity.email)
        .await
        .map_err(port_error_response)?;

    Ok(StatusCode::NO_CONTENT)
}
