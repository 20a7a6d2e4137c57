//! services/api/src/web/users.rs
//!
//! User handlers: upsert-if-absent registration, single-user fetch, and the
//! admin-only list/count/role-update endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use studyhub_core::domain::Role;

use crate::web::state::AppState;
use crate::web::{port_error_response, PageQuery};

#[derive(Deserialize)]
pub struct UpsertUserRequest {
    pub name: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// PUT /users - Create the user record on first sign-in; later calls with the
/// same email return the existing record untouched.
pub async fn upsert_user_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpsertUserRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = state
        .db
        .upsert_user(&req.name, &req.email)
        .await
        .map_err(port_error_response)?;

    Ok((StatusCode::OK, Json(user)))
}

/// GET /user/{email} - Fetch one user.
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = state
        .db
        .get_user_by_email(&email)
        .await
        .map_err(port_error_response)?;

    Ok(Json(user))
}

/// GET /users - Paginated user list (admin only).
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let users = state
        .db
        .list_users(query.to_page())
        .await
        .map_err(port_error_response)?;

    Ok(Json(users))
}

/// GET /users/count - Total user count (admin only).
pub async fn count_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let count = state.db.count_users().await.map_err(port_error_response)?;

    Ok(Json(serde_json::json!({ "count": count })))
}

/// PATCH /users/{email} - Change a user's role (admin only). Takes effect on
/// the target's very next request; no token reissue needed.
pub async fn update_user_role_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = state
        .db
        .update_user_role(&email, req.role)
        .await
        .map_err(port_error_response)?;

    Ok(Json(user))
}
