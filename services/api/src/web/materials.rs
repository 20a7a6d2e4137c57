//! services/api/src/web/materials.rs
//!
//! Material CRUD. Tutors manage their own materials; admins get the
//! paginated list, the count, and may delete any material.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use studyhub_core::domain::{NewMaterial, Role};
use uuid::Uuid;

use crate::web::auth::Identity;
use crate::web::state::AppState;
use crate::web::{port_error_response, PageQuery};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaterialRequest {
    pub session_id: Uuid,
    pub title: String,
    pub url: String,
}

#[derive(Deserialize)]
pub struct UpdateMaterialRequest {
    pub title: String,
    pub url: String,
}

/// POST /material - Attach a material to a session, owned by the calling tutor.
pub async fn create_material_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateMaterialRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let material = state
        .db
        .create_material(NewMaterial {
            session_id: req.session_id,
            tutor_email: identity.email,
            title: req.title,
            url: req.url,
        })
        .await
        .map_err(port_error_response)?;

    Ok((StatusCode::CREATED, Json(material)))
}

/// GET /tutorMaterials/{email} - List the calling tutor's own materials.
pub async fn tutor_materials_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if email != identity.email {
        return Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string()));
    }

    let materials = state
        .db
        .list_materials_by_tutor(&identity.email)
        .await
        .map_err(port_error_response)?;

    Ok(Json(materials))
}

/// GET /materials - Paginated list of every material (admin only).
pub async fn list_materials_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let materials = state
        .db
        .list_materials(query.to_page())
        .await
        .map_err(port_error_response)?;

    Ok(Json(materials))
}

/// GET /materials/count - Total material count (admin only).
pub async fn count_materials_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let count = state
        .db
        .count_materials()
        .await
        .map_err(port_error_response)?;

    Ok(Json(serde_json::json!({ "count": count })))
}

/// PUT /material/{id} - Update one of the calling tutor's materials.
pub async fn update_material_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(material_id): Path<Uuid>,
    Json(req): Json<UpdateMaterialRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let material = state
        .db
        .update_material(material_id, &identity.email, &req.title, &req.url)
        .await
        .map_err(port_error_response)?;

    Ok(Json(material))
}

/// DELETE /material/{id} - Tutors delete their own materials; admins delete
/// any. The stored role decides which, not the token.
pub async fn delete_material_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(material_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let caller = state
        .db
        .get_user_by_email(&identity.email)
        .await
        .map_err(port_error_response)?;

    let owner_filter = match caller.role {
        Role::Admin => None,
        _ => Some(identity.email.as_str()),
    };

    state
        .db
        .delete_material(material_id, owner_filter)
        .await
        .map_err(port_error_response)?;

    Ok(StatusCode::NO_CONTENT)
}
