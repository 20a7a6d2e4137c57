//! services/api/src/web/reviews.rs
//!
//! Review creation and per-session listing.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use studyhub_core::domain::NewReview;
use uuid::Uuid;

use crate::web::auth::Identity;
use crate::web::port_error_response;
use crate::web::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub session_id: Uuid,
    pub student_name: String,
    pub rating: i32,
    pub comment: String,
}

/// POST /review - Leave a review on a session. The reviewer identity comes
/// from the verified credential.
pub async fn create_review_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if !(1..=5).contains(&req.rating) {
        return Err((
            StatusCode::BAD_REQUEST,
            "rating must be between 1 and 5".to_string(),
        ));
    }

    let review = state
        .db
        .create_review(NewReview {
            session_id: req.session_id,
            student_email: identity.email,
            student_name: req.student_name,
            rating: req.rating,
            comment: req.comment,
        })
        .await
        .map_err(port_error_response)?;

    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /reviews/{id} - List the reviews for one session.
pub async fn list_reviews_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let reviews = state
        .db
        .list_reviews_for_session(session_id)
        .await
        .map_err(port_error_response)?;

    Ok(Json(reviews))
}
