//! services/api/src/web/bookings.rs
//!
//! The booking workflow endpoint and a student's booking list.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use studyhub_core::domain::NewBooking;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::auth::Identity;
use crate::web::port_error_response;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub session_id: Uuid,
    pub session_title: String,
    pub tutor_email: String,
    pub student_name: String,
    pub registration_fee: f64,
    pub payment_intent_id: Option<String>,
}

/// POST /booking - Run the booking workflow for the authenticated student.
///
/// The student identity comes from the verified credential, not the payload,
/// so a caller cannot book on someone else's behalf. Duplicate bookings for
/// the same (session, student) pair return 409 with nothing mutated; the
/// store's unique constraint makes this hold under concurrent submissions.
#[utoipa::path(
    post,
    path = "/booking",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created"),
        (status = 404, description = "Session does not exist"),
        (status = 409, description = "Already booked")
    )
)]
pub async fn create_booking_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let booking = state
        .db
        .create_booking(NewBooking {
            session_id: req.session_id,
            session_title: req.session_title,
            tutor_email: req.tutor_email,
            student_email: identity.email,
            student_name: req.student_name,
            registration_fee: req.registration_fee,
            payment_intent_id: req.payment_intent_id,
        })
        .await
        .map_err(port_error_response)?;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /bookingSession/{email} - List a student's bookings.
pub async fn list_bookings_handler(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let bookings = state
        .db
        .list_bookings_by_student(&email)
        .await
        .map_err(port_error_response)?;

    Ok(Json(bookings))
}
