//! services/api/src/web/mod.rs
//!
//! The HTTP surface: per-resource handlers, authentication middleware, and
//! the shared application state.

pub mod auth;
pub mod bookings;
pub mod materials;
pub mod middleware;
pub mod notes;
pub mod payments;
pub mod reviews;
pub mod sessions;
pub mod state;
pub mod users;

use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use studyhub_core::ports::{Page, PortError};
use tracing::error;
use utoipa::OpenApi;

use crate::web::state::AppState;

pub use middleware::{require_admin, require_auth, require_tutor, require_tutor_or_admin};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::issue_token_handler,
        bookings::create_booking_handler,
        payments::create_payment_intent_handler,
        sessions::create_session_handler,
    ),
    components(
        schemas(
            auth::IssueTokenRequest,
            auth::IssueTokenResponse,
            bookings::CreateBookingRequest,
            payments::CreatePaymentIntentRequest,
            payments::CreatePaymentIntentResponse,
            sessions::CreateSessionRequest,
        )
    ),
    tags(
        (name = "StudyHub API", description = "API endpoints for the tutoring marketplace.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router Construction
//=========================================================================================

/// Builds the full API router with its authentication and role gates.
/// The binary wraps this with CORS and the Swagger UI; tests drive it directly.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/jwt", post(auth::issue_token_handler))
        .route("/users", put(users::upsert_user_handler))
        .route("/sessions/{status}", get(sessions::list_sessions_handler))
        .route(
            "/sessions/{status}/count",
            get(sessions::count_sessions_handler),
        );

    // Routes behind authentication only
    let auth_routes = Router::new()
        .route("/user/{email}", get(users::get_user_handler))
        .route(
            "/create-payment-intent",
            post(payments::create_payment_intent_handler),
        )
        .route("/session/{id}", get(sessions::get_session_handler))
        .route("/booking", post(bookings::create_booking_handler))
        .route(
            "/bookingSession/{email}",
            get(bookings::list_bookings_handler),
        )
        .route("/note", post(notes::create_note_handler))
        .route("/notes/{email}", get(notes::list_notes_handler))
        .route("/note/{id}", put(notes::update_note_handler))
        .route("/note/{id}", delete(notes::delete_note_handler))
        .route("/review", post(reviews::create_review_handler))
        .route("/reviews/{id}", get(reviews::list_reviews_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Tutor-only routes: authentication, then a store-backed role check
    let tutor_routes = Router::new()
        .route(
            "/create-study-session",
            post(sessions::create_session_handler),
        )
        .route(
            "/tutorSessions/{email}",
            get(sessions::tutor_sessions_handler),
        )
        .route("/material", post(materials::create_material_handler))
        .route(
            "/tutorMaterials/{email}",
            get(materials::tutor_materials_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_tutor,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Routes tutors and admins share. Material updates stay owner-scoped in
    // the store query, so an admin passing this gate still cannot edit a
    // tutor's material; deletes check the stored role to widen to any owner.
    let tutor_or_admin_routes = Router::new()
        .route(
            "/study-session/{id}",
            patch(sessions::update_session_handler),
        )
        .route("/material/{id}", put(materials::update_material_handler))
        .route(
            "/material/{id}",
            delete(materials::delete_material_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_tutor_or_admin,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Admin-only routes
    let admin_routes = Router::new()
        .route("/allUsers", get(users::list_users_handler))
        .route("/allUsers/count", get(users::count_users_handler))
        .route("/users/{email}", patch(users::update_user_role_handler))
        .route("/materials", get(materials::list_materials_handler))
        .route("/materials/count", get(materials::count_materials_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(tutor_routes)
        .merge(tutor_or_admin_routes)
        .merge(admin_routes)
        .with_state(state)
}

//=========================================================================================
// Shared Handler Helpers
//=========================================================================================

/// Maps a port error to the HTTP response it represents, logging anything
/// unexpected before collapsing it to a 500.
pub(crate) fn port_error_response(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Unexpected(msg) => {
            error!("Unexpected port error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

/// Query parameters accepted by every paginated list endpoint.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageQuery {
    pub fn to_page(&self) -> Page {
        let default = Page::default();
        Page::new(
            self.page.unwrap_or(default.page),
            self.size.unwrap_or(default.size),
        )
    }
}
