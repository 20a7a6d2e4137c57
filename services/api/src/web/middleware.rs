//! services/api/src/web/middleware.rs
//!
//! Authentication and role middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use studyhub_core::domain::Role;
use tracing::error;

use crate::web::auth::{extract_bearer, Identity};
use crate::web::state::AppState;

/// Middleware that validates the bearer token and extracts the caller's identity.
///
/// If valid, inserts an `Identity` into request extensions for handlers to use.
/// If invalid, expired, or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract the bearer token from the Authorization header
    let token = extract_bearer(
        req.headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok()),
    )
    .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Verify signature and expiry
    let claims = state
        .tokens
        .verify(token)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    // 3. Insert the identity into request extensions
    req.extensions_mut().insert(Identity {
        email: claims.email,
        role_at_issue: claims.role,
    });

    // 4. Continue to the handler
    Ok(next.run(req).await)
}

/// Shared role gate. Runs after `require_auth` and re-derives the caller's
/// role from the user record on every request, so role changes take effect
/// immediately without reissuing tokens.
async fn require_any_role(
    state: Arc<AppState>,
    req: Request,
    next: Next,
    allowed: &[Role],
) -> Result<Response, StatusCode> {
    let identity = req
        .extensions()
        .get::<Identity>()
        .cloned()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let user = state
        .db
        .get_user_by_email(&identity.email)
        .await
        .map_err(|e| {
            error!("Role check failed for {}: {:?}", identity.email, e);
            StatusCode::UNAUTHORIZED
        })?;

    if !allowed.contains(&user.role) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(req).await)
}

/// Admits only callers whose stored role is `tutor`.
pub async fn require_tutor(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    require_any_role(state, req, next, &[Role::Tutor]).await
}

/// Admits only callers whose stored role is `admin`.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    require_any_role(state, req, next, &[Role::Admin]).await
}

/// Admits tutors and admins. Used by the session-update route, where both
/// may change fields.
pub async fn require_tutor_or_admin(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    require_any_role(state, req, next, &[Role::Tutor, Role::Admin]).await
}
