//! services/api/src/web/auth.rs
//!
//! Bearer-token issuance and verification.
//!
//! Tokens are HS256-signed JWTs with a one-hour lifetime. The `/jwt` endpoint
//! deliberately accepts client-supplied claims without a prior login step: the
//! upstream sign-in flow is assumed to have verified the email, and the role
//! embedded in the token is informational only — every protected route
//! re-derives the authoritative role from the user record.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use studyhub_core::domain::Role;
use tracing::error;
use utoipa::ToSchema;

use crate::web::state::AppState;

/// Token lifetime in seconds.
const TOKEN_TTL_SECS: u64 = 3600;

//=========================================================================================
// Claims
//=========================================================================================

/// Payload embedded in a signed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The caller's email, the identity key throughout the system.
    pub email: String,
    /// Role at issue time. Informational: role checks read the store.
    pub role: Role,
    /// Issued at (Unix timestamp).
    pub iat: u64,
    /// Expiration time (Unix timestamp).
    pub exp: u64,
}

/// The authenticated caller, as attached to request extensions by the
/// authentication middleware.
#[derive(Debug, Clone)]
pub struct Identity {
    pub email: String,
    pub role_at_issue: Role,
}

//=========================================================================================
// TokenIssuer
//=========================================================================================

/// Signs and verifies bearer tokens with a shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
}

impl TokenIssuer {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    /// Issues a signed token embedding the given identity, valid for one hour.
    pub fn issue(&self, email: &str, role: Role) -> Result<String, jsonwebtoken::errors::Error> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let claims = Claims {
            email: email.to_string(),
            role,
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
    }

    /// Verifies signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(auth_header: Option<&str>) -> Option<&str> {
    let token = auth_header?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

//=========================================================================================
// Handler
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct IssueTokenRequest {
    pub email: String,
    /// Role the client claims; defaults to student. Carried in the token but
    /// never trusted for authorization.
    #[serde(default = "default_role")]
    #[schema(value_type = String, example = "student")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Student
}

#[derive(Serialize, ToSchema)]
pub struct IssueTokenResponse {
    pub token: String,
}

/// POST /jwt - Issue a signed, time-limited credential from client-supplied claims.
#[utoipa::path(
    post,
    path = "/jwt",
    request_body = IssueTokenRequest,
    responses(
        (status = 200, description = "Token issued", body = IssueTokenResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn issue_token_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IssueTokenRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let token = state.tokens.issue(&req.email, req.role).map_err(|e| {
        error!("Failed to sign token: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to issue token".to_string(),
        )
    })?;

    Ok((StatusCode::OK, Json(IssueTokenResponse { token })))
}
