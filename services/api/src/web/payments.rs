//! services/api/src/web/payments.rs
//!
//! The payment-intent relay. The handler converts a registration fee in
//! major currency units to integer minor units and hands it to the payment
//! collaborator; a non-positive or unparsable fee short-circuits before any
//! external call is made.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use studyhub_core::domain::fee_to_minor_units;
use utoipa::ToSchema;

use crate::web::port_error_response;
use crate::web::state::AppState;

const CURRENCY: &str = "usd";

/// Clients send the fee either as a JSON number or as a numeric string.
fn fee_from_number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFee {
        Number(f64),
        Text(String),
    }

    match RawFee::deserialize(deserializer)? {
        RawFee::Number(n) => Ok(n),
        RawFee::Text(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentRequest {
    #[serde(deserialize_with = "fee_from_number_or_string")]
    pub registration_fee: f64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentIntentResponse {
    pub client_secret: String,
}

/// POST /create-payment-intent - Relay a charge to the payment collaborator
/// and return its client secret.
#[utoipa::path(
    post,
    path = "/create-payment-intent",
    request_body = CreatePaymentIntentRequest,
    responses(
        (status = 200, description = "Client secret created", body = CreatePaymentIntentResponse),
        (status = 400, description = "Fee is zero, negative, or malformed")
    )
)]
pub async fn create_payment_intent_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePaymentIntentRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let amount_minor = fee_to_minor_units(req.registration_fee).ok_or((
        StatusCode::BAD_REQUEST,
        "registrationFee must be a positive amount".to_string(),
    ))?;

    let client_secret = state
        .payments
        .create_payment_intent(amount_minor, CURRENCY)
        .await
        .map_err(port_error_response)?;

    Ok(Json(CreatePaymentIntentResponse { client_secret }))
}
