//! services/api/src/adapters/payment.rs
//!
//! This module contains the adapter for the external payment processor.
//! It implements the `PaymentService` port from the `core` crate over the
//! processor's HTTP API. The system only relays amounts and client secrets;
//! everything else about the payment lifecycle lives on the processor side.

use async_trait::async_trait;
use serde::Deserialize;
use studyhub_core::ports::{PaymentService, PortError, PortResult};
use tracing::debug;

const DEFAULT_API_BASE: &str = "https://api.stripe.com/v1";

/// The subset of the payment-intent response this system relays.
#[derive(Deserialize)]
struct PaymentIntentResponse {
    client_secret: String,
}

/// A payment adapter that implements the `PaymentService` port against the
/// Stripe API.
#[derive(Clone)]
pub struct StripeAdapter {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeAdapter {
    /// Creates a new `StripeAdapter` using the given secret key.
    pub fn new(secret_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Points the adapter at a different API base URL (test servers).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[async_trait]
impl PaymentService for StripeAdapter {
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> PortResult<String> {
        debug!(amount_minor, currency, "creating payment intent");

        let params = [
            ("amount", amount_minor.to_string()),
            ("currency", currency.to_string()),
            ("payment_method_types[]", "card".to_string()),
        ];

        let response = self
            .client
            .post(format!("{}/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("payment processor request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "payment processor returned {status}: {body}"
            )));
        }

        let intent: PaymentIntentResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("malformed payment processor reply: {e}")))?;

        Ok(intent.client_secret)
    }
}
