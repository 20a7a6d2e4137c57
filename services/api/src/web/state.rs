//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::auth::TokenIssuer;
use std::sync::Arc;
use studyhub_core::ports::{DatabaseService, PaymentService};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
/// The database pool behind `db` is the one long-lived store connection; no
/// other cross-request state exists.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub payments: Arc<dyn PaymentService>,
    pub tokens: TokenIssuer,
    pub config: Arc<Config>,
}
