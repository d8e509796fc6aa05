//! HTTP API for the contact relay.

mod extract;
mod handlers;
mod middleware;
mod types;

pub use extract::RelayJson;
pub use handlers::*;
pub use middleware::{logging_middleware, rate_limit_middleware, RateLimitState};
pub use types::*;

use crate::verification::PhoneVerifier;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use mail_client::{Mailbox, Mailer};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// One-time code issuance and verification
    pub verifier: PhoneVerifier,
    /// Mail provider for form submissions
    pub mailer: Arc<dyn Mailer>,
    /// Sender identity for relayed submissions
    pub mail_from: Mailbox,
    /// Where submissions are delivered
    pub inbox: Mailbox,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        verifier: PhoneVerifier,
        mailer: Arc<dyn Mailer>,
        mail_from: Mailbox,
        inbox: Mailbox,
    ) -> Self {
        Self {
            verifier,
            mailer,
            mail_from,
            inbox,
        }
    }
}

/// Create the API router with default rate limiting.
pub fn create_router(state: AppState) -> Router {
    create_router_with_rate_limit(state, RateLimitState::new(30))
}

/// Create the API router with custom rate limiting.
///
/// Only the OTP endpoints are rate limited.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    let otp_routes = Router::new()
        .route("/send-otp", post(handlers::send_otp))
        .route("/verify-otp", post(handlers::verify_otp))
        .route_layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ));

    Router::new()
        // Health and liveness (no rate limiting)
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/keep-alive", get(handlers::keep_alive))
        // Contact form
        .route("/submit-form", post(handlers::submit_form))
        .merge(otp_routes)
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
