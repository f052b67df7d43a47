//! Router configuration for the ticketmarket server.
//!
//! Builds the complete Axum router with all endpoints.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{events, payments, resale, verify};
use axum::{
    routing::{get, post},
    Router,
};

/// Build the complete Axum router.
///
/// Configures all routes:
/// - Health checks
/// - Event management and availability
/// - Identity verification
/// - Payment initiation and confirmation
/// - Resale listings
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Event management
        .route("/events", post(events::create_event))
        .route("/events", get(events::list_events))
        .route("/events/:id", get(events::get_event))
        .route("/events/:id/availability", get(events::get_availability))
        // Identity verification
        .route("/verify", post(verify::verify_identity))
        // Payments
        .route("/payments/initiate", post(payments::initiate_payment))
        .route("/payments/confirm", post(payments::confirm_payment))
        // Resale marketplace
        .route("/resale", post(resale::create_listing))
        .route("/resale", get(resale::list_listings));

    Router::new()
        // Health checks (no session required)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // API routes under /api prefix
        .nest("/api", api_routes)
        .with_state(state)
}
