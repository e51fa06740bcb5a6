//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    admin, bookings, credits, health, notes, payments, signaling, teachers, video, webhooks,
};
use crate::state::AppState;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health`, `GET /api/health` - Health check
/// - `GET /ws` - Signaling relay (WebSocket)
///
/// ## Credits (caller identity)
/// - `GET /api/credits` - Balance (creates the user on first call)
/// - `GET /api/credits/transactions` - Transaction history
/// - `POST /api/credits/consume` - Spend credits
/// - `POST /api/credits/add` - Grant credits (admin key)
///
/// ## Video sessions (caller identity)
/// - `POST /api/video/start`, `POST /api/video/:id/end`, `POST /api/video/:id/peer`
/// - `GET /api/video/history`
///
/// ## Payments
/// - `POST /api/pay/create-session` - Start a Stripe checkout
/// - `POST /api/pay/success` - Confirm a paid checkout
/// - `POST /webhooks/stripe` - Stripe webhooks (signature verification)
///
/// ## Catalog
/// - `GET|POST /api/notes`, `POST /api/notes/:id/purchase`
/// - `GET /api/teachers`
/// - `POST /api/bookings`, `POST /api/bookings/:id/status`
///
/// ## Admin (admin key)
/// - `GET /api/admin/stats`
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Credits
        .route("/credits", get(credits::get_balance))
        .route("/credits/transactions", get(credits::list_transactions))
        .route("/credits/consume", post(credits::consume_credits))
        .route("/credits/add", post(credits::admin_add_credits))
        // Video sessions
        .route("/video/start", post(video::start_session))
        .route("/video/history", get(video::history))
        .route("/video/:id/end", post(video::end_session))
        .route("/video/:id/peer", post(video::join_session))
        // Payments
        .route("/pay/create-session", post(payments::create_checkout))
        .route("/pay/success", post(payments::confirm_checkout))
        // Catalog
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route("/notes/:id/purchase", post(notes::purchase_note))
        .route("/teachers", get(teachers::list_teachers))
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/:id/status", post(bookings::update_status))
        // Admin
        .route("/admin/stats", get(admin::stats))
        .route("/health", get(health::health))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // Signaling (long-lived, outside the request timeout)
        .route("/ws", get(signaling::ws_handler))
        .nest("/api", api_routes)
        // Webhooks (no rate limit - controlled by external services)
        .route("/webhooks/stripe", post(webhooks::stripe_webhook))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
