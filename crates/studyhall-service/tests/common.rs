//! Common test utilities for studyhall integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use axum_test::TestServer;

use studyhall_service::{create_router, AppState, ServiceConfig};
use studyhall_store::MemoryStore;

/// Admin key configured on every test server.
pub const ADMIN_KEY: &str = "test-admin-key";

/// Webhook secret configured on every test server.
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
}

impl TestHarness {
    /// Create a harness without a Stripe API key.
    pub fn new() -> Self {
        Self::with_config(base_config())
    }

    /// Create a harness whose Stripe client talks to `stripe_api_base`.
    pub fn with_stripe(stripe_api_base: impl Into<String>) -> Self {
        Self::with_config(ServiceConfig {
            stripe_api_key: Some("sk_test_123".into()),
            stripe_api_base: stripe_api_base.into(),
            ..base_config()
        })
    }

    fn with_config(config: ServiceConfig) -> Self {
        let store = MemoryStore::new(config.starting_credits);
        let state = AppState::new(Arc::new(store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn base_config() -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        admin_api_key: Some(ADMIN_KEY.into()),
        stripe_webhook_secret: Some(WEBHOOK_SECRET.into()),
        client_origin: "http://localhost:5173".into(),
        max_body_bytes: 1024 * 1024,
        ..ServiceConfig::default()
    }
}

/// The `x-user-id` header for `user`.
pub fn user_header(user: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(user).expect("valid header value"),
    )
}

/// The `x-admin-key` header with the configured key.
pub fn admin_header() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-admin-key"),
        HeaderValue::from_static(ADMIN_KEY),
    )
}
