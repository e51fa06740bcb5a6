//! Application state.

use std::sync::Arc;

use studyhall_signaling::Relay;
use studyhall_store::{SessionCoordinator, Store};

use crate::config::ServiceConfig;
use crate::stripe::StripeClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Video session lifecycle over `store`.
    pub sessions: SessionCoordinator,

    /// The signaling relay behind `/ws`.
    pub relay: Arc<Relay>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Stripe client for payments (optional).
    pub stripe: Option<Arc<StripeClient>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        // Create Stripe client if configured
        let stripe = config.stripe_api_key.as_ref().map(|key| {
            tracing::info!(base_url = %config.stripe_api_base, "Stripe integration enabled");
            Arc::new(StripeClient::new(key, config.stripe_api_base.clone()))
        });

        if stripe.is_none() {
            tracing::warn!("Stripe not configured - payments will not be available");
        }

        if config.admin_api_key.is_none() {
            tracing::warn!("ADMIN_API_KEY not set - admin endpoints will reject all requests");
        }

        Self {
            sessions: SessionCoordinator::new(Arc::clone(&store)),
            store,
            relay: Arc::new(Relay::new()),
            config,
            stripe,
        }
    }

    /// Check if Stripe is configured.
    #[must_use]
    pub fn has_stripe(&self) -> bool {
        self.stripe.is_some()
    }
}
