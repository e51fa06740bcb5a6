//! Webhook handlers for Stripe.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use studyhall_core::UserId;

use super::payments::apply_checkout;
use crate::error::ApiError;
use crate::state::AppState;
use crate::stripe::{verify_webhook_signature, CheckoutSession, WebhookEvent};

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was processed.
    pub received: bool,
}

/// Handle Stripe webhooks.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    // Verify signature if webhook_secret is configured
    if let Some(secret) = &state.config.stripe_webhook_secret {
        let signature = headers
            .get("stripe-signature")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::BadRequest("Missing Stripe signature".into()))?;

        verify_webhook_signature(secret, &body, signature, chrono::Utc::now().timestamp())
            .map_err(|e| {
                tracing::warn!(error = %e, "Invalid Stripe webhook signature");
                ApiError::from(e)
            })?;
    } else {
        // No webhook_secret configured - skip verification (development mode)
        tracing::warn!("Stripe webhook_secret not configured - skipping signature verification");
    }

    let event: WebhookEvent =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        event_type = %event.event_type,
        event_id = %event.id,
        "Received Stripe webhook"
    );

    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let checkout: CheckoutSession = serde_json::from_value(event.data.object)
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            handle_checkout_completed(&state, &checkout)?;
        }
        _ => {
            tracing::debug!(event_type = %event.event_type, "Unhandled Stripe event");
        }
    }

    Ok(Json(WebhookResponse { received: true }))
}

fn handle_checkout_completed(state: &AppState, checkout: &CheckoutSession) -> Result<(), ApiError> {
    if !checkout.is_paid() {
        tracing::info!(
            checkout_id = %checkout.id,
            payment_status = ?checkout.payment_status,
            "Checkout session not paid yet, skipping"
        );
        return Ok(());
    }

    let user_id = checkout
        .user_id()
        .and_then(|s| UserId::new(s).ok())
        .ok_or_else(|| ApiError::BadRequest("Checkout session has no user".into()))?;

    apply_checkout(state.store.as_ref(), &user_id, checkout)?;
    Ok(())
}
