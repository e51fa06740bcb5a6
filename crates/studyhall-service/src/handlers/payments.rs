//! Credit purchase handlers (Stripe Checkout).
//!
//! A purchase is applied at most once per checkout session: the session ID is
//! the payment reference the ledger deduplicates on, whether the purchase is
//! confirmed by the browser redirect or by the webhook.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use studyhall_core::{CreditMeta, CreditPackage, User, UserId};
use studyhall_store::{Store, StoreError};

use crate::auth::CallerJson;
use crate::error::ApiError;
use crate::state::AppState;
use crate::stripe::{CheckoutSession, StripeClient};

/// Create checkout request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    /// `small`, `medium` or `large`.
    #[serde(default)]
    pub package_key: String,
}

/// Create checkout response.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Checkout session ID.
    pub id: String,
    /// Hosted checkout page.
    pub url: Option<String>,
}

fn stripe_client(state: &AppState) -> Result<&StripeClient, ApiError> {
    state
        .stripe
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("Stripe is not configured".into()))
}

/// Start a checkout for a credit package.
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    CallerJson(user_id, request): CallerJson<CreateCheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let stripe = stripe_client(&state)?;
    let package = CreditPackage::find(&request.package_key).ok_or_else(|| {
        ApiError::BadRequest(format!("unknown package: {}", request.package_key))
    })?;

    let origin = state.config.client_origin.trim_end_matches('/');
    let success_url =
        format!("{origin}/buy-credits?success=true&session_id={{CHECKOUT_SESSION_ID}}");
    let cancel_url = format!("{origin}/buy-credits?canceled=true");

    let checkout = stripe
        .create_checkout_session(&user_id, package, &success_url, &cancel_url)
        .await?;

    tracing::info!(
        user_id = %user_id,
        package = %package.key,
        checkout_id = %checkout.id,
        "Checkout session created"
    );

    Ok(Json(CheckoutResponse {
        id: checkout.id,
        url: checkout.url,
    }))
}

/// Confirm checkout request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmCheckoutRequest {
    /// Checkout session ID from the success redirect.
    #[serde(default)]
    pub session_id: String,
}

/// Confirm checkout response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmCheckoutResponse {
    /// Always true on success.
    pub ok: bool,
    /// Balance after the purchase.
    pub credits: i64,
    /// The purchase had already been applied (e.g. by the webhook).
    pub already_applied: bool,
}

/// Confirm a paid checkout and credit the caller.
pub async fn confirm_checkout(
    State(state): State<Arc<AppState>>,
    CallerJson(user_id, request): CallerJson<ConfirmCheckoutRequest>,
) -> Result<Json<ConfirmCheckoutResponse>, ApiError> {
    let stripe = stripe_client(&state)?;
    let checkout_id = request.session_id.trim();
    if checkout_id.is_empty() {
        return Err(ApiError::BadRequest("sessionId is required".into()));
    }

    // Already applied (by an earlier confirmation or the webhook): no credits
    // move, so the Stripe round-trip is skipped.
    if state.store.has_payment_reference(checkout_id)? {
        let user = state.store.get_or_create_user(&user_id)?;
        tracing::info!(user_id = %user_id, checkout_id = %checkout_id, "Checkout already applied");
        return Ok(Json(ConfirmCheckoutResponse {
            ok: true,
            credits: user.credits,
            already_applied: true,
        }));
    }

    let checkout = stripe.get_checkout_session(checkout_id).await?;
    let Some(owner) = checkout.user_id() else {
        tracing::warn!(checkout_id = %checkout_id, "Checkout session has no user");
        return Err(ApiError::BadRequest("checkout session has no user".into()));
    };
    if owner != user_id.as_str() {
        tracing::warn!(
            user_id = %user_id,
            owner = %owner,
            checkout_id = %checkout_id,
            "Checkout confirmation by another user"
        );
        return Err(ApiError::BadRequest(
            "checkout session belongs to another user".into(),
        ));
    }

    let (user, applied) = apply_checkout(state.store.as_ref(), &user_id, &checkout)?;

    Ok(Json(ConfirmCheckoutResponse {
        ok: true,
        credits: user.credits,
        already_applied: !applied,
    }))
}

/// Credit `user_id` for a paid checkout session.
///
/// Returns the user and whether this call applied the credits. A session that
/// was already applied is not an error.
pub(crate) fn apply_checkout(
    store: &dyn Store,
    user_id: &UserId,
    checkout: &CheckoutSession,
) -> Result<(User, bool), ApiError> {
    if !checkout.is_paid() {
        tracing::warn!(
            checkout_id = %checkout.id,
            payment_status = ?checkout.payment_status,
            "Checkout session not paid"
        );
        return Err(ApiError::BadRequest("checkout session is not paid".into()));
    }

    let credits = checkout
        .credits()
        .ok_or_else(|| ApiError::BadRequest("checkout session carries no credits".into()))?;

    match store.add_credits(user_id, credits, CreditMeta::payment(checkout.id.as_str())) {
        Ok(user) => {
            tracing::info!(
                user_id = %user_id,
                checkout_id = %checkout.id,
                credits = %credits,
                balance = %user.credits,
                "Checkout applied"
            );
            Ok((user, true))
        }
        Err(StoreError::DuplicateReference { .. }) => {
            tracing::info!(checkout_id = %checkout.id, "Checkout already applied");
            Ok((store.get_or_create_user(user_id)?, false))
        }
        Err(e) => Err(e.into()),
    }
}
