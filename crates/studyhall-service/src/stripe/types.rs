//! Stripe API types.

use serde::Deserialize;

/// Stripe Checkout session object.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Session ID.
    pub id: String,
    /// Checkout URL to redirect the user to.
    #[serde(default)]
    pub url: Option<String>,
    /// Payment status ("paid", "unpaid", "no_payment_required").
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Client reference ID (our `userId`).
    #[serde(default)]
    pub client_reference_id: Option<String>,
    /// Metadata set at creation.
    #[serde(default)]
    pub metadata: CheckoutMetadata,
}

impl CheckoutSession {
    /// Whether the customer has paid.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
    }

    /// The purchasing user: metadata first, then the client reference.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.metadata
            .user_id
            .as_deref()
            .or(self.client_reference_id.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// Credits purchased, if recorded and positive.
    #[must_use]
    pub fn credits(&self) -> Option<i64> {
        self.metadata
            .credits
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|c| *c > 0)
    }
}

/// Metadata we attach to checkout sessions. Stripe stores values as strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutMetadata {
    /// The purchasing user.
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
    /// Number of credits purchased.
    #[serde(default)]
    pub credits: Option<String>,
}

/// Stripe webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Event ID.
    pub id: String,
    /// Event type (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event data.
    pub data: WebhookEventData,
}

/// Webhook event data container.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    /// The event object.
    pub object: serde_json::Value,
}

/// Stripe API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    /// Error details.
    pub error: StripeErrorDetail,
}

/// Stripe error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
}
