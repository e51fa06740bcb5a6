//! Stripe integration for credit purchases.

mod client;
mod types;

pub use client::{verify_webhook_signature, StripeClient, StripeError, SIGNATURE_TOLERANCE_SECS};
pub use types::{CheckoutMetadata, CheckoutSession, WebhookEvent, WebhookEventData};
