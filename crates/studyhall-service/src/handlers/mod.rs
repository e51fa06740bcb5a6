//! HTTP request handlers.

pub mod admin;
pub mod bookings;
pub mod credits;
pub mod health;
pub mod notes;
pub mod payments;
pub mod signaling;
pub mod teachers;
pub mod video;
pub mod webhooks;

use serde::Deserialize;

/// Body for endpoints that only need the caller's identity.
#[derive(Debug, Default, Deserialize)]
pub struct NoBody {}
