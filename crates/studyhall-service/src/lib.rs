//! StudyHall HTTP API Service.
//!
//! This crate provides the HTTP and WebSocket API for StudyHall, including:
//!
//! - Credit balance, spending and transaction history
//! - Billable video sessions
//! - Stripe checkout and webhooks
//! - Notes, teachers and bookings
//! - The signaling relay endpoint (`/ws`)
//!
//! # Identity
//!
//! User identity is supplied by the caller as an opaque string, read from the
//! `x-user-id` header, the `userId` query parameter, or the `userId` JSON body
//! field, in that order. Admin endpoints additionally require `x-admin-key`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the router even when the store is not

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod stripe;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
pub use stripe::{StripeClient, StripeError};
