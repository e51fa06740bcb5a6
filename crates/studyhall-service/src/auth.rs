//! Request identity extractors.
//!
//! This module provides extractors for:
//! - `Caller` - the user identity from the `x-user-id` header or `userId` query
//! - `CallerJson` - the same, falling back to a `userId` field in the JSON body
//! - `AdminAuth` - admin authentication for privileged endpoints
//!
//! The identity is an opaque, externally issued string. The first non-blank
//! source wins.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use studyhall_core::UserId;

use crate::error::ApiError;
use crate::state::AppState;

const USER_ID_HEADER: &str = "x-user-id";
const USER_ID_FIELD: &str = "userId";

/// The calling user, taken from the header or query string.
#[derive(Debug, Clone)]
pub struct Caller(pub UserId);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from_parts(parts)?
            .map(Caller)
            .ok_or(ApiError::MissingUserId)
    }
}

/// The calling user plus a JSON body.
///
/// The identity falls back to the body's `userId` field when neither the
/// header nor the query carries one. An empty body is read as `{}`.
#[derive(Debug, Clone)]
pub struct CallerJson<T>(pub UserId, pub T);

#[derive(Deserialize)]
struct BodyIdentity {
    #[serde(default, rename = "userId")]
    user_id: Option<String>,
}

#[async_trait]
impl<S, T> FromRequest<S> for CallerJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let from_parts = identity_from_parts(&parts)?;

        let req = Request::from_parts(parts, body);
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let bytes: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"{}"
        } else {
            &bytes
        };

        let value: T = serde_json::from_slice(bytes)
            .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?;

        let user_id = match from_parts {
            Some(id) => id,
            None => serde_json::from_slice::<BodyIdentity>(bytes)
                .ok()
                .and_then(|b| b.user_id)
                .and_then(|s| UserId::new(s).ok())
                .ok_or(ApiError::MissingUserId)?,
        };

        Ok(CallerJson(user_id, value))
    }
}

fn identity_from_parts(parts: &Parts) -> Result<Option<UserId>, ApiError> {
    let from_header = parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| UserId::new(s).ok());
    if from_header.is_some() {
        return Ok(from_header);
    }

    let Query(query) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(query
        .get(USER_ID_FIELD)
        .and_then(|s| UserId::new(s.as_str()).ok()))
}

/// Admin authentication via API key.
///
/// Requires the `x-admin-key` header to match the configured admin key.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    /// Admin identifier (for audit logging).
    pub admin_id: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Check for X-Admin-Key header
        let admin_key = parts
            .headers
            .get("x-admin-key")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        // Validate against configured admin API key
        let expected_key = state
            .config
            .admin_api_key
            .as_ref()
            .ok_or(ApiError::Unauthorized)?;

        if !crate::crypto::constant_time_eq(admin_key, expected_key) {
            return Err(ApiError::Unauthorized);
        }

        // Extract admin identifier from header if provided
        let admin_id = parts
            .headers
            .get("x-admin-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("admin")
            .to_string();

        tracing::info!(admin_id = %admin_id, "Admin authenticated");

        Ok(AdminAuth { admin_id })
    }
}
