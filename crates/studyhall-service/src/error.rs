//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use studyhall_core::VideoSession;
use studyhall_store::StoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid admin key.
    #[error("unauthorized")]
    Unauthorized,

    /// No user identity on the request.
    #[error("missing user id")]
    MissingUserId,

    /// Credit amounts must be strictly positive.
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The session is already ended.
    #[error("already ended: {0}")]
    AlreadyEnded(String),

    /// The payment reference was already applied.
    #[error("duplicate payment reference: {0}")]
    DuplicateReference(String),

    /// Insufficient credits.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// The session ended but the charge was rejected.
    #[error("session ended but charge failed: {source}")]
    ChargeFailed {
        /// The ended session.
        session: Box<VideoSession>,
        /// The rejection, as an API error.
        source: Box<ApiError>,
    },

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::MissingUserId => (
                StatusCode::BAD_REQUEST,
                "missing_user_id",
                "A user id is required (x-user-id header, userId query or body field)".into(),
                None,
            ),
            Self::InvalidAmount(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_amount",
                self.to_string(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::AlreadyEnded(id) => (
                StatusCode::CONFLICT,
                "already_ended",
                format!("Session {id} already ended"),
                None,
            ),
            Self::DuplicateReference(reference) => (
                StatusCode::CONFLICT,
                "duplicate_reference",
                format!("Payment {reference} already applied"),
                None,
            ),
            Self::InsufficientCredits { balance, required } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_credits",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::ChargeFailed { session, source } => {
                let (status, code, message, details) = source.parts();
                let mut details = match details {
                    Some(serde_json::Value::Object(map)) => map,
                    _ => serde_json::Map::new(),
                };
                details.insert("session".into(), serde_json::json!(session));
                (status, code, message, Some(details.into()))
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            Self::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                "external_service_error",
                msg.clone(),
                None,
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidAmount(amount) => Self::InvalidAmount(amount),
            StoreError::UserNotFound { user_id } => {
                Self::NotFound(format!("user not found: {user_id}"))
            }
            StoreError::InsufficientCredits { balance, required } => {
                Self::InsufficientCredits { balance, required }
            }
            StoreError::DuplicateReference { reference } => Self::DuplicateReference(reference),
            StoreError::SessionNotFound { session_id } => {
                Self::NotFound(format!("session not found: {session_id}"))
            }
            StoreError::AlreadyEnded { session_id } => Self::AlreadyEnded(session_id),
            StoreError::ChargeFailed { session, source } => Self::ChargeFailed {
                session,
                source: Box::new(Self::from(*source)),
            },
            StoreError::NotFound { entity, id } => {
                Self::NotFound(format!("{entity} not found: {id}"))
            }
            StoreError::Database(msg) => Self::Internal(msg),
        }
    }
}

impl From<crate::stripe::StripeError> for ApiError {
    fn from(err: crate::stripe::StripeError) -> Self {
        use crate::stripe::StripeError;

        match err {
            StripeError::Api { message, .. } => Self::ExternalService(message),
            StripeError::Http(e) => Self::ExternalService(e.to_string()),
            StripeError::InvalidSignature | StripeError::MalformedSignature(_) => {
                Self::BadRequest("Invalid webhook signature".into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyhall_core::UserId;

    #[test]
    fn store_errors_map_to_statuses() {
        let cases = [
            (StoreError::InvalidAmount(0), StatusCode::BAD_REQUEST),
            (
                StoreError::InsufficientCredits {
                    balance: 3,
                    required: 5,
                },
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                StoreError::SessionNotFound {
                    session_id: "s".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                StoreError::AlreadyEnded {
                    session_id: "s".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                StoreError::DuplicateReference {
                    reference: "cs_1".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                StoreError::Database("lock poisoned".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn charge_failure_keeps_inner_status_and_session() {
        let session = VideoSession::new(UserId::new("u1").unwrap(), 1);
        let err = ApiError::from(StoreError::ChargeFailed {
            session: Box::new(session.clone()),
            source: Box::new(StoreError::InsufficientCredits {
                balance: 0,
                required: 1,
            }),
        });

        let (status, code, _, details) = err.parts();
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(code, "insufficient_credits");
        let details = details.unwrap();
        assert_eq!(details["session"]["id"], session.id.to_string());
        assert_eq!(details["required"], 1);
    }
}
