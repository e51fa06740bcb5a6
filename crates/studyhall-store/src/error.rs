//! Error types for StudyHall storage.

use studyhall_core::VideoSession;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in ledger, session, and catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend failure in a durable implementation.
    #[error("database error: {0}")]
    Database(String),

    /// Credit amounts must be strictly positive.
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    /// The user has never been referenced.
    #[error("user not found: {user_id}")]
    UserNotFound {
        /// The user ID that was not found.
        user_id: String,
    },

    /// Insufficient credits for a deduction.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// The external payment reference was already applied.
    #[error("duplicate payment reference: {reference}")]
    DuplicateReference {
        /// The repeated reference.
        reference: String,
    },

    /// No video session with this ID.
    #[error("session not found: {session_id}")]
    SessionNotFound {
        /// The session ID that was not found.
        session_id: String,
    },

    /// The video session is already terminal.
    #[error("session already ended: {session_id}")]
    AlreadyEnded {
        /// The session ID.
        session_id: String,
    },

    /// The session was ended but charging the payer failed.
    ///
    /// Ending is not rolled back; `session` is the ended session.
    #[error("session {} ended but charge failed: {source}", .session.id)]
    ChargeFailed {
        /// The ended session.
        session: Box<VideoSession>,
        /// The ledger rejection.
        #[source]
        source: Box<StoreError>,
    },

    /// Catalog record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
        /// Record ID.
        id: String,
    },
}
