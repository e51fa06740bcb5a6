//! Storage layer for StudyHall.
//!
//! This crate owns the credit ledger, the video session records, and the
//! catalog, behind the [`Store`] trait. The reference implementation,
//! [`MemoryStore`], is memory-resident; a durable backend can replace it
//! without changing callers.
//!
//! # Concurrency
//!
//! Balance mutations (`add_credits`, `consume_credits`) are serialized per
//! user: the balance check and the decrement in `consume_credits` happen under
//! the same per-user lock, so a balance can never be observed or driven below
//! zero. Operations on different users do not block each other.
//!
//! # Example
//!
//! ```
//! use studyhall_core::{CreditMeta, TransactionSource, UserId};
//! use studyhall_store::{MemoryStore, Store};
//!
//! let store = MemoryStore::new(3);
//! let user_id = UserId::new("user-1").unwrap();
//!
//! store.get_or_create_user(&user_id).unwrap();
//! store
//!     .add_credits(&user_id, 10, CreditMeta::from_source(TransactionSource::Admin))
//!     .unwrap();
//! let user = store
//!     .consume_credits(&user_id, 4, TransactionSource::Manual)
//!     .unwrap();
//! assert_eq!(user.credits, 9);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod coordinator;
pub mod error;
pub mod memory;

pub use coordinator::{EndedSession, SessionCoordinator};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;

use serde::Serialize;
use studyhall_core::{
    Booking, BookingId, BookingStatus, CreditMeta, CreditTransaction, Note, NoteId, NoteOrder,
    SessionId, Teacher, TransactionSource, User, UserId, VideoSession,
};

/// Aggregate counters for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    /// Number of video sessions ever started.
    pub total_sessions: usize,
    /// Credits purchased through the payment provider.
    pub total_revenue_credits: i64,
    /// Number of known users.
    pub users: usize,
    /// Number of listed notes.
    pub notes: usize,
    /// Total note downloads.
    pub downloads: u64,
}

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (in-memory for the reference deployment, a database-backed store in production).
pub trait Store: Send + Sync {
    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Get a user, creating it with the default starting balance if absent.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend fails.
    fn get_or_create_user(&self, user_id: &UserId) -> Result<User>;

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn get_user(&self, user_id: &UserId) -> Result<Option<User>>;

    /// Current balance of a user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UserNotFound` if the user was never created.
    fn balance(&self, user_id: &UserId) -> Result<i64> {
        self.get_user(user_id)?
            .map(|user| user.credits)
            .ok_or_else(|| StoreError::UserNotFound {
                user_id: user_id.to_string(),
            })
    }

    /// Add credits and record the transaction atomically.
    ///
    /// The user is created first if absent.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` if `amount <= 0`.
    /// - `StoreError::DuplicateReference` if `meta.external_ref` was already applied.
    fn add_credits(&self, user_id: &UserId, amount: i64, meta: CreditMeta) -> Result<User>;

    /// Deduct credits and record the transaction atomically.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` if `amount <= 0`.
    /// - `StoreError::UserNotFound` if the user was never created.
    /// - `StoreError::InsufficientCredits` if the balance is too low.
    fn consume_credits(
        &self,
        user_id: &UserId,
        amount: i64,
        source: TransactionSource,
    ) -> Result<User>;

    /// Whether an external payment reference has already been applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn has_payment_reference(&self, reference: &str) -> Result<bool>;

    /// List transactions for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::UserNotFound` if the user was never created.
    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditTransaction>>;

    // =========================================================================
    // Video Session Operations
    // =========================================================================

    /// Insert a new session record.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn put_session(&self, session: &VideoSession) -> Result<()>;

    /// Get a session by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn get_session(&self, session_id: &SessionId) -> Result<Option<VideoSession>>;

    /// Transition a session from active to ended, exactly once.
    ///
    /// # Errors
    ///
    /// - `StoreError::SessionNotFound` if the session doesn't exist.
    /// - `StoreError::AlreadyEnded` if the session is already terminal.
    fn end_session(&self, session_id: &SessionId) -> Result<VideoSession>;

    /// Record the second participant of an active session.
    ///
    /// # Errors
    ///
    /// - `StoreError::SessionNotFound` if the session doesn't exist.
    /// - `StoreError::AlreadyEnded` if the session is already terminal.
    fn set_session_peer(&self, session_id: &SessionId, peer: &UserId) -> Result<VideoSession>;

    /// List sessions the user created or joined, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn list_sessions_by_user(&self, user_id: &UserId) -> Result<Vec<VideoSession>>;

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    /// Insert a note.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn put_note(&self, note: &Note) -> Result<()>;

    /// Get a note by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn get_note(&self, note_id: &NoteId) -> Result<Option<Note>>;

    /// List notes, optionally filtered by category.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn list_notes(&self, category: Option<&str>, order: NoteOrder) -> Result<Vec<Note>>;

    /// Increment a note's download counter.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the note doesn't exist.
    fn increment_note_downloads(&self, note_id: &NoteId) -> Result<Note>;

    /// The teacher listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn list_teachers(&self) -> Result<Vec<Teacher>>;

    /// Insert a booking.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn put_booking(&self, booking: &Booking) -> Result<()>;

    /// Update a booking's status.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the booking doesn't exist.
    fn set_booking_status(&self, booking_id: &BookingId, status: BookingStatus)
        -> Result<Booking>;

    /// Aggregate counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn stats(&self) -> Result<StoreStats>;
}
