//! Video session lifecycle.
//!
//! Starting a session does not touch the ledger. Ending it transitions the
//! session exactly once and then charges the payer the cost fixed at start.

use std::sync::Arc;

use studyhall_core::{SessionId, TransactionSource, User, UserId, VideoSession};

use crate::error::{Result, StoreError};
use crate::Store;

/// Coordinates video sessions against the credit ledger.
#[derive(Clone)]
pub struct SessionCoordinator {
    store: Arc<dyn Store>,
}

/// An ended and charged session.
#[derive(Debug, Clone)]
pub struct EndedSession {
    /// The session after the transition.
    pub session: VideoSession,
    /// The payer after the charge.
    pub payer: User,
}

impl SessionCoordinator {
    /// Create a coordinator over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Start a new active session for `creator` costing `cost_credits`.
    ///
    /// The creator is created in the ledger if absent, so the later charge has
    /// an account to draw from. No credits move here.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` if `cost_credits` is negative.
    pub fn start(&self, creator: &UserId, cost_credits: i64) -> Result<VideoSession> {
        if cost_credits < 0 {
            return Err(StoreError::InvalidAmount(cost_credits));
        }
        self.store.get_or_create_user(creator)?;

        let session = VideoSession::new(creator.clone(), cost_credits);
        self.store.put_session(&session)?;

        tracing::info!(
            session_id = %session.id,
            user_id = %creator,
            cost = %session.cost_credits,
            "Video session started"
        );

        Ok(session)
    }

    /// End a session and charge `payer`.
    ///
    /// Of any number of concurrent calls for the same session, exactly one
    /// performs the transition and the charge.
    ///
    /// # Errors
    ///
    /// - `StoreError::SessionNotFound` if the session doesn't exist.
    /// - `StoreError::AlreadyEnded` if another call already ended it.
    /// - `StoreError::ChargeFailed` if the session ended but the ledger
    ///   rejected the charge. The session stays ended.
    pub fn end(&self, session_id: &SessionId, payer: &UserId) -> Result<EndedSession> {
        let session = self.store.end_session(session_id)?;

        let charged = if session.cost_credits > 0 {
            self.store
                .consume_credits(payer, session.cost_credits, TransactionSource::VideoSession)
        } else {
            self.store.get_or_create_user(payer)
        };

        match charged {
            Ok(payer) => {
                tracing::info!(
                    session_id = %session.id,
                    user_id = %payer.id,
                    cost = %session.cost_credits,
                    balance = %payer.credits,
                    "Video session ended"
                );
                Ok(EndedSession { session, payer })
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %session.id,
                    user_id = %payer,
                    error = %e,
                    "Video session ended without charge"
                );
                Err(StoreError::ChargeFailed {
                    session: Box::new(session),
                    source: Box::new(e),
                })
            }
        }
    }

    /// Record `peer` as the second participant of an active session.
    ///
    /// The peer is created in the ledger if absent.
    ///
    /// # Errors
    ///
    /// - `StoreError::SessionNotFound` if the session doesn't exist.
    /// - `StoreError::AlreadyEnded` if the session is terminal.
    pub fn record_peer(&self, session_id: &SessionId, peer: &UserId) -> Result<VideoSession> {
        self.store.get_or_create_user(peer)?;
        let session = self.store.set_session_peer(session_id, peer)?;
        tracing::debug!(session_id = %session_id, peer = %peer, "Session peer recorded");
        Ok(session)
    }

    /// Sessions the user created or joined, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn list(&self, user_id: &UserId) -> Result<Vec<VideoSession>> {
        self.store.list_sessions_by_user(user_id)
    }

    /// Get a session by ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SessionNotFound` if the session doesn't exist.
    pub fn get(&self, session_id: &SessionId) -> Result<VideoSession> {
        self.store
            .get_session(session_id)?
            .ok_or_else(|| StoreError::SessionNotFound {
                session_id: session_id.to_string(),
            })
    }
}
