//! Video session types.
//!
//! A video session is billable: its cost is fixed when it starts and charged
//! once when it ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{SessionId, UserId};

/// Video session cost in the reference deployment.
pub const DEFAULT_VIDEO_SESSION_COST: i64 = 1;

/// A billable real-time session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSession {
    /// Session ID, also used as the signaling room ID by convention.
    pub id: SessionId,

    /// The user who started the session.
    pub creator_user_id: UserId,

    /// The second identified participant, once recorded.
    #[serde(default)]
    pub peer_user_id: Option<UserId>,

    /// When the session started.
    pub started_at: DateTime<Utc>,

    /// When the session ended. Presence means the session is terminal.
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,

    /// Cost in credits, fixed at creation.
    pub cost_credits: i64,
}

impl VideoSession {
    /// Create a new active session.
    #[must_use]
    pub fn new(creator_user_id: UserId, cost_credits: i64) -> Self {
        Self {
            id: SessionId::generate(),
            creator_user_id,
            peer_user_id: None,
            started_at: Utc::now(),
            ended_at: None,
            cost_credits,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        if self.ended_at.is_some() {
            SessionState::Ended
        } else {
            SessionState::Active
        }
    }

    /// Whether `user_id` took part in this session.
    #[must_use]
    pub fn involves(&self, user_id: &UserId) -> bool {
        &self.creator_user_id == user_id || self.peer_user_id.as_ref() == Some(user_id)
    }
}

/// Lifecycle state of a video session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Started and not yet ended.
    Active,
    /// Ended; terminal.
    Ended,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_active() {
        let session = VideoSession::new(UserId::new("u1").unwrap(), 1);
        assert_eq!(session.state(), SessionState::Active);
        assert!(session.peer_user_id.is_none());
    }

    #[test]
    fn ended_at_makes_session_terminal() {
        let mut session = VideoSession::new(UserId::new("u1").unwrap(), 1);
        session.ended_at = Some(Utc::now());
        assert_eq!(session.state(), SessionState::Ended);
    }

    #[test]
    fn involves_creator_and_peer() {
        let creator = UserId::new("u1").unwrap();
        let peer = UserId::new("u2").unwrap();
        let mut session = VideoSession::new(creator.clone(), 1);
        assert!(session.involves(&creator));
        assert!(!session.involves(&peer));

        session.peer_user_id = Some(peer.clone());
        assert!(session.involves(&peer));
    }
}
