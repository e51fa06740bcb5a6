//! User account types.
//!
//! A user is created lazily on first reference and carries the credit balance
//! that the ledger guards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Credits granted to a user the first time they are referenced.
pub const DEFAULT_STARTING_CREDITS: i64 = 3;

/// A user known to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Externally issued user ID.
    pub id: UserId,

    /// Current credit balance. Never negative.
    pub credits: i64,

    /// When the user record was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with the given starting balance.
    #[must_use]
    pub fn new(id: UserId, credits: i64) -> Self {
        Self {
            id,
            credits,
            created_at: Utc::now(),
        }
    }

    /// Check if the user can afford a charge of `amount` credits.
    #[must_use]
    pub fn has_sufficient_credits(&self, amount: i64) -> bool {
        self.credits >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sufficient_credits_is_inclusive() {
        let user = User::new(UserId::new("u1").unwrap(), 3);
        assert!(user.has_sufficient_credits(3));
        assert!(!user.has_sufficient_credits(4));
    }
}
