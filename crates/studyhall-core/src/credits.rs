//! Credit transaction types.
//!
//! Every change to a user's balance is recorded as a `CreditTransaction`.
//! The log is append-only: a transaction is never modified once written.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{TransactionId, UserId};

/// A credit transaction representing a balance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditTransaction {
    /// Unique transaction ID (ULID for time-ordering).
    pub id: TransactionId,

    /// The user whose balance was affected.
    pub user_id: UserId,

    /// Signed delta. Positive = credit, negative = debit.
    #[serde(rename = "amountCredits")]
    pub amount: i64,

    /// Why the balance changed.
    pub source: TransactionSource,

    /// External payment reference (e.g. a Stripe checkout session ID).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,

    /// Balance after this transaction was applied.
    pub balance_after: i64,

    /// When the transaction was recorded.
    pub created_at: DateTime<Utc>,
}

impl CreditTransaction {
    /// Create a credit (positive delta) transaction.
    #[must_use]
    pub fn credit(user_id: UserId, amount: i64, balance_after: i64, meta: CreditMeta) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount: amount.abs(),
            source: meta.source,
            external_ref: meta.external_ref,
            balance_after,
            created_at: Utc::now(),
        }
    }

    /// Create a debit (negative delta) transaction.
    #[must_use]
    pub fn debit(
        user_id: UserId,
        amount: i64,
        balance_after: i64,
        source: TransactionSource,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount: -amount.abs(), // Always negative for spending
            source,
            external_ref: None,
            balance_after,
            created_at: Utc::now(),
        }
    }
}

/// Metadata attached to a credit addition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditMeta {
    /// Where the credits came from.
    pub source: TransactionSource,

    /// External payment reference used for deduplication.
    #[serde(default)]
    pub external_ref: Option<String>,
}

impl CreditMeta {
    /// Metadata for an addition with no external reference.
    #[must_use]
    pub const fn from_source(source: TransactionSource) -> Self {
        Self {
            source,
            external_ref: None,
        }
    }

    /// Metadata for a confirmed external payment.
    #[must_use]
    pub fn payment(external_ref: impl Into<String>) -> Self {
        Self {
            source: TransactionSource::Stripe,
            external_ref: Some(external_ref.into()),
        }
    }
}

/// Source tag of a credit transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSource {
    /// Credits purchased through the payment provider.
    Stripe,

    /// Credits granted by an administrator.
    Admin,

    /// Credits granted by the system (e.g. the starting balance).
    System,

    /// Credits spent on a note download.
    NotePurchase,

    /// Credits spent on a teacher booking.
    TeacherBooking,

    /// Credits spent on a video session.
    VideoSession,

    /// Credits spent through the generic consume endpoint.
    Manual,
}

impl TransactionSource {
    /// Get the source tag as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stripe => "stripe",
            Self::Admin => "admin",
            Self::System => "system",
            Self::NotePurchase => "note_purchase",
            Self::TeacherBooking => "teacher_booking",
            Self::VideoSession => "video_session",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for TransactionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchasable bundle of credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditPackage {
    /// Package key used by clients (`small`, `medium`, `large`).
    pub key: &'static str,
    /// Credits granted.
    pub credits: i64,
    /// Price in US cents.
    pub amount_cents: i64,
    /// Display name on the checkout page.
    pub name: &'static str,
}

/// The credit packages on sale.
pub const CREDIT_PACKAGES: [CreditPackage; 3] = [
    CreditPackage {
        key: "small",
        credits: 10,
        amount_cents: 500,
        name: "10 Credits",
    },
    CreditPackage {
        key: "medium",
        credits: 25,
        amount_cents: 1000,
        name: "25 Credits",
    },
    CreditPackage {
        key: "large",
        credits: 50,
        amount_cents: 1800,
        name: "50 Credits",
    },
];

impl CreditPackage {
    /// Look up a package by key.
    #[must_use]
    pub fn find(key: &str) -> Option<&'static Self> {
        CREDIT_PACKAGES.iter().find(|p| p.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("u1").unwrap()
    }

    #[test]
    fn debit_is_negative() {
        let tx = CreditTransaction::debit(user(), 5, 0, TransactionSource::VideoSession);
        assert_eq!(tx.amount, -5);
        assert!(tx.external_ref.is_none());
    }

    #[test]
    fn credit_carries_payment_reference() {
        let tx = CreditTransaction::credit(user(), 10, 13, CreditMeta::payment("cs_test_1"));
        assert_eq!(tx.amount, 10);
        assert_eq!(tx.source, TransactionSource::Stripe);
        assert_eq!(tx.external_ref.as_deref(), Some("cs_test_1"));
    }

    #[test]
    fn packages_are_found_by_key() {
        let medium = CreditPackage::find("medium").unwrap();
        assert_eq!(medium.credits, 25);
        assert_eq!(medium.amount_cents, 1000);
        assert!(CreditPackage::find("huge").is_none());
    }

    #[test]
    fn source_serializes_as_snake_case() {
        let json = serde_json::to_string(&TransactionSource::TeacherBooking).unwrap();
        assert_eq!(json, "\"teacher_booking\"");
        assert_eq!(TransactionSource::NotePurchase.to_string(), "note_purchase");
    }
}
