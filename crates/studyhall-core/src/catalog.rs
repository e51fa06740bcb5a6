//! Catalog types: notes, teacher listings and bookings.
//!
//! These are plain records. The only catalog flows that touch credits are
//! note purchases and booking creation, which charge through the ledger.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BookingId, NoteId, UserId};

/// Price of a note download in credits.
pub const NOTE_PURCHASE_CREDITS: i64 = 1;

/// A study note offered on the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Note ID.
    pub id: NoteId,
    /// The uploader.
    pub owner_user_id: UserId,
    /// Title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Category used for filtering.
    pub category: String,
    /// Listed price in credits.
    pub price_credits: i64,
    /// Path of the uploaded document in the blob store.
    pub storage_path: String,
    /// Number of purchases.
    pub downloads: u64,
    /// Average rating.
    pub rating: f64,
    /// When the note was listed.
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when listing a new note.
#[derive(Debug, Clone, Deserialize)]
pub struct NewNote {
    /// The uploader.
    pub owner_user_id: UserId,
    /// Title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Category.
    pub category: String,
    /// Listed price in credits.
    pub price_credits: i64,
    /// Path of the uploaded document.
    pub storage_path: String,
}

impl Note {
    /// Create a note from its listing fields.
    #[must_use]
    pub fn new(input: NewNote) -> Self {
        Self {
            id: NoteId::generate(),
            owner_user_id: input.owner_user_id,
            title: input.title,
            description: input.description,
            category: input.category,
            price_credits: input.price_credits,
            storage_path: input.storage_path,
            downloads: 0,
            rating: 0.0,
            created_at: Utc::now(),
        }
    }
}

/// Sort order for note listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteOrder {
    /// Most downloaded first.
    Popular,
    /// Newest first.
    #[default]
    Latest,
}

/// A teacher available for booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    /// Teacher ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Subjects taught.
    pub subjects: Vec<String>,
    /// Hourly price in credits.
    pub hourly_credits: i64,
    /// Years of experience.
    pub experience_years: u32,
    /// Average rating.
    pub rating: f64,
}

/// The teacher listing seeded into a fresh store.
#[must_use]
pub fn seed_teachers() -> Vec<Teacher> {
    vec![
        Teacher {
            id: "t1".into(),
            name: "Ayşe Öğretmen".into(),
            subjects: vec!["Matematik".into(), "Fizik".into()],
            hourly_credits: 5,
            experience_years: 6,
            rating: 4.7,
        },
        Teacher {
            id: "t2".into(),
            name: "Mehmet Hoca".into(),
            subjects: vec!["Kimya".into(), "Biyoloji".into()],
            hourly_credits: 4,
            experience_years: 4,
            rating: 4.5,
        },
    ]
}

/// A booking of a teacher's time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Booking ID.
    pub id: BookingId,
    /// The booked teacher.
    pub teacher_id: String,
    /// The student who booked.
    pub user_id: UserId,
    /// Start of the slot (RFC 3339).
    #[serde(rename = "startIso")]
    pub start: DateTime<Utc>,
    /// End of the slot (RFC 3339).
    #[serde(rename = "endIso")]
    pub end: DateTime<Utc>,
    /// Review status.
    pub status: BookingStatus,
    /// When the booking was made.
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Create a pending booking.
    #[must_use]
    pub fn new(teacher_id: String, user_id: UserId, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: BookingId::generate(),
            teacher_id,
            user_id,
            start,
            end,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Review status of a booking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Awaiting the teacher's decision.
    #[default]
    Pending,
    /// Accepted by the teacher.
    Approved,
    /// Declined by the teacher.
    Rejected,
    /// Cancelled by the student.
    Cancelled,
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_note_starts_without_downloads() {
        let note = Note::new(NewNote {
            owner_user_id: UserId::new("u1").unwrap(),
            title: "Limits".into(),
            description: String::new(),
            category: "math".into(),
            price_credits: 1,
            storage_path: "notes/u1/limits.pdf".into(),
        });
        assert_eq!(note.downloads, 0);
    }

    #[test]
    fn booking_status_parses_known_values() {
        assert_eq!("approved".parse::<BookingStatus>(), Ok(BookingStatus::Approved));
        assert!("archived".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn seeded_teachers_have_prices() {
        let teachers = seed_teachers();
        assert_eq!(teachers.len(), 2);
        assert!(teachers.iter().all(|t| t.hourly_credits > 0));
    }

    #[test]
    fn entities_serialize_camel_case() {
        let teacher = serde_json::to_value(&seed_teachers()[0]).unwrap();
        assert_eq!(teacher["hourlyCredits"], 5);
        assert_eq!(teacher["experienceYears"], 6);

        let start = "2026-11-01T10:00:00Z".parse().unwrap();
        let end = "2026-11-01T11:00:00Z".parse().unwrap();
        let booking = Booking::new("t1".into(), UserId::new("u1").unwrap(), start, end);
        let json = serde_json::to_value(&booking).unwrap();
        assert_eq!(json["teacherId"], "t1");
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["startIso"], "2026-11-01T10:00:00Z");
        assert_eq!(json["endIso"], "2026-11-01T11:00:00Z");
        assert_eq!(json["status"], "pending");
        assert!(json.get("start").is_none());
    }
}
