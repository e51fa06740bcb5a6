//! Core types and utilities for StudyHall.
//!
//! This crate provides the foundational types used throughout the platform:
//!
//! - **Identifiers**: `UserId`, `TransactionId`, `SessionId`, `NoteId`, `BookingId`, `ConnectionId`
//! - **Accounts**: `User`
//! - **Credits**: `CreditTransaction`, `TransactionSource`, `CreditMeta`, `CreditPackage`
//! - **Sessions**: `VideoSession`, `SessionState`
//! - **Catalog**: `Note`, `Teacher`, `Booking`
//!
//! # Credit Unit
//!
//! One credit is one billable action: a note download, an hour of a teacher's
//! time, or one video session. Balances are stored as `i64` and never go
//! negative.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod catalog;
pub mod credits;
pub mod ids;
pub mod session;

pub use account::{User, DEFAULT_STARTING_CREDITS};
pub use catalog::{
    seed_teachers, Booking, BookingStatus, NewNote, Note, NoteOrder, Teacher,
    NOTE_PURCHASE_CREDITS,
};
pub use credits::{
    CreditMeta, CreditPackage, CreditTransaction, TransactionSource, CREDIT_PACKAGES,
};
pub use ids::{BookingId, ConnectionId, IdError, NoteId, SessionId, TransactionId, UserId};
pub use session::{SessionState, VideoSession, DEFAULT_VIDEO_SESSION_COST};
