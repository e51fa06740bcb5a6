//! Signaling relay for StudyHall.
//!
//! A neutral, room-scoped relay for the offers, answers and network
//! candidates two peers exchange to set up a direct media link. The relay
//! never interprets negotiation payloads; it only decides who receives them.
//!
//! - `join`: announce `peer-joined` to the other members (no backfill).
//! - `signal`: forward to every member except the sender, tagged with `from`.
//! - `leave`: announce `peer-left`; empty rooms are discarded.
//! - `disconnect`: leave every room, then drop the outbound channel.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod messages;
pub mod relay;

pub use error::{RelayError, Result};
pub use messages::{ClientMessage, ServerMessage, SignalPayload};
pub use relay::{Outbound, Relay};
