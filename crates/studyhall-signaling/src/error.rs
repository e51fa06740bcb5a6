//! Relay errors.
//!
//! None of these reach the client. The connection handler logs them and keeps
//! the connection open.

use studyhall_core::ConnectionId;

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors raised at the relay boundary.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The sender is not a member of the room it addressed.
    #[error("connection {connection} has not joined room {room}")]
    RoomNotJoined {
        /// The sending connection.
        connection: ConnectionId,
        /// The addressed room.
        room: String,
    },

    /// The connection was never registered or already disconnected.
    #[error("unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    /// A client frame could not be decoded.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A client frame named an event the relay does not handle.
    #[error("unknown event: {0}")]
    UnknownEvent(String),
}
