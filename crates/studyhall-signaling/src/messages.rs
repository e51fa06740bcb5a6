//! Signaling frames.
//!
//! Frames are JSON text of the form `{"event": ..., "data": ...}`. Client
//! frames are decoded in two steps: the envelope first, then `data` according
//! to the event name. Negotiation payloads (`description`, `candidate`) are
//! kept as raw JSON and forwarded byte-for-byte.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use studyhall_core::ConnectionId;

use crate::error::{RelayError, Result};

/// A frame received from a client.
#[derive(Debug, Clone)]
pub enum ClientMessage {
    /// `join-room`: data is the room ID.
    JoinRoom(String),
    /// `signal`: forward a negotiation payload to the rest of the room.
    Signal(SignalPayload),
    /// `leave-room`: data is the room ID.
    LeaveRoom(String),
}

/// Data of a client `signal` frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalPayload {
    /// The addressed room.
    pub room_id: String,
    /// Session description (offer or answer), opaque to the relay.
    #[serde(default)]
    pub description: Option<Box<RawValue>>,
    /// Network candidate hint, opaque to the relay.
    #[serde(default)]
    pub candidate: Option<Box<RawValue>>,
}

#[derive(Deserialize)]
struct Envelope<'a> {
    event: String,
    #[serde(borrow)]
    data: &'a RawValue,
}

impl ClientMessage {
    /// Decode a client text frame.
    ///
    /// # Errors
    ///
    /// - `RelayError::Malformed` if the frame or its data is not valid.
    /// - `RelayError::UnknownEvent` if the event name is not handled.
    pub fn parse(text: &str) -> Result<Self> {
        let envelope: Envelope<'_> = serde_json::from_str(text)?;
        let data = envelope.data.get();

        match envelope.event.as_str() {
            "join-room" => Ok(Self::JoinRoom(serde_json::from_str(data)?)),
            "signal" => Ok(Self::Signal(serde_json::from_str(data)?)),
            "leave-room" => Ok(Self::LeaveRoom(serde_json::from_str(data)?)),
            _ => Err(RelayError::UnknownEvent(envelope.event)),
        }
    }
}

/// A frame sent to a client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Another connection joined a room this client is in.
    PeerJoined(ConnectionId),
    /// Another connection left a room this client is in.
    PeerLeft(ConnectionId),
    /// A negotiation payload from another member.
    Signal {
        /// The sending connection.
        from: ConnectionId,
        /// Forwarded verbatim.
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<Box<RawValue>>,
        /// Forwarded verbatim.
        #[serde(skip_serializing_if = "Option::is_none")]
        candidate: Option<Box<RawValue>>,
    },
}

impl ServerMessage {
    /// Encode as a text frame.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Malformed` if serialization fails.
    pub fn to_text(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_join_and_leave() {
        let join = ClientMessage::parse(r#"{"event":"join-room","data":"room1"}"#).unwrap();
        assert!(matches!(join, ClientMessage::JoinRoom(ref r) if r == "room1"));

        let leave = ClientMessage::parse(r#"{"event":"leave-room","data":"room1"}"#).unwrap();
        assert!(matches!(leave, ClientMessage::LeaveRoom(ref r) if r == "room1"));
    }

    #[test]
    fn signal_payload_is_kept_raw() {
        let text = r#"{"event":"signal","data":{"roomId":"r","description":{"type":"offer", "sdp":"v=0\r\n"}}}"#;
        let ClientMessage::Signal(payload) = ClientMessage::parse(text).unwrap() else {
            panic!("expected signal");
        };
        assert_eq!(payload.room_id, "r");
        assert_eq!(
            payload.description.unwrap().get(),
            r#"{"type":"offer", "sdp":"v=0\r\n"}"#
        );
        assert!(payload.candidate.is_none());
    }

    #[test]
    fn rejects_garbage_and_unknown_events() {
        assert!(matches!(
            ClientMessage::parse("not json"),
            Err(RelayError::Malformed(_))
        ));
        assert!(matches!(
            ClientMessage::parse(r#"{"event":"join-room","data":42}"#),
            Err(RelayError::Malformed(_))
        ));
        assert!(matches!(
            ClientMessage::parse(r#"{"event":"shout","data":"x"}"#),
            Err(RelayError::UnknownEvent(e)) if e == "shout"
        ));
    }

    #[test]
    fn server_frames_use_event_envelope() {
        let id = ConnectionId::generate();
        let text = ServerMessage::PeerJoined(id).to_text().unwrap();
        assert_eq!(text, format!(r#"{{"event":"peer-joined","data":"{id}"}}"#));

        let candidate = RawValue::from_string(r#"{"candidate":"a=1"}"#.to_string()).unwrap();
        let text = ServerMessage::Signal {
            from: id,
            description: None,
            candidate: Some(candidate),
        }
        .to_text()
        .unwrap();
        assert_eq!(
            text,
            format!(r#"{{"event":"signal","data":{{"from":"{id}","candidate":{{"candidate":"a=1"}}}}}}"#)
        );
    }
}
