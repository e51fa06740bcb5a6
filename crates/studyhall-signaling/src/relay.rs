//! The room relay.
//!
//! Each connection owns an unbounded outbound channel; the relay only ever
//! pushes `ServerMessage`s into it and never waits on a slow reader. Room
//! membership is serialized per room, and operations for one connection are
//! serialized by that connection's own lock.
//!
//! Lock order is always connection, then room, then the room map.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock};

use studyhall_core::ConnectionId;

use crate::error::{RelayError, Result};
use crate::messages::{ClientMessage, ServerMessage, SignalPayload};

/// Receiving half of a connection's outbound channel.
pub type Outbound = mpsc::UnboundedReceiver<ServerMessage>;

type Sender = mpsc::UnboundedSender<ServerMessage>;

struct Connection {
    tx: Sender,
    rooms: HashSet<String>,
    /// Set by `disconnect`; a handle fetched before removal must not rejoin.
    removed: bool,
}

#[derive(Default)]
struct Room {
    members: HashMap<ConnectionId, Sender>,
    /// Set once the room has been removed from the map; joiners must retry.
    closed: bool,
}

impl Room {
    fn broadcast(&self, except: ConnectionId, msg: &ServerMessage) -> usize {
        let mut delivered = 0;
        for (id, tx) in &self.members {
            if *id == except {
                continue;
            }
            // A closed receiver means the peer is disconnecting; its own cleanup will run.
            if tx.send(msg.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }
}

/// Room-scoped signaling relay.
#[derive(Default)]
pub struct Relay {
    connections: RwLock<HashMap<ConnectionId, Arc<Mutex<Connection>>>>,
    rooms: RwLock<HashMap<String, Arc<Mutex<Room>>>>,
}

impl Relay {
    /// Create an empty relay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection and return its handle and outbound channel.
    pub async fn connect(&self) -> (ConnectionId, Outbound) {
        let id = ConnectionId::generate();
        let (tx, rx) = mpsc::unbounded_channel();

        let conn = Connection {
            tx,
            rooms: HashSet::new(),
            removed: false,
        };
        self.connections
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(conn)));

        tracing::debug!(connection = %id, "Connection registered");
        (id, rx)
    }

    /// Apply a decoded client frame.
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying operation.
    pub async fn handle(&self, conn: ConnectionId, msg: ClientMessage) -> Result<()> {
        match msg {
            ClientMessage::JoinRoom(room) => self.join(conn, &room).await,
            ClientMessage::Signal(payload) => self.signal(conn, payload).await.map(|_| ()),
            ClientMessage::LeaveRoom(room) => self.leave(conn, &room).await,
        }
    }

    /// Add `conn` to `room` and announce it to the other members.
    ///
    /// Joining a room the connection is already in does nothing.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::UnknownConnection` if `conn` is not registered.
    pub async fn join(&self, conn: ConnectionId, room: &str) -> Result<()> {
        let entry = self.connection(conn).await?;
        self.join_entry(conn, &entry, room).await
    }

    async fn join_entry(
        &self,
        conn: ConnectionId,
        entry: &Mutex<Connection>,
        room: &str,
    ) -> Result<()> {
        let mut state = entry.lock().await;

        if state.removed {
            return Err(RelayError::UnknownConnection(conn));
        }
        if state.rooms.contains(room) {
            return Ok(());
        }

        loop {
            let handle = {
                let mut rooms = self.rooms.write().await;
                Arc::clone(rooms.entry(room.to_owned()).or_default())
            };

            let mut members = handle.lock().await;
            if members.closed {
                // Emptied and unlinked between the lookup and the lock.
                continue;
            }

            members.members.insert(conn, state.tx.clone());
            let notified = members.broadcast(conn, &ServerMessage::PeerJoined(conn));
            tracing::debug!(connection = %conn, room = %room, notified, "Joined room");
            break;
        }

        state.rooms.insert(room.to_owned());
        Ok(())
    }

    /// Forward a negotiation payload to every other member of its room.
    ///
    /// Returns the number of peers the payload was handed to.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::RoomNotJoined` if `conn` is not in the room.
    pub async fn signal(&self, conn: ConnectionId, payload: SignalPayload) -> Result<usize> {
        let not_joined = || RelayError::RoomNotJoined {
            connection: conn,
            room: payload.room_id.clone(),
        };

        let handle = self
            .rooms
            .read()
            .await
            .get(&payload.room_id)
            .cloned()
            .ok_or_else(not_joined)?;

        let members = handle.lock().await;
        if !members.members.contains_key(&conn) {
            return Err(not_joined());
        }

        let msg = ServerMessage::Signal {
            from: conn,
            description: payload.description.clone(),
            candidate: payload.candidate.clone(),
        };
        let delivered = members.broadcast(conn, &msg);
        tracing::debug!(connection = %conn, room = %payload.room_id, delivered, "Signal relayed");
        Ok(delivered)
    }

    /// Remove `conn` from `room` and announce it to the remaining members.
    ///
    /// Leaving a room the connection is not in does nothing.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::UnknownConnection` if `conn` is not registered.
    pub async fn leave(&self, conn: ConnectionId, room: &str) -> Result<()> {
        let entry = self.connection(conn).await?;
        let mut state = entry.lock().await;

        if state.removed {
            return Err(RelayError::UnknownConnection(conn));
        }
        if state.rooms.remove(room) {
            self.remove_member(conn, room).await;
        }
        Ok(())
    }

    /// Leave every room `conn` is in and drop its outbound channel.
    pub async fn disconnect(&self, conn: ConnectionId) {
        let Some(entry) = self.connections.write().await.remove(&conn) else {
            return;
        };
        let mut state = entry.lock().await;
        state.removed = true;

        for room in std::mem::take(&mut state.rooms) {
            self.remove_member(conn, &room).await;
        }
        tracing::debug!(connection = %conn, "Connection removed");
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Number of registered connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Current members of `room`.
    pub async fn members(&self, room: &str) -> Vec<ConnectionId> {
        let Some(handle) = self.rooms.read().await.get(room).cloned() else {
            return Vec::new();
        };
        let members = handle.lock().await;
        members.members.keys().copied().collect()
    }

    async fn connection(&self, conn: ConnectionId) -> Result<Arc<Mutex<Connection>>> {
        self.connections
            .read()
            .await
            .get(&conn)
            .cloned()
            .ok_or(RelayError::UnknownConnection(conn))
    }

    async fn remove_member(&self, conn: ConnectionId, room: &str) {
        let Some(handle) = self.rooms.read().await.get(room).cloned() else {
            return;
        };

        let mut members = handle.lock().await;
        if members.members.remove(&conn).is_none() {
            return;
        }
        members.broadcast(conn, &ServerMessage::PeerLeft(conn));
        tracing::debug!(connection = %conn, room = %room, "Left room");

        if members.members.is_empty() {
            members.closed = true;
            let mut rooms = self.rooms.write().await;
            if rooms.get(room).is_some_and(|r| Arc::ptr_eq(r, &handle)) {
                rooms.remove(room);
            }
        }
    }
}
