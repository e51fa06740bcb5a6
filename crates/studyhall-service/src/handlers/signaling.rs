//! WebSocket endpoint for the signaling relay.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{Sink, SinkExt, Stream, StreamExt};

use studyhall_signaling::{ClientMessage, Relay};

use crate::state::AppState;

/// Upgrade to a signaling connection.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let relay = Arc::clone(&state.relay);
    ws.on_upgrade(move |socket: WebSocket| async move {
        let (sink, stream) = socket.split();
        run_connection(relay, sink, stream).await;
    })
}

/// Drive one signaling connection until either side closes.
///
/// Outbound relay messages are written by a dedicated task so a slow socket
/// never blocks the relay. Undecodable frames and relay errors are logged and
/// the connection stays open.
pub async fn run_connection<W, R, E>(relay: Arc<Relay>, mut sink: W, mut stream: R)
where
    W: Sink<Message> + Unpin + Send + 'static,
    R: Stream<Item = Result<Message, E>> + Unpin + Send,
    E: std::fmt::Display + Send,
{
    let (conn, mut outbound) = relay.connect().await;
    tracing::info!(connection = %conn, "Signaling connection established");

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            let text = match msg.to_text() {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode signaling frame");
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let result = match ClientMessage::parse(&text) {
                            Ok(msg) => relay.handle(conn, msg).await,
                            Err(e) => Err(e),
                        };
                        if let Err(e) = result {
                            tracing::debug!(connection = %conn, error = %e, "Signaling frame dropped");
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(connection = %conn, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
            _ = &mut send_task => break,
        }
    }

    relay.disconnect(conn).await;
    send_task.abort();
    tracing::info!(connection = %conn, "Signaling connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use std::time::Duration;

    type Incoming = mpsc::UnboundedSender<Result<Message, axum::Error>>;
    type Outgoing = mpsc::UnboundedReceiver<Message>;

    fn spawn_client(relay: &Arc<Relay>) -> (Incoming, Outgoing, tokio::task::JoinHandle<()>) {
        let (in_tx, in_rx) = mpsc::unbounded();
        let (out_tx, out_rx) = mpsc::unbounded();
        let handle = tokio::spawn(run_connection(Arc::clone(relay), out_tx, in_rx));
        (in_tx, out_rx, handle)
    }

    fn send(tx: &Incoming, text: &str) {
        tx.unbounded_send(Ok(Message::Text(text.to_string()))).unwrap();
    }

    async fn next_json(rx: &mut Outgoing) -> serde_json::Value {
        let msg = tokio::time::timeout(Duration::from_secs(2), rx.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed");
        match msg {
            Message::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("unexpected frame {other:?}"),
        }
    }

    async fn wait_for_members(relay: &Relay, room: &str, count: usize) {
        for _ in 0..200 {
            if relay.members(room).await.len() == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("room {room} never reached {count} members");
    }

    #[tokio::test]
    async fn relays_between_two_sockets() {
        let relay = Arc::new(Relay::new());
        let (a_in, mut a_out, _a) = spawn_client(&relay);
        let (b_in, mut b_out, _b) = spawn_client(&relay);

        send(&a_in, r#"{"event":"join-room","data":"room1"}"#);
        wait_for_members(&relay, "room1", 1).await;
        send(&b_in, r#"{"event":"join-room","data":"room1"}"#);

        let joined = next_json(&mut a_out).await;
        assert_eq!(joined["event"], "peer-joined");
        let b_id = joined["data"].as_str().unwrap().to_string();

        send(
            &b_in,
            r#"{"event":"signal","data":{"roomId":"room1","candidate":{"candidate":"c1","sdpMid":"0"}}}"#,
        );
        let signal = next_json(&mut a_out).await;
        assert_eq!(signal["event"], "signal");
        assert_eq!(signal["data"]["from"], b_id.as_str());
        assert_eq!(signal["data"]["candidate"]["sdpMid"], "0");

        // Garbage is ignored and the connection stays usable.
        send(&a_in, "not json");
        send(&a_in, r#"{"event":"leave-room","data":"room1"}"#);
        let left = next_json(&mut b_out).await;
        assert_eq!(left["event"], "peer-left");
    }

    #[tokio::test]
    async fn closing_the_stream_disconnects() {
        let relay = Arc::new(Relay::new());
        let (a_in, mut a_out, _a) = spawn_client(&relay);
        let (b_in, _b_out, b_task) = spawn_client(&relay);

        send(&a_in, r#"{"event":"join-room","data":"room1"}"#);
        wait_for_members(&relay, "room1", 1).await;
        send(&b_in, r#"{"event":"join-room","data":"room1"}"#);
        assert_eq!(next_json(&mut a_out).await["event"], "peer-joined");

        drop(b_in);
        b_task.await.unwrap();

        assert_eq!(next_json(&mut a_out).await["event"], "peer-left");
        assert_eq!(relay.members("room1").await.len(), 1);
    }
}
