//! Per-connection handler: hello, register, then route frames.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anonpair_common::ParticipantId;
use anonpair_core::{MemoryDirectory, Router};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::protocol::{ClientFrame, ServerFrame};
use crate::session::ConnectionRegistry;

type WsSender = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsReceiver = SplitStream<WebSocketStream<TcpStream>>;

/// Everything a connection needs, shared by all of them.
pub struct Gateway {
    pub router: Router,
    pub registry: ConnectionRegistry,
    pub directory: Arc<MemoryDirectory>,
    pub hello_timeout: Duration,
    pub leave_on_close: bool,
}

/// Handle a single WebSocket connection.
pub async fn handle_connection(
    ws: WebSocketStream<TcpStream>,
    addr: SocketAddr,
    gateway: Arc<Gateway>,
) {
    let (mut sink, mut stream) = ws.split();

    // 1. Identify the participant.
    let Some((participant, display_name)) =
        read_hello(&mut stream, addr, gateway.hello_timeout).await
    else {
        let _ = send_frame(&mut sink, &ServerFrame::error("expected hello")).await;
        return;
    };

    // 2. Register our outbound channel.
    let (tx, mut rx) = mpsc::channel::<String>(256);
    if let Err(e) = gateway.registry.register(participant, tx).await {
        tracing::warn!(peer = %addr, participant = %participant, "Duplicate connection refused");
        let _ = send_frame(&mut sink, &ServerFrame::error(e)).await;
        return;
    }

    if let Some(name) = display_name {
        gateway.directory.set(participant, name).await;
    }

    tracing::info!(peer = %addr, participant = %participant, "Participant connected");

    if send_frame(&mut sink, &ServerFrame::Ready { participant_id: participant })
        .await
        .is_err()
    {
        gateway.registry.unregister(participant).await;
        return;
    }

    // 3. Forwarding loop.
    loop {
        tokio::select! {
            Some(msg) = rx.recv() => {
                if sink.send(Message::Text(msg.into())).await.is_err() {
                    break;
                }
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = route_frame(&gateway, participant, &text).await {
                            let _ = send_frame(&mut sink, &reply).await;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    // 4. Cleanup.
    tracing::info!(peer = %addr, participant = %participant, "Participant disconnected");
    gateway.registry.unregister(participant).await;

    if gateway.leave_on_close {
        if let Err(e) = gateway.router.engine().leave(participant).await {
            tracing::error!(participant = %participant, error = %e, "Leave failed");
        }
    }
}

/// Route one text frame. Returns a frame to send straight back, if any.
async fn route_frame(gateway: &Gateway, participant: ParticipantId, text: &str) -> Option<ServerFrame> {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(participant = %participant, error = %e, "Invalid frame");
            return Some(ServerFrame::error(format!("invalid frame: {e}")));
        }
    };

    let Some(event) = frame.into_event(participant) else {
        return Some(ServerFrame::error("already identified"));
    };

    match gateway.router.handle(event).await {
        Ok(handled) => {
            if !handled.fully_delivered() {
                tracing::debug!(
                    participant = %participant,
                    undelivered = handled.undelivered.len(),
                    "Event handled with undelivered messages"
                );
            }
            None
        }
        // The router already told the participant.
        Err(_) => None,
    }
}

/// Read and parse the first frame as a hello.
async fn read_hello(
    stream: &mut WsReceiver,
    addr: SocketAddr,
    timeout: Duration,
) -> Option<(ParticipantId, Option<String>)> {
    let frame = tokio::time::timeout(timeout, stream.next()).await;

    match frame {
        Ok(Some(Ok(Message::Text(text)))) => match serde_json::from_str::<ClientFrame>(&text) {
            Ok(ClientFrame::Hello {
                participant_id,
                display_name,
            }) => Some((participant_id, display_name)),
            Ok(_) => {
                tracing::warn!(peer = %addr, "First frame was not hello");
                None
            }
            Err(e) => {
                tracing::warn!(peer = %addr, error = %e, "Invalid hello frame");
                None
            }
        },
        Ok(Some(Ok(_))) => {
            tracing::warn!(peer = %addr, "Expected text hello, got binary");
            None
        }
        Ok(Some(Err(e))) => {
            tracing::warn!(peer = %addr, error = %e, "WS error during hello");
            None
        }
        Ok(None) => {
            tracing::debug!(peer = %addr, "Connection closed before hello");
            None
        }
        Err(_) => {
            tracing::warn!(peer = %addr, timeout_secs = timeout.as_secs(), "Hello timeout");
            None
        }
    }
}

/// Send a ServerFrame as a JSON text frame.
async fn send_frame(
    sink: &mut WsSender,
    frame: &ServerFrame,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let json = frame
        .to_json()
        .map_err(|e| tokio_tungstenite::tungstenite::Error::Io(std::io::Error::other(e)))?;
    sink.send(Message::Text(json.into())).await
}
