//! Connection registry: maps participants to their socket's outbound channel.

use std::collections::HashMap;
use std::sync::Arc;

use anonpair_common::{DeliveryError, MessageHandle, ParticipantId};
use anonpair_core::{MessageSink, OutboundMessage};
use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::RwLock;

use crate::protocol::ServerFrame;

/// Thread-safe participant → channel map. One live socket per participant.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    senders: Arc<RwLock<HashMap<ParticipantId, mpsc::Sender<String>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `participant`'s channel. Fails if they already have one.
    pub async fn register(
        &self,
        participant: ParticipantId,
        tx: mpsc::Sender<String>,
    ) -> Result<(), &'static str> {
        let mut map = self.senders.write().await;
        if map.contains_key(&participant) {
            return Err("participant already connected");
        }
        map.insert(participant, tx);
        Ok(())
    }

    pub async fn unregister(&self, participant: ParticipantId) {
        self.senders.write().await.remove(&participant);
    }

    pub async fn sender(&self, participant: ParticipantId) -> Option<mpsc::Sender<String>> {
        self.senders.read().await.get(&participant).cloned()
    }

    /// Number of connected participants.
    pub async fn count(&self) -> usize {
        self.senders.read().await.len()
    }

    /// Queue `frame` for `to` without waiting on a slow socket.
    async fn push(&self, to: ParticipantId, frame: &ServerFrame) -> Result<(), DeliveryError> {
        let json = frame
            .to_json()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        let tx = self
            .sender(to)
            .await
            .ok_or(DeliveryError::Unreachable(to))?;
        tx.try_send(json).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Transport("outbound queue full".into()),
            TrySendError::Closed(_) => DeliveryError::Closed(to),
        })
    }
}

/// [`MessageSink`] that writes frames to connected sockets.
#[derive(Clone)]
pub struct WsSink {
    registry: ConnectionRegistry,
}

impl WsSink {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl MessageSink for WsSink {
    async fn send(
        &self,
        to: ParticipantId,
        message: OutboundMessage,
    ) -> Result<MessageHandle, DeliveryError> {
        let handle = MessageHandle::new();
        let frame = ServerFrame::Message {
            message_id: handle.as_str().to_string(),
            text: message.text,
            options: message.options,
        };
        self.registry.push(to, &frame).await?;
        Ok(handle)
    }

    async fn edit(
        &self,
        to: ParticipantId,
        handle: &MessageHandle,
        text: &str,
    ) -> Result<(), DeliveryError> {
        let frame = ServerFrame::Edit {
            message_id: handle.as_str().to_string(),
            text: text.to_string(),
        };
        self.registry.push(to, &frame).await
    }
}
