//! Outbound message sink implemented by the messaging front end.

use anonpair_common::{DeliveryError, MessageHandle, ParticipantId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A button attached to an outbound message. Pressing it comes back as a
/// callback event carrying `callback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractiveOption {
    pub label: String,
    pub callback: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub text: String,
    pub options: Vec<InteractiveOption>,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, label: impl Into<String>, callback: impl Into<String>) -> Self {
        self.options.push(InteractiveOption {
            label: label.into(),
            callback: callback.into(),
        });
        self
    }
}

/// Delivers messages to participants.
///
/// Sends to one participant must arrive in order; nothing else is assumed.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send(
        &self,
        to: ParticipantId,
        message: OutboundMessage,
    ) -> Result<MessageHandle, DeliveryError>;

    /// Replace the text of a message previously returned by `send`.
    async fn edit(
        &self,
        to: ParticipantId,
        handle: &MessageHandle,
        text: &str,
    ) -> Result<(), DeliveryError>;
}
