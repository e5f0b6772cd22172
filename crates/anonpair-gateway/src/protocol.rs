//! Gateway wire protocol. Every frame is a JSON text frame tagged by `type`.

use anonpair_common::{InboundEvent, MessageHandle, ParticipantId};
use anonpair_core::InteractiveOption;
use serde::{Deserialize, Serialize};

/// Frames a client sends. `hello` must come first.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Hello {
        participant_id: ParticipantId,
        #[serde(default)]
        display_name: Option<String>,
    },
    Command {
        name: String,
    },
    Text {
        text: String,
    },
    Callback {
        data: String,
        #[serde(default)]
        message_id: Option<String>,
    },
}

impl ClientFrame {
    /// Turn a post-hello frame into an event for `participant`. A repeated
    /// `hello` yields `None`.
    pub fn into_event(self, participant: ParticipantId) -> Option<InboundEvent> {
        match self {
            ClientFrame::Hello { .. } => None,
            ClientFrame::Command { name } => Some(InboundEvent::command(participant, name)),
            ClientFrame::Text { text } => Some(InboundEvent::text(participant, text)),
            ClientFrame::Callback { data, message_id } => Some(InboundEvent::callback(
                participant,
                data,
                message_id.map(MessageHandle::from),
            )),
        }
    }
}

/// Frames the gateway sends back to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Ready {
        participant_id: ParticipantId,
    },
    Message {
        message_id: String,
        text: String,
        options: Vec<InteractiveOption>,
    },
    Edit {
        message_id: String,
        text: String,
    },
    Error {
        message: String,
    },
}

impl ServerFrame {
    pub fn error(message: impl Into<String>) -> Self {
        ServerFrame::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
