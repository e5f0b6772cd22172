use serde::{Deserialize, Serialize};

use crate::id::{MessageHandle, ParticipantId};

/// What kind of input a participant sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventKind {
    /// A slash command, stored without the leading `/`.
    Command(String),
    Text(String),
    /// A press on an interactive option attached to `message`.
    Callback {
        data: String,
        message: Option<MessageHandle>,
    },
}

/// One event delivered by the message source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub participant: ParticipantId,
    pub kind: EventKind,
}

impl InboundEvent {
    pub fn command(participant: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            participant,
            kind: EventKind::Command(name.into()),
        }
    }

    pub fn text(participant: ParticipantId, text: impl Into<String>) -> Self {
        Self {
            participant,
            kind: EventKind::Text(text.into()),
        }
    }

    pub fn callback(
        participant: ParticipantId,
        data: impl Into<String>,
        message: Option<MessageHandle>,
    ) -> Self {
        Self {
            participant,
            kind: EventKind::Callback {
                data: data.into(),
                message,
            },
        }
    }
}

/// Answer to an identity-reveal prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Yes,
    No,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Yes => "yes",
            Decision::No => "no",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_fill_kind() {
        let p = ParticipantId(1);
        assert_eq!(
            InboundEvent::command(p, "connect").kind,
            EventKind::Command("connect".into())
        );
        assert_eq!(InboundEvent::text(p, "hi").kind, EventKind::Text("hi".into()));
        assert!(matches!(
            InboundEvent::callback(p, "try_again", None).kind,
            EventKind::Callback { ref data, message: None } if data == "try_again"
        ));
    }

    #[test]
    fn event_kind_json_shape() {
        let json = serde_json::to_string(&EventKind::Text("hello".into())).unwrap();
        assert_eq!(json, r#"{"type":"text","data":"hello"}"#);
    }

    #[test]
    fn decision_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Decision::Yes).unwrap(), "\"yes\"");
        assert_eq!(Decision::No.as_str(), "no");
    }
}
