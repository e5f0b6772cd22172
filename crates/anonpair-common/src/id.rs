use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Stable participant identifier assigned by the message source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub i64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ParticipantId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(ParticipantId)
    }
}

impl From<i64> for ParticipantId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Handle of a message previously sent through a sink, used to edit it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageHandle(String);

impl MessageHandle {
    pub fn new() -> Self {
        Self(new_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for MessageHandle {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_id_is_valid_uuid() {
        let id = new_id();
        let parsed = uuid::Uuid::parse_str(&id);
        assert!(parsed.is_ok());
        assert_eq!(parsed.unwrap().get_version_num(), 4);
    }

    #[test]
    fn participant_id_parses_decimal() {
        assert_eq!("12345".parse::<ParticipantId>().unwrap(), ParticipantId(12345));
        assert_eq!(" -100 ".parse::<ParticipantId>().unwrap(), ParticipantId(-100));
        assert!("abc".parse::<ParticipantId>().is_err());
    }

    #[test]
    fn participant_id_serializes_as_number() {
        let json = serde_json::to_string(&ParticipantId(7)).unwrap();
        assert_eq!(json, "7");
        let back: ParticipantId = serde_json::from_str("7").unwrap();
        assert_eq!(back, ParticipantId(7));
    }

    #[test]
    fn message_handles_are_unique() {
        let a = MessageHandle::new();
        let b = MessageHandle::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), a.as_str());
    }

    #[test]
    fn message_handle_from_raw_string() {
        let handle = MessageHandle::from("msg-1".to_string());
        assert_eq!(handle.as_str(), "msg-1");
    }
}
