//! Shared fixtures for unit tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anonpair_common::{DeliveryError, MessageHandle, ParticipantId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::directory::MemoryDirectory;
use crate::engine::{EngineOptions, PairingEngine};
use crate::sink::{MessageSink, OutboundMessage};
use crate::store::SessionStore;
use crate::time::{ManualTimeSource, TimeSource, Timestamp};

#[derive(Debug, Clone)]
pub struct Sent {
    pub to: ParticipantId,
    pub message: OutboundMessage,
    pub handle: MessageHandle,
}

#[derive(Debug, Clone)]
pub struct Edited {
    pub to: ParticipantId,
    pub handle: MessageHandle,
    pub text: String,
}

/// Records every send and edit; participants in `unreachable` fail.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<Sent>>,
    pub edited: Mutex<Vec<Edited>>,
    pub unreachable: Mutex<HashSet<ParticipantId>>,
}

impl RecordingSink {
    pub fn texts_to(&self, to: ParticipantId) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.to == to)
            .map(|s| s.message.text.clone())
            .collect()
    }

    pub fn last_to(&self, to: ParticipantId) -> Option<Sent> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|s| s.to == to)
            .cloned()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn make_unreachable(&self, p: ParticipantId) {
        self.unreachable.lock().unwrap().insert(p);
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send(
        &self,
        to: ParticipantId,
        message: OutboundMessage,
    ) -> Result<MessageHandle, DeliveryError> {
        if self.unreachable.lock().unwrap().contains(&to) {
            return Err(DeliveryError::Unreachable(to));
        }
        let handle = MessageHandle::new();
        self.sent.lock().unwrap().push(Sent {
            to,
            message,
            handle: handle.clone(),
        });
        Ok(handle)
    }

    async fn edit(
        &self,
        to: ParticipantId,
        handle: &MessageHandle,
        text: &str,
    ) -> Result<(), DeliveryError> {
        if self.unreachable.lock().unwrap().contains(&to) {
            return Err(DeliveryError::Unreachable(to));
        }
        self.edited.lock().unwrap().push(Edited {
            to,
            handle: handle.clone(),
            text: text.to_string(),
        });
        Ok(())
    }
}

pub struct Fixture {
    pub engine: Arc<PairingEngine>,
    pub sink: Arc<RecordingSink>,
    pub directory: Arc<MemoryDirectory>,
    pub clock: Arc<ManualTimeSource>,
}

impl Fixture {
    pub fn clock_now(&self) -> Timestamp {
        self.clock.now()
    }
}

pub fn start_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn fixture() -> Fixture {
    let sink = Arc::new(RecordingSink::default());
    let directory = Arc::new(MemoryDirectory::new());
    let clock = Arc::new(ManualTimeSource::new(start_time()));
    let engine = Arc::new(PairingEngine::new(
        SessionStore::new(),
        sink.clone(),
        directory.clone(),
        clock.clone(),
        EngineOptions::default(),
    ));
    Fixture {
        engine,
        sink,
        directory,
        clock,
    }
}

pub fn p(id: i64) -> ParticipantId {
    ParticipantId(id)
}
