//! Pairing state: the single waiting slot and the partner table.

use std::collections::{BTreeMap, BTreeSet};

use anonpair_common::{ParticipantId, StoreError};
use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// The participant currently waiting for a partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waiting {
    pub participant: ParticipantId,
    pub since: Timestamp,
}

/// Where a participant stands right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantStatus {
    Idle,
    Waiting,
    Paired(ParticipantId),
}

/// Authoritative pairing state.
///
/// At most one participant waits at a time. `connections` is symmetric:
/// `connections[a] == b` iff `connections[b] == a`, and nobody is paired
/// with themselves. The waiting participant is never in `connections`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub waiting: Option<Waiting>,
    pub connections: BTreeMap<ParticipantId, ParticipantId>,
    /// Every participant that has ever sent an event.
    pub known: BTreeSet<ParticipantId>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, participant: ParticipantId) -> ParticipantStatus {
        if let Some(partner) = self.connections.get(&participant) {
            ParticipantStatus::Paired(*partner)
        } else if self.waiting_participant() == Some(participant) {
            ParticipantStatus::Waiting
        } else {
            ParticipantStatus::Idle
        }
    }

    pub fn partner_of(&self, participant: ParticipantId) -> Option<ParticipantId> {
        self.connections.get(&participant).copied()
    }

    pub fn waiting_participant(&self) -> Option<ParticipantId> {
        self.waiting.map(|w| w.participant)
    }

    pub fn pair_count(&self) -> usize {
        self.connections.len() / 2
    }

    /// Check every pairing invariant, naming the first one broken.
    pub fn check_invariants(&self) -> Result<(), StoreError> {
        if let Some(waiting) = self.waiting {
            if self.connections.contains_key(&waiting.participant) {
                return Err(StoreError::InvariantViolation(format!(
                    "waiting participant {} is also paired",
                    waiting.participant
                )));
            }
        }

        for (a, b) in &self.connections {
            if a == b {
                return Err(StoreError::InvariantViolation(format!(
                    "participant {a} is paired with itself"
                )));
            }
            if self.connections.get(b) != Some(a) {
                return Err(StoreError::InvariantViolation(format!(
                    "pairing {a} -> {b} is not symmetric"
                )));
            }
        }

        Ok(())
    }
}
