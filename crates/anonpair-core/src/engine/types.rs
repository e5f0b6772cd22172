//! Outcomes, options, and errors for pairing operations.

use std::time::Duration;

use anonpair_common::{ParticipantId, StoreError};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Nobody was waiting; the requester now is.
    NowWaiting,
    AlreadyWaiting,
    AlreadyPaired { partner: ParticipantId },
    /// Matched with the participant who was waiting.
    Paired { partner: ParticipantId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectOutcome {
    Disconnected { partner: ParticipantId },
    NotConnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    Expired { participant: ParticipantId },
    NoOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealOutcome {
    Revealed {
        partner: ParticipantId,
        partner_name: String,
    },
    Declined { partner: ParticipantId },
    NotConnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferOutcome {
    Offered { partner: ParticipantId },
    NotConnected,
}

/// Result of a participant's transport going away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    Disconnected { partner: ParticipantId },
    WaitCancelled,
    NotConnected,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Unrecoverable failure of a single operation. Other participants are
/// unaffected.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("internal error: {0}")]
    Internal(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// How long a participant may wait before the sweeper expires the wait.
    pub wait_timeout: Duration,
    /// Retry a failed partner notification once.
    pub retry_critical_sends: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(45),
            retry_critical_sends: true,
        }
    }
}
