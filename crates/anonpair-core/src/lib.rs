//! Anonymous pairing core.
//!
//! Holds the waiting-queue-of-one and the symmetric connection table in a
//! single [`SessionStore`], and drives every transition (connect,
//! disconnect, wait expiry, identity reveal, relay) against it. Outbound
//! messages go through a [`MessageSink`] only after a transition commits,
//! so a failed send never rolls back pairing state.

pub mod delivery;
pub mod directory;
pub mod engine;
pub mod notices;
pub mod persistence;
pub mod relay;
pub mod router;
pub mod sink;
pub mod state;
pub mod store;
pub mod sweeper;
pub mod time;

#[cfg(test)]
pub(crate) mod testing;

pub use delivery::{Handled, Notifier, Undelivered};
pub use directory::{IdentityDirectory, InviteProvider, MemoryDirectory, StaticInvite};
pub use engine::{
    ConnectOutcome, DisconnectOutcome, EngineError, EngineOptions, LeaveOutcome, OfferOutcome,
    PairingEngine, RevealOutcome, SweepOutcome,
};
pub use persistence::Checkpointer;
pub use relay::{RejectReason, RelayDispatcher, RelayOutcome};
pub use router::{CallbackAction, Command, Routed, Router};
pub use sink::{InteractiveOption, MessageSink, OutboundMessage};
pub use state::{ParticipantStatus, SessionState, Waiting};
pub use store::SessionStore;
pub use sweeper::TimeoutSweeper;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource, Timestamp};
