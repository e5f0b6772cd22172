//! Pairing engine.
//!
//! Matches waiting participants, tears pairings down, expires a stale wait
//! and runs the identity-reveal handshake. Every transition is a single
//! [`SessionStore`](crate::store::SessionStore) mutation; notifications go
//! out only after it commits.

mod manager;
mod transitions;
mod types;


pub use manager::PairingEngine;
pub use types::{
    ConnectOutcome, DisconnectOutcome, EngineError, EngineOptions, LeaveOutcome, OfferOutcome,
    RevealOutcome, SweepOutcome,
};
