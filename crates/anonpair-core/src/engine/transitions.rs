//! Pure state transitions. Each function is run inside one store mutation.

use std::time::Duration;

use anonpair_common::ParticipantId;

use super::types::{ConnectOutcome, DisconnectOutcome, LeaveOutcome, SweepOutcome};
use crate::state::{ParticipantStatus, SessionState, Waiting};
use crate::time::Timestamp;

pub(super) fn connect(state: &mut SessionState, p: ParticipantId, now: Timestamp) -> ConnectOutcome {
    match state.status(p) {
        ParticipantStatus::Paired(partner) => ConnectOutcome::AlreadyPaired { partner },
        ParticipantStatus::Waiting => ConnectOutcome::AlreadyWaiting,
        ParticipantStatus::Idle => match state.waiting.take() {
            None => {
                state.waiting = Some(Waiting {
                    participant: p,
                    since: now,
                });
                ConnectOutcome::NowWaiting
            }
            Some(waiting) => {
                // `p` is Idle, so the waiter is someone else.
                let partner = waiting.participant;
                state.connections.insert(p, partner);
                state.connections.insert(partner, p);
                ConnectOutcome::Paired { partner }
            }
        },
    }
}

pub(super) fn disconnect(state: &mut SessionState, p: ParticipantId) -> DisconnectOutcome {
    match state.connections.remove(&p) {
        Some(partner) => {
            state.connections.remove(&partner);
            DisconnectOutcome::Disconnected { partner }
        }
        None => DisconnectOutcome::NotConnected,
    }
}

/// Expire the wait only once it is strictly older than `timeout`.
pub(super) fn sweep(state: &mut SessionState, now: Timestamp, timeout: Duration) -> SweepOutcome {
    let Some(waiting) = state.waiting else {
        return SweepOutcome::NoOp;
    };
    let Ok(timeout) = chrono::Duration::from_std(timeout) else {
        return SweepOutcome::NoOp;
    };

    if now.signed_duration_since(waiting.since) > timeout {
        state.waiting = None;
        SweepOutcome::Expired {
            participant: waiting.participant,
        }
    } else {
        SweepOutcome::NoOp
    }
}

pub(super) fn leave(state: &mut SessionState, p: ParticipantId) -> LeaveOutcome {
    match state.status(p) {
        ParticipantStatus::Paired(_) => match disconnect(state, p) {
            DisconnectOutcome::Disconnected { partner } => LeaveOutcome::Disconnected { partner },
            DisconnectOutcome::NotConnected => LeaveOutcome::NotConnected,
        },
        ParticipantStatus::Waiting => {
            state.waiting = None;
            LeaveOutcome::WaitCancelled
        }
        ParticipantStatus::Idle => LeaveOutcome::NotConnected,
    }
}

/// Returns `true` the first time a participant is seen.
pub(super) fn register(state: &mut SessionState, p: ParticipantId) -> bool {
    state.known.insert(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn p(id: i64) -> ParticipantId {
        ParticipantId(id)
    }

    #[test]
    fn first_connect_waits() {
        let mut state = SessionState::new();
        let now = Utc::now();
        assert_eq!(connect(&mut state, p(1), now), ConnectOutcome::NowWaiting);
        assert_eq!(
            state.waiting,
            Some(Waiting {
                participant: p(1),
                since: now
            })
        );
    }

    #[test]
    fn repeated_connect_is_already_waiting() {
        let mut state = SessionState::new();
        let now = Utc::now();
        connect(&mut state, p(1), now);
        let before = state.clone();
        assert_eq!(connect(&mut state, p(1), now), ConnectOutcome::AlreadyWaiting);
        assert_eq!(state, before);
    }

    #[test]
    fn second_participant_pairs_with_waiter() {
        let mut state = SessionState::new();
        let now = Utc::now();
        connect(&mut state, p(1), now);
        assert_eq!(
            connect(&mut state, p(2), now),
            ConnectOutcome::Paired { partner: p(1) }
        );
        assert_eq!(state.partner_of(p(1)), Some(p(2)));
        assert_eq!(state.partner_of(p(2)), Some(p(1)));
        assert_eq!(state.waiting, None);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn paired_participant_cannot_reconnect() {
        let mut state = SessionState::new();
        let now = Utc::now();
        connect(&mut state, p(1), now);
        connect(&mut state, p(2), now);
        let before = state.clone();
        assert_eq!(
            connect(&mut state, p(1), now),
            ConnectOutcome::AlreadyPaired { partner: p(2) }
        );
        assert_eq!(state, before);
    }

    #[test]
    fn disconnect_clears_both_sides_once() {
        let mut state = SessionState::new();
        let now = Utc::now();
        connect(&mut state, p(1), now);
        connect(&mut state, p(2), now);

        assert_eq!(
            disconnect(&mut state, p(2)),
            DisconnectOutcome::Disconnected { partner: p(1) }
        );
        assert!(state.connections.is_empty());
        assert_eq!(disconnect(&mut state, p(2)), DisconnectOutcome::NotConnected);
        assert_eq!(disconnect(&mut state, p(1)), DisconnectOutcome::NotConnected);
    }

    #[test]
    fn disconnect_does_not_touch_waiter() {
        let mut state = SessionState::new();
        connect(&mut state, p(1), Utc::now());
        assert_eq!(disconnect(&mut state, p(1)), DisconnectOutcome::NotConnected);
        assert_eq!(state.waiting_participant(), Some(p(1)));
    }

    #[test]
    fn sweep_boundary_is_exclusive() {
        let mut state = SessionState::new();
        let start = Utc::now();
        let timeout = Duration::from_secs(45);
        connect(&mut state, p(1), start);

        let at_limit = start + chrono::Duration::seconds(45);
        assert_eq!(sweep(&mut state, at_limit, timeout), SweepOutcome::NoOp);
        assert_eq!(state.waiting_participant(), Some(p(1)));

        let past_limit = start + chrono::Duration::seconds(46);
        assert_eq!(
            sweep(&mut state, past_limit, timeout),
            SweepOutcome::Expired { participant: p(1) }
        );
        assert_eq!(state.waiting, None);
        assert_eq!(sweep(&mut state, past_limit, timeout), SweepOutcome::NoOp);
    }

    #[test]
    fn sweep_with_clock_behind_wait_is_noop() {
        let mut state = SessionState::new();
        let start = Utc::now();
        connect(&mut state, p(1), start);
        let earlier = start - chrono::Duration::seconds(100);
        assert_eq!(
            sweep(&mut state, earlier, Duration::from_secs(45)),
            SweepOutcome::NoOp
        );
    }

    #[test]
    fn leave_handles_each_state() {
        let mut state = SessionState::new();
        let now = Utc::now();
        connect(&mut state, p(1), now);
        assert_eq!(leave(&mut state, p(1)), LeaveOutcome::WaitCancelled);
        assert_eq!(state.waiting, None);

        connect(&mut state, p(1), now);
        connect(&mut state, p(2), now);
        assert_eq!(
            leave(&mut state, p(1)),
            LeaveOutcome::Disconnected { partner: p(2) }
        );
        assert!(state.connections.is_empty());

        assert_eq!(leave(&mut state, p(3)), LeaveOutcome::NotConnected);
    }

    #[test]
    fn register_reports_first_sighting() {
        let mut state = SessionState::new();
        assert!(register(&mut state, p(1)));
        assert!(!register(&mut state, p(1)));
        assert_eq!(state.known.len(), 1);
    }

    #[test]
    fn connect_sequences_keep_invariants() {
        let mut state = SessionState::new();
        let now = Utc::now();
        // Interleave connects, repeats and disconnects from 20 participants.
        for round in 0..5 {
            for id in 0..20 {
                connect(&mut state, p(id), now);
                if (id + round) % 3 == 0 {
                    disconnect(&mut state, p(id));
                }
                if id % 4 == 0 {
                    connect(&mut state, p(id), now);
                }
                assert!(state.check_invariants().is_ok());
            }
        }
    }
}
