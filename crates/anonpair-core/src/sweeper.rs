//! Timeout sweeper: expires a stale wait on a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use anonpair_common::ParticipantId;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::engine::{PairingEngine, SweepOutcome};

pub struct TimeoutSweeper {
    engine: Arc<PairingEngine>,
    interval: Duration,
}

impl TimeoutSweeper {
    pub fn new(engine: Arc<PairingEngine>, interval: Duration) -> Self {
        Self { engine, interval }
    }

    /// Run one sweep. Returns the participant whose wait expired, if any.
    pub async fn tick(&self) -> Option<ParticipantId> {
        match self.engine.sweep_now().await {
            Ok(handled) => match handled.outcome {
                SweepOutcome::Expired { participant } => Some(participant),
                SweepOutcome::NoOp => None,
            },
            Err(e) => {
                tracing::error!(error = %e, "Sweep tick failed");
                None
            }
        }
    }

    /// Sweep every `interval` until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick().await;
                    let (waiting, pairs) = self
                        .engine
                        .store()
                        .read(|s| (s.waiting.is_some(), s.pair_count()))
                        .await;
                    tracing::trace!(waiting, pairs, "Sweeper tick");
                }
            }
        }
        tracing::debug!("Sweeper stopped");
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
