//! Pairing engine: commits transitions, then announces them.

use std::sync::Arc;
use std::time::Duration;

use anonpair_common::{Decision, MessageHandle, ParticipantId, StoreError};
use tracing::{debug, error, info};

use super::transitions;
use super::types::{
    ConnectOutcome, DisconnectOutcome, EngineError, EngineOptions, LeaveOutcome, OfferOutcome,
    RevealOutcome, SweepOutcome,
};
use crate::delivery::{Handled, Notifier};
use crate::directory::{resolve_display_name, IdentityDirectory};
use crate::notices;
use crate::sink::{MessageSink, OutboundMessage};
use crate::store::SessionStore;
use crate::time::{TimeSource, Timestamp};

// ---------------------------------------------------------------------------
// Pairing Engine
// ---------------------------------------------------------------------------

pub struct PairingEngine {
    store: SessionStore,
    notifier: Notifier,
    directory: Arc<dyn IdentityDirectory>,
    clock: Arc<dyn TimeSource>,
    options: EngineOptions,
}

impl PairingEngine {
    pub fn new(
        store: SessionStore,
        sink: Arc<dyn MessageSink>,
        directory: Arc<dyn IdentityDirectory>,
        clock: Arc<dyn TimeSource>,
        options: EngineOptions,
    ) -> Self {
        Self {
            store,
            notifier: Notifier::new(sink, options.retry_critical_sends),
            directory,
            clock,
            options,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn wait_timeout(&self) -> Duration {
        self.options.wait_timeout
    }

    /// Put `p` in the waiting slot, or pair them with whoever is there.
    pub async fn request_connect(
        &self,
        p: ParticipantId,
    ) -> Result<Handled<ConnectOutcome>, EngineError> {
        let now = self.clock.now();
        let outcome = self
            .store
            .mutate(|state| transitions::connect(state, p, now))
            .await
            .map_err(|e| internal(p, "connect", e))?;

        let mut handled = Handled::new(outcome);
        let undelivered = &mut handled.undelivered;
        match &handled.outcome {
            ConnectOutcome::NowWaiting => {
                info!(participant = %p, "Participant waiting for a partner");
                let text = notices::waiting(self.options.wait_timeout);
                self.notifier
                    .notify(p, OutboundMessage::text(text), undelivered)
                    .await;
            }
            ConnectOutcome::AlreadyWaiting => {
                debug!(participant = %p, "Connect ignored, already waiting");
                self.notifier
                    .notify(p, OutboundMessage::text(notices::ALREADY_WAITING), undelivered)
                    .await;
            }
            ConnectOutcome::AlreadyPaired { partner } => {
                debug!(participant = %p, partner = %partner, "Connect ignored, already paired");
                self.notifier
                    .notify(p, OutboundMessage::text(notices::ALREADY_CHATTING), undelivered)
                    .await;
            }
            ConnectOutcome::Paired { partner } => {
                info!(participant = %p, partner = %partner, "Participants paired");
                self.notifier
                    .notify_critical(*partner, OutboundMessage::text(notices::CONNECTED), undelivered)
                    .await;
                self.notifier
                    .notify(p, OutboundMessage::text(notices::CONNECTED), undelivered)
                    .await;
            }
        }
        Ok(handled)
    }

    /// End `p`'s pairing, telling both sides.
    pub async fn disconnect(
        &self,
        p: ParticipantId,
    ) -> Result<Handled<DisconnectOutcome>, EngineError> {
        let outcome = self
            .store
            .mutate(|state| transitions::disconnect(state, p))
            .await
            .map_err(|e| internal(p, "disconnect", e))?;

        let mut handled = Handled::new(outcome);
        let undelivered = &mut handled.undelivered;
        match &handled.outcome {
            DisconnectOutcome::Disconnected { partner } => {
                info!(participant = %p, partner = %partner, "Participants disconnected");
                self.notifier
                    .notify_critical(
                        *partner,
                        OutboundMessage::text(notices::PARTNER_DISCONNECTED),
                        undelivered,
                    )
                    .await;
                self.notifier
                    .notify(p, OutboundMessage::text(notices::DISCONNECTED), undelivered)
                    .await;
            }
            DisconnectOutcome::NotConnected => {
                debug!(participant = %p, "Disconnect ignored, not paired");
                self.notifier
                    .notify(p, OutboundMessage::text(notices::NOT_CONNECTED), undelivered)
                    .await;
            }
        }
        Ok(handled)
    }

    /// Expire the current wait if it is older than the configured timeout.
    ///
    /// Idempotent: once a wait is expired, further calls are no-ops until a
    /// new participant starts waiting.
    pub async fn sweep_timeout(
        &self,
        now: Timestamp,
    ) -> Result<Handled<SweepOutcome>, EngineError> {
        let timeout = self.options.wait_timeout;
        let outcome = self
            .store
            .mutate(|state| transitions::sweep(state, now, timeout))
            .await
            .map_err(|e| {
                error!(error = %e, "Sweep failed");
                EngineError::Internal(e)
            })?;

        let mut handled = Handled::new(outcome);
        if let SweepOutcome::Expired { participant } = handled.outcome {
            info!(participant = %participant, "Wait expired");
            self.notifier
                .notify_critical(participant, notices::wait_expired(), &mut handled.undelivered)
                .await;
        }
        Ok(handled)
    }

    /// Sweep using the engine's clock.
    pub async fn sweep_now(&self) -> Result<Handled<SweepOutcome>, EngineError> {
        self.sweep_timeout(self.clock.now()).await
    }

    /// Send `p` the prompt whose buttons answer a reveal request.
    pub async fn offer_reveal(
        &self,
        p: ParticipantId,
    ) -> Result<Handled<OfferOutcome>, EngineError> {
        let partner = self.store.read(|state| state.partner_of(p)).await;

        let Some(partner) = partner else {
            let mut handled = Handled::new(OfferOutcome::NotConnected);
            self.notifier
                .notify(p, OutboundMessage::text(notices::NOT_CONNECTED), &mut handled.undelivered)
                .await;
            return Ok(handled);
        };

        let mut handled = Handled::new(OfferOutcome::Offered { partner });
        self.notifier
            .notify(p, notices::reveal_prompt(partner), &mut handled.undelivered)
            .await;
        Ok(handled)
    }

    /// Answer a reveal prompt.
    ///
    /// `claimed_partner` is the partner id carried by the prompt's button; a
    /// prompt left over from an earlier pairing is refused. `prompt` is the
    /// message to update with the result. Pairing state is never changed.
    pub async fn request_reveal(
        &self,
        p: ParticipantId,
        decision: Decision,
        claimed_partner: Option<ParticipantId>,
        prompt: Option<&MessageHandle>,
    ) -> Result<Handled<RevealOutcome>, EngineError> {
        let partner = self.store.read(|state| state.partner_of(p)).await;

        let partner = match (partner, claimed_partner) {
            (Some(partner), Some(claimed)) if partner != claimed => {
                debug!(participant = %p, partner = %partner, claimed = %claimed, "Stale reveal prompt");
                return Ok(Handled::new(RevealOutcome::NotConnected));
            }
            (Some(partner), _) => partner,
            (None, _) => {
                debug!(participant = %p, "Reveal ignored, not paired");
                return Ok(Handled::new(RevealOutcome::NotConnected));
            }
        };

        match decision {
            Decision::Yes => {
                let own_name = resolve_display_name(self.directory.as_ref(), p).await;
                let partner_name = resolve_display_name(self.directory.as_ref(), partner).await;

                let mut handled = Handled::new(RevealOutcome::Revealed {
                    partner,
                    partner_name: partner_name.clone(),
                });
                let undelivered = &mut handled.undelivered;
                self.notifier
                    .notify_critical(
                        partner,
                        OutboundMessage::text(notices::revealed(&own_name)),
                        undelivered,
                    )
                    .await;
                self.notifier
                    .notify(p, OutboundMessage::text(notices::revealed(&partner_name)), undelivered)
                    .await;
                if let Some(prompt) = prompt {
                    self.notifier
                        .edit(p, prompt, notices::REVEAL_CONFIRMED, undelivered)
                        .await;
                }
                info!(participant = %p, partner = %partner, "Identities revealed");
                Ok(handled)
            }
            Decision::No => {
                let mut handled = Handled::new(RevealOutcome::Declined { partner });
                let undelivered = &mut handled.undelivered;
                self.notifier
                    .notify_critical(
                        partner,
                        OutboundMessage::text(notices::REVEAL_DECLINED_BY_PARTNER),
                        undelivered,
                    )
                    .await;
                if let Some(prompt) = prompt {
                    self.notifier
                        .edit(p, prompt, notices::REVEAL_DECLINED, undelivered)
                        .await;
                }
                info!(participant = %p, partner = %partner, "Reveal declined");
                Ok(handled)
            }
        }
    }

    /// Drop `p` from the pairing state after their transport went away.
    ///
    /// A partner is told as with [`disconnect`](Self::disconnect); `p`
    /// itself is not messaged.
    pub async fn leave(&self, p: ParticipantId) -> Result<Handled<LeaveOutcome>, EngineError> {
        let outcome = self
            .store
            .mutate(|state| transitions::leave(state, p))
            .await
            .map_err(|e| internal(p, "leave", e))?;

        let mut handled = Handled::new(outcome);
        match &handled.outcome {
            LeaveOutcome::Disconnected { partner } => {
                info!(participant = %p, partner = %partner, "Participant left, pairing ended");
                self.notifier
                    .notify_critical(
                        *partner,
                        OutboundMessage::text(notices::PARTNER_DISCONNECTED),
                        &mut handled.undelivered,
                    )
                    .await;
            }
            LeaveOutcome::WaitCancelled => {
                info!(participant = %p, "Participant left, wait cancelled");
            }
            LeaveOutcome::NotConnected => {}
        }
        Ok(handled)
    }

    /// Record that `p` has used the service. Returns `true` on first sight.
    pub async fn register(&self, p: ParticipantId) -> Result<bool, EngineError> {
        let first = self
            .store
            .mutate(|state| transitions::register(state, p))
            .await
            .map_err(|e| internal(p, "register", e))?;
        if first {
            debug!(participant = %p, "New participant");
        }
        Ok(first)
    }
}

fn internal(p: ParticipantId, operation: &'static str, e: StoreError) -> EngineError {
    error!(participant = %p, operation, error = %e, "Pairing operation failed");
    EngineError::Internal(e)
}
