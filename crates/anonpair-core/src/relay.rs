//! Relay dispatcher: forwards free text to the sender's partner.

use anonpair_common::ParticipantId;
use tracing::debug;

use crate::delivery::{Handled, Notifier};
use crate::notices;
use crate::sink::OutboundMessage;
use crate::store::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotConnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Handed to the sink for `partner`. A send failure shows up in
    /// [`Handled::undelivered`].
    Delivered { partner: ParticipantId },
    Rejected(RejectReason),
}

#[derive(Clone)]
pub struct RelayDispatcher {
    store: SessionStore,
    notifier: Notifier,
}

impl RelayDispatcher {
    pub fn new(store: SessionStore, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    /// Forward `text` to `sender`'s partner, or tell `sender` they are not
    /// paired. The text is passed through unchanged apart from its prefix.
    pub async fn relay(&self, sender: ParticipantId, text: &str) -> Handled<RelayOutcome> {
        let partner = self.store.read(|state| state.partner_of(sender)).await;

        match partner {
            Some(partner) => {
                let mut handled = Handled::new(RelayOutcome::Delivered { partner });
                self.notifier
                    .notify(
                        partner,
                        OutboundMessage::text(notices::relayed(text)),
                        &mut handled.undelivered,
                    )
                    .await;
                handled
            }
            None => {
                debug!(participant = %sender, "Relay rejected, not paired");
                let mut handled = Handled::new(RelayOutcome::Rejected(RejectReason::NotConnected));
                self.notifier
                    .notify(
                        sender,
                        OutboundMessage::text(notices::NOT_CONNECTED_RELAY),
                        &mut handled.undelivered,
                    )
                    .await;
                handled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture, p};

    fn dispatcher(f: &crate::testing::Fixture) -> RelayDispatcher {
        RelayDispatcher::new(f.engine.store().clone(), f.engine.notifier().clone())
    }

    #[tokio::test]
    async fn relays_to_partner_with_prefix() {
        let f = fixture();
        f.engine.request_connect(p(1)).await.unwrap();
        f.engine.request_connect(p(2)).await.unwrap();

        let handled = dispatcher(&f).relay(p(1), "hi").await;
        assert_eq!(handled.outcome, RelayOutcome::Delivered { partner: p(2) });
        assert_eq!(f.sink.last_to(p(2)).unwrap().message.text, "💬 hi");
    }

    #[tokio::test]
    async fn unpaired_sender_gets_rejection() {
        let f = fixture();
        let handled = dispatcher(&f).relay(p(1), "anyone?").await;
        assert_eq!(
            handled.outcome,
            RelayOutcome::Rejected(RejectReason::NotConnected)
        );
        assert_eq!(f.sink.texts_to(p(1)), vec![notices::NOT_CONNECTED_RELAY]);
    }

    #[tokio::test]
    async fn waiting_sender_is_not_connected() {
        let f = fixture();
        f.engine.request_connect(p(1)).await.unwrap();
        let handled = dispatcher(&f).relay(p(1), "hello?").await;
        assert!(matches!(handled.outcome, RelayOutcome::Rejected(_)));
    }

    #[tokio::test]
    async fn failed_forward_is_reported() {
        let f = fixture();
        f.engine.request_connect(p(1)).await.unwrap();
        f.engine.request_connect(p(2)).await.unwrap();
        f.sink.make_unreachable(p(2));

        let handled = dispatcher(&f).relay(p(1), "hi").await;
        assert_eq!(handled.outcome, RelayOutcome::Delivered { partner: p(2) });
        assert_eq!(handled.undelivered.len(), 1);
    }

    #[tokio::test]
    async fn long_text_is_not_truncated() {
        let f = fixture();
        f.engine.request_connect(p(1)).await.unwrap();
        f.engine.request_connect(p(2)).await.unwrap();
        let text = "x".repeat(10_000);

        dispatcher(&f).relay(p(2), &text).await;
        assert_eq!(
            f.sink.last_to(p(1)).unwrap().message.text,
            notices::relayed(&text)
        );
    }
}
