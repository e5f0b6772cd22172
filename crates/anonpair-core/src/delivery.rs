//! Post-commit message delivery.
//!
//! Sends happen after the state change they announce has been committed.
//! Failures are logged and collected into the operation's report; they
//! never undo state.

use std::sync::Arc;

use anonpair_common::{DeliveryError, MessageHandle, ParticipantId};
use tracing::warn;

use crate::sink::{MessageSink, OutboundMessage};

/// A send or edit that did not reach its participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Undelivered {
    pub participant: ParticipantId,
    pub error: DeliveryError,
}

/// Outcome of an operation plus any messages that could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handled<O> {
    pub outcome: O,
    pub undelivered: Vec<Undelivered>,
}

impl<O> Handled<O> {
    pub fn new(outcome: O) -> Self {
        Self {
            outcome,
            undelivered: Vec::new(),
        }
    }

    pub fn fully_delivered(&self) -> bool {
        self.undelivered.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(O) -> U) -> Handled<U> {
        Handled {
            outcome: f(self.outcome),
            undelivered: self.undelivered,
        }
    }
}

/// Wraps a sink with the retry and reporting policy.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn MessageSink>,
    retry_critical: bool,
}

impl Notifier {
    pub fn new(sink: Arc<dyn MessageSink>, retry_critical: bool) -> Self {
        Self {
            sink,
            retry_critical,
        }
    }

    /// Send once; a failure is logged and recorded.
    pub async fn notify(
        &self,
        to: ParticipantId,
        message: OutboundMessage,
        undelivered: &mut Vec<Undelivered>,
    ) -> Option<MessageHandle> {
        match self.sink.send(to, message).await {
            Ok(handle) => Some(handle),
            Err(error) => {
                warn!(participant = %to, error = %error, "Message dropped");
                undelivered.push(Undelivered {
                    participant: to,
                    error,
                });
                None
            }
        }
    }

    /// Send a message announcing a pairing change to the other side.
    /// Retried once when the policy allows it.
    pub async fn notify_critical(
        &self,
        to: ParticipantId,
        message: OutboundMessage,
        undelivered: &mut Vec<Undelivered>,
    ) -> Option<MessageHandle> {
        if !self.retry_critical {
            return self.notify(to, message, undelivered).await;
        }

        match self.sink.send(to, message.clone()).await {
            Ok(handle) => Some(handle),
            Err(error) => {
                warn!(participant = %to, error = %error, "Critical send failed, retrying once");
                self.notify(to, message, undelivered).await
            }
        }
    }

    pub async fn edit(
        &self,
        to: ParticipantId,
        handle: &MessageHandle,
        text: &str,
        undelivered: &mut Vec<Undelivered>,
    ) {
        if let Err(error) = self.sink.edit(to, handle, text).await {
            warn!(participant = %to, handle = %handle, error = %error, "Edit dropped");
            undelivered.push(Undelivered {
                participant: to,
                error,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `failures` sends, then succeeds.
    struct FlakySink {
        failures: usize,
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl MessageSink for FlakySink {
        async fn send(
            &self,
            to: ParticipantId,
            _message: OutboundMessage,
        ) -> Result<MessageHandle, DeliveryError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                Err(DeliveryError::Unreachable(to))
            } else {
                Ok(MessageHandle::new())
            }
        }

        async fn edit(
            &self,
            to: ParticipantId,
            _handle: &MessageHandle,
            _text: &str,
        ) -> Result<(), DeliveryError> {
            Err(DeliveryError::Closed(to))
        }
    }

    fn flaky(failures: usize) -> Arc<FlakySink> {
        Arc::new(FlakySink {
            failures,
            attempts: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn critical_send_recovers_after_one_failure() {
        let sink = flaky(1);
        let notifier = Notifier::new(sink.clone(), true);
        let mut undelivered = Vec::new();

        let handle = notifier
            .notify_critical(ParticipantId(1), OutboundMessage::text("x"), &mut undelivered)
            .await;

        assert!(handle.is_some());
        assert!(undelivered.is_empty());
        assert_eq!(sink.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn critical_send_gives_up_after_retry() {
        let sink = flaky(5);
        let notifier = Notifier::new(sink.clone(), true);
        let mut undelivered = Vec::new();

        let handle = notifier
            .notify_critical(ParticipantId(1), OutboundMessage::text("x"), &mut undelivered)
            .await;

        assert!(handle.is_none());
        assert_eq!(undelivered.len(), 1);
        assert_eq!(sink.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn retry_disabled_sends_once() {
        let sink = flaky(1);
        let notifier = Notifier::new(sink.clone(), false);
        let mut undelivered = Vec::new();

        notifier
            .notify_critical(ParticipantId(1), OutboundMessage::text("x"), &mut undelivered)
            .await;

        assert_eq!(undelivered.len(), 1);
        assert_eq!(sink.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn plain_send_is_not_retried() {
        let sink = flaky(1);
        let notifier = Notifier::new(sink.clone(), true);
        let mut undelivered = Vec::new();

        notifier
            .notify(ParticipantId(1), OutboundMessage::text("x"), &mut undelivered)
            .await;

        assert_eq!(undelivered.len(), 1);
        assert_eq!(sink.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_edit_is_recorded() {
        let notifier = Notifier::new(flaky(0), true);
        let mut undelivered = Vec::new();
        notifier
            .edit(ParticipantId(3), &MessageHandle::new(), "done", &mut undelivered)
            .await;
        assert_eq!(
            undelivered,
            vec![Undelivered {
                participant: ParticipantId(3),
                error: DeliveryError::Closed(ParticipantId(3)),
            }]
        );
    }

    #[test]
    fn handled_map_keeps_failures() {
        let mut handled = Handled::new(1);
        handled.undelivered.push(Undelivered {
            participant: ParticipantId(1),
            error: DeliveryError::Transport("reset".into()),
        });
        let mapped = handled.map(|n| n + 1);
        assert_eq!(mapped.outcome, 2);
        assert!(!mapped.fully_delivered());
    }
}
