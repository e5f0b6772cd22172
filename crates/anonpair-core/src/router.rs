//! Command router: classifies inbound events and hands them to the engine
//! or the relay dispatcher.

use std::sync::{Arc, LazyLock};

use anonpair_common::{Decision, EventKind, InboundEvent, MessageHandle, ParticipantId};
use regex::Regex;
use tracing::{debug, warn};

use crate::delivery::Handled;
use crate::directory::InviteProvider;
use crate::engine::{
    ConnectOutcome, DisconnectOutcome, EngineError, OfferOutcome, PairingEngine, RevealOutcome,
};
use crate::notices;
use crate::relay::{RelayDispatcher, RelayOutcome};
use crate::sink::OutboundMessage;

static REVEAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^reveal_(yes|no)_(-?\d+)$").unwrap());

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Connect,
    Disconnect,
    Invite,
    Reveal,
}

impl Command {
    /// Parse a command name with or without the leading `/`. A `@botname`
    /// suffix is ignored, as is case.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        let name = name.strip_prefix('/').unwrap_or(name);
        let name = name.split('@').next().unwrap_or(name).to_lowercase();
        match name.as_str() {
            "start" => Some(Command::Start),
            "connect" => Some(Command::Connect),
            "disconnect" => Some(Command::Disconnect),
            "invite" => Some(Command::Invite),
            "reveal" => Some(Command::Reveal),
            _ => None,
        }
    }

    /// Recognise a free-text message that is exactly one command.
    pub fn from_text(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.starts_with('/') && !text.contains(char::is_whitespace) {
            Self::parse(text)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    TryAgain,
    Reveal {
        decision: Decision,
        partner: ParticipantId,
    },
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        if data == notices::TRY_AGAIN_CALLBACK {
            return Some(CallbackAction::TryAgain);
        }

        let caps = REVEAL_RE.captures(data)?;
        let decision = match &caps[1] {
            "yes" => Decision::Yes,
            _ => Decision::No,
        };
        let partner = caps[2].parse().ok()?;
        Some(CallbackAction::Reveal { decision, partner })
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// What the router did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Welcome,
    Connect(ConnectOutcome),
    Disconnect(DisconnectOutcome),
    Invite { link: Option<String> },
    OfferReveal(OfferOutcome),
    Reveal(RevealOutcome),
    Relay(RelayOutcome),
    /// A callback nobody handles.
    Ignored,
}

pub struct Router {
    engine: Arc<PairingEngine>,
    relay: RelayDispatcher,
    invite: Arc<dyn InviteProvider>,
    sweep_on_event: bool,
}

impl Router {
    pub fn new(engine: Arc<PairingEngine>, invite: Arc<dyn InviteProvider>) -> Self {
        let relay = RelayDispatcher::new(engine.store().clone(), engine.notifier().clone());
        Self {
            engine,
            relay,
            invite,
            sweep_on_event: false,
        }
    }

    /// Also sweep for an expired wait after every event.
    pub fn with_sweep_on_event(mut self, enabled: bool) -> Self {
        self.sweep_on_event = enabled;
        self
    }

    pub fn engine(&self) -> &Arc<PairingEngine> {
        &self.engine
    }

    /// Handle one inbound event.
    ///
    /// An internal engine failure is reported to the participant and
    /// returned; it only affects this event.
    pub async fn handle(&self, event: InboundEvent) -> Result<Handled<Routed>, EngineError> {
        let participant = event.participant;
        let result = self.dispatch(event).await;

        if let Err(e) = &result {
            warn!(participant = %participant, error = %e, "Event failed");
            let mut undelivered = Vec::new();
            self.engine
                .notifier()
                .notify(
                    participant,
                    OutboundMessage::text(notices::INTERNAL_ERROR),
                    &mut undelivered,
                )
                .await;
        }

        if self.sweep_on_event {
            if let Err(e) = self.engine.sweep_now().await {
                warn!(error = %e, "Sweep after event failed");
            }
        }

        result
    }

    async fn dispatch(&self, event: InboundEvent) -> Result<Handled<Routed>, EngineError> {
        let p = event.participant;
        self.engine.register(p).await?;

        match event.kind {
            EventKind::Command(name) => match Command::parse(&name) {
                Some(command) => self.run_command(p, command).await,
                None => {
                    let text = format!("/{}", name.trim_start_matches('/'));
                    Ok(self.relay.relay(p, &text).await.map(Routed::Relay))
                }
            },
            EventKind::Text(text) => match Command::from_text(&text) {
                Some(command) => self.run_command(p, command).await,
                None => Ok(self.relay.relay(p, &text).await.map(Routed::Relay)),
            },
            EventKind::Callback { data, message } => {
                self.run_callback(p, &data, message.as_ref()).await
            }
        }
    }

    async fn run_command(
        &self,
        p: ParticipantId,
        command: Command,
    ) -> Result<Handled<Routed>, EngineError> {
        debug!(participant = %p, command = ?command, "Command");
        match command {
            Command::Start => {
                let mut handled = Handled::new(Routed::Welcome);
                self.engine
                    .notifier()
                    .notify(p, OutboundMessage::text(notices::WELCOME), &mut handled.undelivered)
                    .await;
                Ok(handled)
            }
            Command::Connect => Ok(self.engine.request_connect(p).await?.map(Routed::Connect)),
            Command::Disconnect => Ok(self.engine.disconnect(p).await?.map(Routed::Disconnect)),
            Command::Invite => {
                let link = self.invite.invite_link();
                let text = match &link {
                    Some(link) => notices::invite(link),
                    None => notices::INVITE_UNAVAILABLE.to_string(),
                };
                let mut handled = Handled::new(Routed::Invite { link });
                self.engine
                    .notifier()
                    .notify(p, OutboundMessage::text(text), &mut handled.undelivered)
                    .await;
                Ok(handled)
            }
            Command::Reveal => Ok(self.engine.offer_reveal(p).await?.map(Routed::OfferReveal)),
        }
    }

    async fn run_callback(
        &self,
        p: ParticipantId,
        data: &str,
        message: Option<&MessageHandle>,
    ) -> Result<Handled<Routed>, EngineError> {
        match CallbackAction::parse(data) {
            Some(CallbackAction::TryAgain) => {
                Ok(self.engine.request_connect(p).await?.map(Routed::Connect))
            }
            Some(CallbackAction::Reveal { decision, partner }) => Ok(self
                .engine
                .request_reveal(p, decision, Some(partner), message)
                .await?
                .map(Routed::Reveal)),
            None => {
                debug!(participant = %p, data, "Unknown callback ignored");
                Ok(Handled::new(Routed::Ignored))
            }
        }
    }
}
