//! User-facing texts.

use std::time::Duration;

use anonpair_common::{Decision, ParticipantId};

use crate::sink::OutboundMessage;

pub const WELCOME: &str = "🌐 Welcome to Anonymous Chat! 🌐\nStay anonymous and connect with others! Use /connect to find a chat partner or /invite to bring your friends! 😎";
pub const ALREADY_CHATTING: &str = "⚠️ You're already chatting! Use /disconnect to end. 😶";
pub const ALREADY_WAITING: &str = "⏳ You're already waiting for a partner. Please wait...";
pub const CONNECTED: &str = "✅ Connected anonymously! Start chatting! 💬";
pub const PARTNER_DISCONNECTED: &str = "🚪 Your partner disconnected. Use /connect to find a new one!";
pub const DISCONNECTED: &str = "✅ Disconnected! Use /connect to reconnect.";
pub const NOT_CONNECTED: &str = "❌ You're not connected!";
pub const NOT_CONNECTED_RELAY: &str = "❌ You're not connected! Use /connect to start.";
pub const WAIT_EXPIRED: &str = "⏰ No user found, please try again or invite your friends to talk!";
pub const INVITE_UNAVAILABLE: &str = "📩 Invites are not available right now.";
pub const REVEAL_PROMPT: &str = "🎭 Reveal your identity to your partner?";
pub const REVEAL_CONFIRMED: &str = "✅ Identity revealed successfully! 🎉";
pub const REVEAL_DECLINED_BY_PARTNER: &str = "😔 Your partner declined to reveal their identity.";
pub const REVEAL_DECLINED: &str = "❌ Reveal request declined! 😔";
pub const INTERNAL_ERROR: &str = "⚠️ Something went wrong, please try again.";

pub const TRY_AGAIN_CALLBACK: &str = "try_again";
const RELAY_PREFIX: &str = "💬 ";

pub fn waiting(timeout: Duration) -> String {
    format!(
        "⏳ Waiting for another user to join... ({}s timeout)",
        timeout.as_secs()
    )
}

pub fn relayed(text: &str) -> String {
    format!("{RELAY_PREFIX}{text}")
}

pub fn invite(link: &str) -> String {
    format!(
        "Invite your friends to join the Anonymous Chat Community! 📩\nClick this link to join: {link}\nMore friends = more fun! 😄"
    )
}

pub fn revealed(partner_name: &str) -> String {
    format!("🎉 Identity revealed! Your partner is {partner_name}")
}

/// Callback id for a reveal answer, e.g. `reveal_yes_42`.
pub fn reveal_callback(decision: Decision, partner: ParticipantId) -> String {
    format!("reveal_{}_{}", decision.as_str(), partner)
}

pub fn wait_expired() -> OutboundMessage {
    OutboundMessage::text(WAIT_EXPIRED).with_option("Try Again 🔄", TRY_AGAIN_CALLBACK)
}

pub fn reveal_prompt(partner: ParticipantId) -> OutboundMessage {
    OutboundMessage::text(REVEAL_PROMPT)
        .with_option("Yes, reveal 🎉", reveal_callback(Decision::Yes, partner))
        .with_option("No 🙈", reveal_callback(Decision::No, partner))
}
