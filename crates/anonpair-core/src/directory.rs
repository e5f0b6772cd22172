//! Display-name lookup and invite links.

use std::collections::HashMap;

use anonpair_common::ParticipantId;
use async_trait::async_trait;
use tokio::sync::RwLock;

pub const ANONYMOUS: &str = "Anonymous";

/// Resolves a participant's real display name, consulted only on reveal.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn display_name(&self, participant: ParticipantId) -> Option<String>;
}

/// Look up a name, substituting [`ANONYMOUS`] when none is known.
pub async fn resolve_display_name(
    directory: &dyn IdentityDirectory,
    participant: ParticipantId,
) -> String {
    directory
        .display_name(participant)
        .await
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| ANONYMOUS.to_string())
}

/// In-memory directory filled by the front end as participants introduce
/// themselves.
#[derive(Default)]
pub struct MemoryDirectory {
    names: RwLock<HashMap<ParticipantId, String>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, participant: ParticipantId, name: impl Into<String>) {
        self.names.write().await.insert(participant, name.into());
    }

    pub async fn remove(&self, participant: ParticipantId) {
        self.names.write().await.remove(&participant);
    }
}

#[async_trait]
impl IdentityDirectory for MemoryDirectory {
    async fn display_name(&self, participant: ParticipantId) -> Option<String> {
        self.names.read().await.get(&participant).cloned()
    }
}

/// Source of the link handed out by `/invite`.
pub trait InviteProvider: Send + Sync {
    fn invite_link(&self) -> Option<String>;
}

/// A fixed invite link; an empty link means invites are disabled.
#[derive(Debug, Clone, Default)]
pub struct StaticInvite {
    link: Option<String>,
}

impl StaticInvite {
    pub fn new(link: impl Into<String>) -> Self {
        let link = link.into();
        let link = link.trim();
        Self {
            link: (!link.is_empty()).then(|| link.to_string()),
        }
    }
}

impl InviteProvider for StaticInvite {
    fn invite_link(&self) -> Option<String> {
        self.link.clone()
    }
}
