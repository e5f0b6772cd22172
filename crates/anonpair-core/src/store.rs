//! Session store: the one shared, lock-protected copy of [`SessionState`].

use std::sync::Arc;

use anonpair_common::StoreError;
use tokio::sync::RwLock;

use crate::state::SessionState;

struct Inner {
    state: SessionState,
    /// Bumped on every committed change.
    revision: u64,
}

/// Thread-safe session store.
///
/// Every write goes through [`SessionStore::mutate`], which holds the write
/// lock for the whole read-modify-write and validates the result before
/// committing. Clones share the same state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<Inner>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                state: SessionState::new(),
                revision: 0,
            })),
        }
    }

    /// Build a store from a previously persisted state.
    pub fn restore(state: SessionState) -> Result<Self, StoreError> {
        state.check_invariants()?;
        Ok(Self {
            inner: Arc::new(RwLock::new(Inner { state, revision: 0 })),
        })
    }

    /// Consistent snapshot of the whole state.
    pub async fn get(&self) -> SessionState {
        self.inner.read().await.state.clone()
    }

    /// Snapshot together with the revision it belongs to.
    pub async fn snapshot(&self) -> (SessionState, u64) {
        let inner = self.inner.read().await;
        (inner.state.clone(), inner.revision)
    }

    /// Run a read-only closure against the current state without cloning it.
    pub async fn read<T>(&self, f: impl FnOnce(&SessionState) -> T) -> T {
        f(&self.inner.read().await.state)
    }

    /// Apply `f` atomically.
    ///
    /// `f` runs on a draft copy while the write lock is held. The draft is
    /// committed only if it satisfies every pairing invariant; otherwise the
    /// store is left untouched and `InvariantViolation` is returned.
    pub async fn mutate<T>(&self, f: impl FnOnce(&mut SessionState) -> T) -> Result<T, StoreError> {
        let mut inner = self.inner.write().await;
        let mut draft = inner.state.clone();
        let out = f(&mut draft);

        if let Err(e) = draft.check_invariants() {
            tracing::error!(error = %e, "Rejected session mutation");
            return Err(e);
        }

        if draft != inner.state {
            inner.state = draft;
            inner.revision += 1;
        }
        Ok(out)
    }

    pub async fn revision(&self) -> u64 {
        self.inner.read().await.revision
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anonpair_common::ParticipantId;

    fn p(id: i64) -> ParticipantId {
        ParticipantId(id)
    }

    #[tokio::test]
    async fn mutate_commits_valid_change() {
        let store = SessionStore::new();
        store
            .mutate(|s| {
                s.connections.insert(p(1), p(2));
                s.connections.insert(p(2), p(1));
            })
            .await
            .unwrap();

        let state = store.get().await;
        assert_eq!(state.partner_of(p(1)), Some(p(2)));
        assert_eq!(store.revision().await, 1);
    }

    #[tokio::test]
    async fn mutate_rejects_violation_and_keeps_state() {
        let store = SessionStore::new();
        let err = store
            .mutate(|s| {
                s.connections.insert(p(1), p(2));
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::InvariantViolation(_)));
        assert!(store.get().await.connections.is_empty());
        assert_eq!(store.revision().await, 0);
    }

    #[tokio::test]
    async fn no_op_mutation_keeps_revision() {
        let store = SessionStore::new();
        let out = store.mutate(|s| s.pair_count()).await.unwrap();
        assert_eq!(out, 0);
        assert_eq!(store.revision().await, 0);
    }

    #[tokio::test]
    async fn restore_rejects_corrupt_state() {
        let mut state = SessionState::new();
        state.connections.insert(p(5), p(5));
        assert!(SessionStore::restore(state).is_err());
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = SessionStore::new();
        let other = store.clone();
        store.mutate(|s| s.known.insert(p(9))).await.unwrap();
        assert!(other.read(|s| s.known.contains(&p(9))).await);
    }

    #[tokio::test]
    async fn concurrent_mutations_are_not_lost() {
        let store = SessionStore::new();
        let mut handles = Vec::new();
        for id in 0..64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.mutate(|s| s.known.insert(p(id))).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.get().await.known.len(), 64);
        assert_eq!(store.revision().await, 64);
    }
}
