//! Durable state: a versioned JSON snapshot of [`SessionState`] on disk.
//!
//! Saves are atomic (write to `.tmp`, then rename) so a crash mid-write
//! leaves the previous snapshot intact.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anonpair_common::PersistError;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::state::SessionState;
use crate::store::SessionStore;

pub const STATE_FILE_VERSION: u8 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u8,
    state: SessionState,
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Load the snapshot at `path`. A missing file is an empty state.
pub fn load(path: &Path) -> Result<SessionState, PersistError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "No state file, starting empty");
            return Ok(SessionState::new());
        }
        Err(e) => return Err(e.into()),
    };

    let file: StateFile = serde_json::from_str(&contents)?;
    if file.version != STATE_FILE_VERSION {
        return Err(PersistError::Corrupt(format!(
            "unsupported state file version {}",
            file.version
        )));
    }
    file.state
        .check_invariants()
        .map_err(|e| PersistError::Corrupt(e.to_string()))?;

    tracing::info!(
        path = %path.display(),
        pairs = file.state.pair_count(),
        known = file.state.known.len(),
        "State loaded"
    );
    Ok(file.state)
}

/// Write `state` to `path`, creating parent directories as needed.
pub fn save(path: &Path, state: &SessionState) -> Result<(), PersistError> {
    let file = StateFile {
        version: STATE_FILE_VERSION,
        state: state.clone(),
    };
    let json = serde_json::to_string_pretty(&file)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = sibling(path, ".tmp");
    std::fs::write(&tmp_path, &json)?;
    std::fs::rename(&tmp_path, path)?;

    tracing::debug!(path = %path.display(), "State saved");
    Ok(())
}

/// Move an unreadable snapshot aside to `<path>.corrupt`.
pub fn quarantine(path: &Path) -> Result<PathBuf, PersistError> {
    let target = sibling(path, ".corrupt");
    std::fs::rename(path, &target)?;
    tracing::warn!(from = %path.display(), to = %target.display(), "State file quarantined");
    Ok(target)
}

/// Load the snapshot, quarantining it and starting empty if it is unusable.
pub fn load_or_quarantine(path: &Path) -> SessionState {
    match load(path) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "State file unusable");
            if let Err(e) = quarantine(path) {
                tracing::error!(error = %e, "Failed to quarantine state file");
            }
            SessionState::new()
        }
    }
}

/// `path` with `suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

// =============================================================================
// CHECKPOINTER
// =============================================================================

/// Periodically writes the store to disk when its revision has moved.
pub struct Checkpointer {
    store: SessionStore,
    path: PathBuf,
    interval: Duration,
    last_saved: Option<u64>,
}

impl Checkpointer {
    pub fn new(store: SessionStore, path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            store,
            path: path.into(),
            interval,
            last_saved: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save if anything changed since the last save. Returns `true` when a
    /// snapshot was written.
    pub async fn checkpoint(&mut self) -> Result<bool, PersistError> {
        let (state, revision) = self.store.snapshot().await;
        if self.last_saved == Some(revision) {
            return Ok(false);
        }

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || save(&path, &state))
            .await
            .map_err(|e| PersistError::Io(std::io::Error::other(e)))??;

        self.last_saved = Some(revision);
        Ok(true)
    }

    /// Checkpoint every `interval`, and once more when `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.checkpoint().await {
                        tracing::error!(error = %e, "Checkpoint failed");
                    }
                }
            }
        }

        match self.checkpoint().await {
            Ok(_) => tracing::info!(path = %self.path.display(), "Final checkpoint written"),
            Err(e) => tracing::error!(error = %e, "Final checkpoint failed"),
        }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}

// =============================================================================
// TESTS
// =============================================================================
