use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Session snapshot checkpointing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub enabled: bool,
    /// Snapshot file. Empty means `<data dir>/anonpair/state.json`.
    pub path: String,
    pub checkpoint_interval_secs: u32,
}

impl PersistenceConfig {
    /// Resolve the snapshot path, falling back to the platform data directory.
    pub fn state_path(&self) -> Option<PathBuf> {
        if !self.path.trim().is_empty() {
            return Some(PathBuf::from(self.path.trim()));
        }
        dirs::data_dir().map(|dir| dir.join("anonpair").join("state.json"))
    }

    pub fn checkpoint_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.checkpoint_interval_secs))
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: String::new(),
            checkpoint_interval_secs: 5,
        }
    }
}
