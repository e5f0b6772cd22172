use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Matchmaking and wait-expiry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingConfig {
    /// How long a participant may wait for a partner (valid range: 1-86400).
    pub wait_timeout_secs: u32,
    /// How often the sweeper checks for an expired wait (valid range: 1-3600).
    pub sweep_interval_secs: u32,
    /// Also sweep after every inbound event.
    pub sweep_on_event: bool,
    /// Retry a failed partner notification once before dropping it.
    pub retry_critical_sends: bool,
}

impl PairingConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.wait_timeout_secs))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.sweep_interval_secs))
    }
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            wait_timeout_secs: 45,
            sweep_interval_secs: 5,
            sweep_on_event: false,
            retry_critical_sends: true,
        }
    }
}
