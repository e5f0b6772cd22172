use std::time::Duration;

use serde::{Deserialize, Serialize};

/// WebSocket gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub bind: String,
    pub port: u32,
    /// Seconds a new connection has to send its hello frame.
    pub hello_timeout_secs: u32,
    /// Disconnect or cancel the wait of a participant whose socket closes.
    pub leave_on_close: bool,
}

impl GatewayConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn hello_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.hello_timeout_secs))
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8080,
            hello_timeout_secs: 10,
            leave_on_close: true,
        }
    }
}
