//! Configuration schema types for anonpair.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod gateway;
mod pairing;
mod persistence;
mod system;

pub use gateway::*;
pub use pairing::*;
pub use persistence::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for anonpair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct AnonpairConfig {
    pub pairing: PairingConfig,
    pub gateway: GatewayConfig,
    pub persistence: PersistenceConfig,
    pub invite: InviteConfig,
    pub logging: LoggingConfig,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_pairing_matches_legacy_timeout() {
        let config = AnonpairConfig::default();
        assert_eq!(config.pairing.wait_timeout_secs, 45);
        assert_eq!(config.pairing.wait_timeout(), Duration::from_secs(45));
        assert_eq!(config.pairing.sweep_interval(), Duration::from_secs(5));
        assert!(!config.pairing.sweep_on_event);
        assert!(config.pairing.retry_critical_sends);
    }

    #[test]
    fn default_gateway() {
        let config = AnonpairConfig::default();
        assert_eq!(config.gateway.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.gateway.hello_timeout(), Duration::from_secs(10));
        assert!(config.gateway.leave_on_close);
    }

    #[test]
    fn persistence_explicit_path_wins() {
        let persistence = PersistenceConfig {
            path: "/var/lib/anonpair/state.json".into(),
            ..PersistenceConfig::default()
        };
        assert_eq!(
            persistence.state_path().unwrap(),
            std::path::PathBuf::from("/var/lib/anonpair/state.json")
        );
    }

    #[test]
    fn persistence_default_path_ends_with_state_file() {
        let persistence = PersistenceConfig::default();
        if let Some(path) = persistence.state_path() {
            assert!(path.ends_with("anonpair/state.json"));
        }
    }

    #[test]
    fn invite_disabled_by_default() {
        let config = AnonpairConfig::default();
        assert!(config.invite.link.is_empty());
    }

    #[test]
    fn log_level_deserializes_lowercase() {
        let logging: LoggingConfig = toml::from_str("level = \"debug\"").unwrap();
        assert_eq!(logging.level, LogLevel::Debug);
        assert_eq!(logging.level.as_str(), "debug");
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let result: Result<LoggingConfig, _> = toml::from_str("level = \"verbose\"");
        assert!(result.is_err());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: AnonpairConfig = toml::from_str("[pairing]\nwait_timeout_secs = 90\n").unwrap();
        assert_eq!(config.pairing.wait_timeout_secs, 90);
        assert_eq!(config.pairing.sweep_interval_secs, 5);
        assert_eq!(config.gateway.port, 8080);
    }
}
