//! Full configuration validation.
//!
//! Validates numeric ranges for every section and collects errors into a
//! single `ConfigError`.

mod helpers;


use crate::schema::AnonpairConfig;
use anonpair_common::ConfigError;

use helpers::validate_range;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &AnonpairConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_pairing(&mut errors, config);
    validate_gateway(&mut errors, config);
    validate_persistence(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_pairing(errors: &mut Vec<String>, config: &AnonpairConfig) {
    validate_range(
        errors,
        "pairing.wait_timeout_secs",
        config.pairing.wait_timeout_secs,
        1,
        86400,
    );
    validate_range(
        errors,
        "pairing.sweep_interval_secs",
        config.pairing.sweep_interval_secs,
        1,
        3600,
    );
}

fn validate_gateway(errors: &mut Vec<String>, config: &AnonpairConfig) {
    validate_range(errors, "gateway.port", config.gateway.port, 1, 65535);
    validate_range(
        errors,
        "gateway.hello_timeout_secs",
        config.gateway.hello_timeout_secs,
        1,
        120,
    );
    if config.gateway.bind.trim().is_empty() {
        errors.push("gateway.bind must not be empty".into());
    }
}

fn validate_persistence(errors: &mut Vec<String>, config: &AnonpairConfig) {
    validate_range(
        errors,
        "persistence.checkpoint_interval_secs",
        config.persistence.checkpoint_interval_secs,
        1,
        3600,
    );
}
