//! Default TOML config template with documentation comments.

/// Generate the default TOML config content with comments.
pub(super) fn default_config_toml() -> &'static str {
    r##"# anonpair configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[pairing]
# wait_timeout_secs = 45       # 1-86400
# sweep_interval_secs = 5      # 1-3600
# sweep_on_event = false
# retry_critical_sends = true

[gateway]
# bind = "0.0.0.0"
# port = 8080                  # 1-65535
# hello_timeout_secs = 10      # 1-120
# leave_on_close = true

[persistence]
# enabled = true
# path = ""                    # empty: <data dir>/anonpair/state.json
# checkpoint_interval_secs = 5 # 1-3600

[invite]
# link = ""

[logging]
# level = "info"               # trace, debug, info, warn, error
"##
}
