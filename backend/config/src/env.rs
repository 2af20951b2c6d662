//! Environment variable overrides applied on top of the YAML config.
//!
//! | Variable                    | Field                    |
//! |-----------------------------|--------------------------|
//! | `PARAMSYNC_MESSAGE_CEILING` | `session.messageCeiling` |
//! | `PARAMSYNC_GREETING`        | `session.greetingQuery`  |
//! | `PARAMSYNC_HARD_RESET`      | `session.hardReset`      |
//! | `PARAMSYNC_STATE_DIR`       | `stateDir`               |
//! | `RUST_LOG`                  | `logging.level`          |
//!
//! Unparseable values are ignored with a warning.

use crate::schema::ParamSyncConfig;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: ParamSyncConfig) -> ParamSyncConfig {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

/// Apply overrides from a provided map (useful for testing).
pub fn apply_env_overrides_with(
    mut config: ParamSyncConfig,
    env: &HashMap<String, String>,
) -> ParamSyncConfig {
    if let Some(raw) = env.get("PARAMSYNC_MESSAGE_CEILING") {
        match raw.trim().parse::<u32>() {
            Ok(ceiling) => config.session.message_ceiling = ceiling,
            Err(_) => warn!(value = %raw, "Ignoring invalid PARAMSYNC_MESSAGE_CEILING"),
        }
    }
    if let Some(greeting) = env.get("PARAMSYNC_GREETING") {
        config.session.greeting_query = greeting.clone();
    }
    if let Some(raw) = env.get("PARAMSYNC_HARD_RESET") {
        match parse_bool(raw) {
            Some(flag) => config.session.hard_reset = flag,
            None => warn!(value = %raw, "Ignoring invalid PARAMSYNC_HARD_RESET"),
        }
    }
    if let Some(dir) = env.get("PARAMSYNC_STATE_DIR").filter(|d| !d.is_empty()) {
        config.state_dir = Some(PathBuf::from(dir));
    }
    if let Some(level) = env.get("RUST_LOG").filter(|l| !l.is_empty()) {
        config.logging.level = level.clone();
    }
    config
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
