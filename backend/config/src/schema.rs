//! paramsync configuration schema, typed for serde YAML/JSON.

use paramsync_core::FormState;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outbound messages allowed per logical session before a forced reset.
pub const DEFAULT_MESSAGE_CEILING: u32 = 30;

/// Text query sent as the greeting trigger.
pub const DEFAULT_GREETING_QUERY: &str = "hello";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParamSyncConfig {
    pub session: SessionConfig,
    pub probe: ProbeConfig,
    pub decoration: DecorationConfig,
    pub logging: LoggingConfig,
    /// Initial values of the page's form controls.
    pub form: FormState,
    /// Directory for the durable counter file. Defaults to the config dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

/// Session lifecycle settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub message_ceiling: u32,
    pub greeting_query: String,
    /// Tear down and remount the widget on every new session.
    pub hard_reset: bool,
    /// Delay before parameters are pushed again after a reset.
    pub reapply_delay_ms: u64,
    /// Cap on retained payload log entries; unbounded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_log_capacity: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            message_ceiling: DEFAULT_MESSAGE_CEILING,
            greeting_query: DEFAULT_GREETING_QUERY.to_string(),
            hard_reset: false,
            reapply_delay_ms: 300,
            payload_log_capacity: None,
        }
    }
}

/// Environment probe settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProbeConfig {
    /// Upper bound on the high-entropy client hints query.
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { timeout_ms: 500 }
    }
}

/// Cosmetic decoration retry schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecorationConfig {
    pub enabled: bool,
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self { enabled: true, max_attempts: 20, interval_ms: 250 }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), dir: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config: ParamSyncConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, ParamSyncConfig::default());
        assert_eq!(config.session.message_ceiling, 30);
        assert_eq!(config.session.greeting_query, "hello");
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = "session:\n  hardReset: true\nform:\n  omitRegion: true\n";
        let config: ParamSyncConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.session.hard_reset);
        assert_eq!(config.session.message_ceiling, DEFAULT_MESSAGE_CEILING);
        assert!(config.form.omit_region);
        assert_eq!(config.form.language, "en");
    }
}
