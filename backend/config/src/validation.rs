//! Config validation with path-scoped messages.

use crate::schema::ParamSyncConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &ParamSyncConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    let session = &config.session;
    if session.message_ceiling == 0 {
        report.error("session.messageCeiling", "Must be at least 1");
    }
    if session.greeting_query.trim().is_empty() {
        report.error("session.greetingQuery", "Greeting query cannot be blank");
    }
    if session.payload_log_capacity == Some(0) {
        report.warn("session.payloadLogCapacity", "Capacity 0 discards every payload entry");
    }

    if config.probe.timeout_ms == 0 {
        report.warn("probe.timeoutMs", "Timeout 0 always skips client hints");
    }

    if config.decoration.enabled && config.decoration.max_attempts == 0 {
        report.error("decoration.maxAttempts", "Must be at least 1 when decoration is enabled");
    }

    if config.form.language.trim().is_empty() {
        report.error("form.language", "Language is required");
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let report = validate(&ParamSyncConfig::default());
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn rejects_zero_ceiling_and_blank_greeting() {
        let mut config = ParamSyncConfig::default();
        config.session.message_ceiling = 0;
        config.session.greeting_query = "  ".into();
        let report = validate(&config);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].to_string().contains("session.messageCeiling"));
    }
}
