//! `paramsync-config`: sequencer configuration management.
//!
//! Provides:
//! - Typed config schema with defaults
//! - Config/state/log location resolution and YAML load/seed
//! - `PARAMSYNC_*` environment overrides
//! - Validation with path-scoped messages

pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use env::{apply_env_overrides, apply_env_overrides_with};
pub use io::{load_config, seed_config, ConfigLocation, SeedOutcome};
pub use schema::{
    DecorationConfig, LoggingConfig, ParamSyncConfig, ProbeConfig, SessionConfig,
    DEFAULT_GREETING_QUERY, DEFAULT_MESSAGE_CEILING,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Result};
use std::path::Path;

/// Load a config file, apply environment overrides and validate it.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<ParamSyncConfig> {
    let config = apply_env_overrides(load_config(path).await?);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if let Some(first) = report.errors.first() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
        bail!("{first}");
    }

    Ok(config)
}
