//! Where paramsync keeps its files, and reading/seeding `config.yaml`.

use crate::schema::ParamSyncConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const CONFIG_FILE_NAME: &str = "config.yaml";
const STATE_FILE_NAME: &str = "state.json";
const LOG_DIR_NAME: &str = "logs";

const SEED_HEADER: &str = "\
# paramsync configuration. Every key is optional; missing keys take defaults.
# PARAMSYNC_MESSAGE_CEILING, PARAMSYNC_GREETING, PARAMSYNC_HARD_RESET and
# PARAMSYNC_STATE_DIR override the matching values at load time.
";

/// Resolved config file and the directory the other files hang off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub dir: PathBuf,
    pub file: PathBuf,
}

impl ConfigLocation {
    /// An explicit file wins, then `PARAMSYNC_CONFIG_DIR`, then `~/.paramsync`.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        Self::resolve_with(
            explicit,
            std::env::var("PARAMSYNC_CONFIG_DIR").ok(),
            dirs::home_dir(),
        )
    }

    fn resolve_with(
        explicit: Option<PathBuf>,
        env_dir: Option<String>,
        home: Option<PathBuf>,
    ) -> Self {
        if let Some(file) = explicit {
            let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
            return Self { dir, file };
        }
        let dir = match (env_dir.filter(|d| !d.is_empty()), home) {
            (Some(dir), _) => PathBuf::from(dir),
            (None, Some(home)) => home.join(".paramsync"),
            (None, None) => PathBuf::from(".paramsync"),
        };
        Self { file: dir.join(CONFIG_FILE_NAME), dir }
    }

    /// Durable counter file: `stateDir` when configured, else next to the config.
    pub fn state_file(&self, config: &ParamSyncConfig) -> PathBuf {
        config
            .state_dir
            .as_deref()
            .unwrap_or(&self.dir)
            .join(STATE_FILE_NAME)
    }

    pub fn log_dir(&self, config: &ParamSyncConfig) -> PathBuf {
        config
            .logging
            .dir
            .clone()
            .unwrap_or_else(|| self.dir.join(LOG_DIR_NAME))
    }
}

/// Load `config.yaml`. A missing or blank file is a first run: defaults.
pub async fn load_config(path: &Path) -> Result<ParamSyncConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "No config file; using defaults");
        return Ok(ParamSyncConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(ParamSyncConfig::default());
    }

    let config = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;
    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Written,
    /// A config file was already there and `force` was not set.
    Kept,
}

/// Write a commented default `config.yaml`.
pub async fn seed_config(path: &Path, force: bool) -> Result<SeedOutcome> {
    if path.exists() && !force {
        return Ok(SeedOutcome::Kept);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let yaml = serde_yaml::to_string(&ParamSyncConfig::default())
        .context("Failed to serialize default config")?;
    let tmp = path.with_extension("yaml.tmp");
    fs::write(&tmp, format!("{SEED_HEADER}{yaml}"))
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to move config into {}", path.display()))?;

    info!(path = %path.display(), "Seeded default config");
    Ok(SeedOutcome::Written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("paramsync-config-{}-{}", name, std::process::id()))
    }

    #[test]
    fn explicit_file_beats_env_and_home() {
        let loc = ConfigLocation::resolve_with(
            Some(PathBuf::from("/etc/paramsync/site.yaml")),
            Some("/ignored".into()),
            Some(PathBuf::from("/home/u")),
        );
        assert_eq!(loc.dir, PathBuf::from("/etc/paramsync"));
        assert_eq!(loc.file, PathBuf::from("/etc/paramsync/site.yaml"));

        let loc = ConfigLocation::resolve_with(None, Some("/srv/ps".into()), Some("/home/u".into()));
        assert_eq!(loc.file, PathBuf::from("/srv/ps/config.yaml"));

        let loc = ConfigLocation::resolve_with(None, Some(String::new()), Some("/home/u".into()));
        assert_eq!(loc.dir, PathBuf::from("/home/u/.paramsync"));
    }

    #[test]
    fn state_and_logs_follow_config() {
        let loc = ConfigLocation::resolve_with(None, Some("/srv/ps".into()), None);
        let mut config = ParamSyncConfig::default();
        assert_eq!(loc.state_file(&config), PathBuf::from("/srv/ps/state.json"));
        assert_eq!(loc.log_dir(&config), PathBuf::from("/srv/ps/logs"));

        config.state_dir = Some("/var/lib/ps".into());
        assert_eq!(loc.state_file(&config), PathBuf::from("/var/lib/ps/state.json"));
    }

    #[tokio::test]
    async fn missing_or_blank_file_loads_defaults() {
        let dir = scratch_dir("blank");
        let path = dir.join(CONFIG_FILE_NAME);
        assert_eq!(load_config(&path).await.unwrap(), ParamSyncConfig::default());

        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(&path, "\n  \n").unwrap();
        assert_eq!(load_config(&path).await.unwrap(), ParamSyncConfig::default());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn seed_keeps_existing_unless_forced() {
        let dir = scratch_dir("seed");
        let path = dir.join(CONFIG_FILE_NAME);

        assert_eq!(seed_config(&path, false).await.unwrap(), SeedOutcome::Written);
        let seeded = std::fs::read_to_string(&path).unwrap();
        assert!(seeded.starts_with("# paramsync configuration"));
        assert_eq!(load_config(&path).await.unwrap(), ParamSyncConfig::default());

        std::fs::write(&path, "session:\n  messageCeiling: 5\n").unwrap();
        assert_eq!(seed_config(&path, false).await.unwrap(), SeedOutcome::Kept);
        assert_eq!(load_config(&path).await.unwrap().session.message_ceiling, 5);

        assert_eq!(seed_config(&path, true).await.unwrap(), SeedOutcome::Written);
        assert_eq!(load_config(&path).await.unwrap().session.message_ceiling, 30);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
