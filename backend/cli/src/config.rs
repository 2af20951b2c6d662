//! Runtime wiring: config file, state and log locations, page context, and
//! construction of the sequencer around a simulated widget.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use paramsync_browser::{ClientHintsProvider, EnvironmentProbe};
use paramsync_config::{load_and_prepare, ConfigLocation, ParamSyncConfig};
use paramsync_core::{KeyValueStore, PageContext, PageSink, WidgetEvent};
use paramsync_sequencer::{FileStore, MemoryStore, Sequencer, SequencerParts, SessionCounterManager};
use tokio::sync::mpsc;
use tracing::info;

use crate::hints::FileHints;
use crate::sim_widget::{SimShell, SimWidgetFactory, EVENT_BUFFER_SIZE};

/// Identification string used when `PARAMSYNC_USER_AGENT` is unset.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Loaded configuration plus where it came from.
pub struct Runtime {
    pub config: ParamSyncConfig,
    pub location: ConfigLocation,
    pub client_hints: Option<PathBuf>,
}

impl Runtime {
    pub async fn load(config_path: Option<PathBuf>, client_hints: Option<PathBuf>) -> Result<Self> {
        let location = ConfigLocation::resolve(config_path);
        let config = load_and_prepare(&location.file)
            .await
            .with_context(|| format!("Failed to load config from {}", location.file.display()))?;
        Ok(Self { config, location, client_hints })
    }

    pub fn log_dir(&self) -> PathBuf {
        self.location.log_dir(&self.config)
    }

    pub fn page(&self, user_agent: Option<String>) -> PageContext {
        let user_agent = user_agent
            .or_else(|| std::env::var("PARAMSYNC_USER_AGENT").ok())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        PageContext {
            url: "http://localhost:8080/index.html".to_string(),
            path: "/index.html".to_string(),
            title: "Chat widget parameter demo".to_string(),
            user_agent,
        }
    }

    pub fn probe(&self, user_agent: &str) -> EnvironmentProbe {
        let probe = EnvironmentProbe::new(user_agent);
        match &self.client_hints {
            Some(path) => probe.with_native(Box::new(ClientHintsProvider::new(
                Arc::new(FileHints::new(path)),
                Duration::from_millis(self.config.probe.timeout_ms),
            ))),
            None => probe,
        }
    }

    /// Build a sequencer around a freshly mounted simulated widget.
    ///
    /// `durable_on_disk == false` keeps the lifetime counter in memory
    /// (fresh storage on every run).
    pub fn sequencer(
        &self,
        user_agent: Option<String>,
        durable_on_disk: bool,
        sink: Arc<dyn PageSink>,
    ) -> Result<Wired> {
        let durable: Arc<dyn KeyValueStore> = if durable_on_disk {
            let path = self.location.state_file(&self.config);
            info!(path = %path.display(), "Using durable state file");
            Arc::new(FileStore::open(path)?)
        } else {
            Arc::new(MemoryStore::new())
        };
        let counters = SessionCounterManager::new(
            durable,
            Arc::new(MemoryStore::new()),
            self.config.session.message_ceiling,
        );

        let page = self.page(user_agent);
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER_SIZE);
        let factory = Arc::new(SimWidgetFactory::new(events_tx.clone()));
        let shell = factory.shell();

        let sequencer = Sequencer::new(SequencerParts {
            config: self.config.session.clone(),
            form: self.config.form.clone(),
            probe: self.probe(&page.user_agent),
            page,
            counters,
            factory,
            sink,
        });

        Ok(Wired { sequencer, events_tx, events_rx, shell })
    }
}

/// A sequencer plus the channel its simulated widget reports on.
pub struct Wired {
    pub sequencer: Sequencer,
    pub events_tx: mpsc::Sender<WidgetEvent>,
    pub events_rx: mpsc::Receiver<WidgetEvent>,
    pub shell: Arc<SimShell>,
}
