//! Simulated chat widget for terminal use.
//!
//! Behaves like the embedded element as far as the sequencer can tell:
//! it reports `ready` after mounting, echoes every query as a
//! `request-sent` / `response-received` pair carrying the current
//! parameters, and forgets those parameters on `startNewSession`.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use paramsync_core::{ParameterSet, SyncError, Widget, WidgetEvent, WidgetFactory};
use paramsync_sequencer::Decorator;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::debug;

/// Default channel buffer size for widget events.
pub const EVENT_BUFFER_SIZE: usize = 256;

/// State shared by every widget instance the factory mounts.
#[derive(Default)]
pub struct SimShell {
    /// Set once the mounted widget has received parameters (its UI is drawn).
    rendered: AtomicBool,
    mounts: AtomicU32,
}

impl SimShell {
    pub fn is_rendered(&self) -> bool {
        self.rendered.load(Ordering::SeqCst)
    }

    pub fn mounts(&self) -> u32 {
        self.mounts.load(Ordering::SeqCst)
    }
}

pub struct SimWidget {
    id: u32,
    events: mpsc::Sender<WidgetEvent>,
    shell: Arc<SimShell>,
    params: Mutex<Option<ParameterSet>>,
    torn_down: AtomicBool,
}

impl SimWidget {
    fn check_live(&self) -> Result<(), SyncError> {
        if self.torn_down.load(Ordering::SeqCst) {
            return Err(SyncError::widget(format!("widget #{} was torn down", self.id)));
        }
        Ok(())
    }

    async fn emit(&self, event: WidgetEvent) -> Result<(), SyncError> {
        self.events
            .send(event)
            .await
            .map_err(|_| SyncError::widget("event channel closed"))
    }

    fn current_parameters(&self) -> Value {
        match self.params.lock() {
            Ok(guard) => guard
                .as_ref()
                .map(|p| Value::Object(p.to_map()))
                .unwrap_or_else(|| json!({})),
            Err(_) => json!({}),
        }
    }

    fn reply_to(text: &str) -> String {
        if text.trim().eq_ignore_ascii_case("hello") {
            "Hi there! How can I help you today?".to_string()
        } else {
            format!("You said: {text}")
        }
    }
}

#[async_trait]
impl Widget for SimWidget {
    async fn set_parameters(&self, params: &ParameterSet) -> Result<(), SyncError> {
        self.check_live()?;
        let mut slot = self
            .params
            .lock()
            .map_err(|_| SyncError::widget("parameter slot poisoned"))?;
        *slot = Some(params.clone());
        self.shell.rendered.store(true, Ordering::SeqCst);
        debug!(widget = self.id, "Simulated widget accepted parameters");
        Ok(())
    }

    async fn start_new_session(&self) -> Result<(), SyncError> {
        self.check_live()?;
        if let Ok(mut slot) = self.params.lock() {
            *slot = None;
        }
        debug!(widget = self.id, "Simulated widget cleared its history");
        Ok(())
    }

    async fn send_query(&self, text: &str) -> Result<(), SyncError> {
        self.check_live()?;
        let request_body = json!({
            "queryInput": { "text": { "text": text } },
            "queryParams": { "parameters": self.current_parameters() },
        });
        self.emit(WidgetEvent::RequestSent { request_body }).await?;
        self.emit(WidgetEvent::ResponseReceived {
            body: json!({
                "queryResult": {
                    "responseMessages": [{ "text": { "text": [Self::reply_to(text)] } }]
                }
            }),
        })
        .await
    }

    async fn teardown(&self) -> Result<(), SyncError> {
        self.torn_down.store(true, Ordering::SeqCst);
        self.shell.rendered.store(false, Ordering::SeqCst);
        debug!(widget = self.id, "Simulated widget removed");
        Ok(())
    }
}

/// Mounts [`SimWidget`]s; each one reports ready on the shared channel.
pub struct SimWidgetFactory {
    events: mpsc::Sender<WidgetEvent>,
    shell: Arc<SimShell>,
}

impl SimWidgetFactory {
    pub fn new(events: mpsc::Sender<WidgetEvent>) -> Self {
        Self { events, shell: Arc::new(SimShell::default()) }
    }

    pub fn shell(&self) -> Arc<SimShell> {
        self.shell.clone()
    }
}

impl WidgetFactory for SimWidgetFactory {
    fn create(&self) -> Result<Box<dyn Widget>, SyncError> {
        let id = self.shell.mounts.fetch_add(1, Ordering::SeqCst) + 1;
        self.events
            .try_send(WidgetEvent::Ready)
            .map_err(|e| SyncError::widget(format!("could not queue ready event: {e}")))?;
        debug!(widget = id, "Simulated widget mounted");
        Ok(Box::new(SimWidget {
            id,
            events: self.events.clone(),
            shell: self.shell.clone(),
            params: Mutex::new(None),
            torn_down: AtomicBool::new(false),
        }))
    }
}

/// Cosmetic decoration: a title badge inside the widget header, which only
/// exists once the widget has drawn itself.
pub struct TitleBadge {
    shell: Arc<SimShell>,
}

impl TitleBadge {
    pub fn new(shell: Arc<SimShell>) -> Self {
        Self { shell }
    }
}

#[async_trait]
impl Decorator for TitleBadge {
    fn name(&self) -> &str {
        "title-badge"
    }

    async fn try_inject(&self) -> bool {
        self.shell.is_rendered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mount_reports_ready() {
        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER_SIZE);
        let factory = SimWidgetFactory::new(tx);
        let _widget = factory.create().unwrap();
        assert_eq!(rx.recv().await.unwrap(), WidgetEvent::Ready);
        assert_eq!(factory.shell().mounts(), 1);
    }

    #[tokio::test]
    async fn query_emits_request_then_response() {
        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER_SIZE);
        let factory = SimWidgetFactory::new(tx);
        let widget = factory.create().unwrap();
        rx.recv().await.unwrap();

        widget.send_query("hello").await.unwrap();
        match rx.recv().await.unwrap() {
            WidgetEvent::RequestSent { request_body } => {
                assert_eq!(request_body["queryInput"]["text"]["text"], "hello");
            }
            other => panic!("unexpected event: {other}"),
        }
        assert!(matches!(rx.recv().await.unwrap(), WidgetEvent::ResponseReceived { .. }));
    }

    #[tokio::test]
    async fn torn_down_widget_rejects_calls() {
        let (tx, _rx) = mpsc::channel(EVENT_BUFFER_SIZE);
        let factory = SimWidgetFactory::new(tx);
        let widget = factory.create().unwrap();
        widget.teardown().await.unwrap();
        assert!(widget.send_query("hi").await.is_err());
        assert!(!TitleBadge::new(factory.shell()).try_inject().await);
    }
}
