use async_trait::async_trait;

use crate::error::SyncError;
use crate::event::Notice;
use crate::params::ParameterSet;

/// Handle to one live instance of the embedded chat widget.
///
/// The widget owns transport, session ids and NLU; the sequencer only calls
/// into it. Implementations are expected to be cheap to call repeatedly.
#[async_trait]
pub trait Widget: Send + Sync {
    /// Replace the query parameters carried by every following request.
    async fn set_parameters(&self, params: &ParameterSet) -> Result<(), SyncError>;

    /// Ask the widget to drop its history and start a fresh conversation.
    async fn start_new_session(&self) -> Result<(), SyncError>;

    /// Send a text query as if the user typed it.
    async fn send_query(&self, text: &str) -> Result<(), SyncError>;

    /// Remove the widget from the page. Called once, right before the handle is dropped.
    async fn teardown(&self) -> Result<(), SyncError> {
        Ok(())
    }
}

/// Mounts new widget instances (initial load and hard resets).
pub trait WidgetFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn Widget>, SyncError>;
}

/// String key-value storage with `localStorage` / `sessionStorage` semantics.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError>;

    fn set(&self, key: &str, value: &str) -> Result<(), SyncError>;

    fn remove(&self, key: &str) -> Result<(), SyncError>;
}

/// Page-side rendering: preview pane and toast notices.
pub trait PageSink: Send + Sync {
    /// Show the payload that was just built.
    fn show_preview(&self, _params: &ParameterSet) {}

    /// Surface a user-visible notice.
    fn notify(&self, notice: &Notice);
}
