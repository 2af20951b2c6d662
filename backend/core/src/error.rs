use thiserror::Error;

/// Top-level error type for the paramsync sequencer.
///
/// Only storage failures are expected to reach callers; capability probes and
/// widget operations degrade locally.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("widget error: {0}")]
    Widget(String),
}

impl SyncError {
    pub fn storage(msg: impl Into<String>) -> Self {
        SyncError::Storage(msg.into())
    }

    pub fn widget(msg: impl Into<String>) -> Self {
        SyncError::Widget(msg.into())
    }
}
