//! Session state owned by the sequencer.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use uuid::Uuid;

/// Greeting status of the open chat window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Welcome {
    Pending,
    Sent,
}

/// Lifecycle of the widget as seen by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum Lifecycle {
    /// No widget, or a widget that has not reported ready yet.
    Uninitialized,
    /// Widget ready, chat window not open.
    Loaded,
    ChatOpen { welcome: Welcome },
    Closed,
}

/// Shared, monotonically increasing session generation.
///
/// Deferred work captures an [`EpochToken`] and checks it before acting, so
/// a timer scheduled before a reset does nothing after it.
#[derive(Debug, Clone, Default)]
pub struct Epoch(Arc<AtomicU64>);

impl Epoch {
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn token(&self) -> EpochToken {
        EpochToken { epoch: self.clone(), value: self.current() }
    }
}

/// Snapshot of the epoch at the time some work was scheduled.
#[derive(Debug, Clone)]
pub struct EpochToken {
    epoch: Epoch,
    value: u64,
}

impl EpochToken {
    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn is_current(&self) -> bool {
        self.epoch.current() == self.value
    }
}

/// Volatile state of the current logical session.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Local correlation id for logs; unrelated to the widget's own session id.
    pub session_id: Uuid,
    pub lifecycle: Lifecycle,
    welcome_sent: bool,
    epoch: Epoch,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            lifecycle: Lifecycle::Uninitialized,
            welcome_sent: false,
            epoch: Epoch::default(),
        }
    }

    pub fn welcome_sent(&self) -> bool {
        self.welcome_sent
    }

    pub fn mark_welcome_sent(&mut self) {
        self.welcome_sent = true;
        if let Lifecycle::ChatOpen { .. } = self.lifecycle {
            self.lifecycle = Lifecycle::ChatOpen { welcome: Welcome::Sent };
        }
    }

    pub fn chat_opened(&mut self) {
        let welcome = if self.welcome_sent { Welcome::Sent } else { Welcome::Pending };
        self.lifecycle = Lifecycle::ChatOpen { welcome };
    }

    pub fn chat_closed(&mut self) {
        self.lifecycle = Lifecycle::Closed;
    }

    pub fn epoch(&self) -> &Epoch {
        &self.epoch
    }

    /// Start a new logical session: fresh id, welcome cleared, epoch bumped.
    pub fn begin_new_session(&mut self) -> EpochToken {
        self.session_id = Uuid::new_v4();
        self.welcome_sent = false;
        if let Lifecycle::ChatOpen { .. } = self.lifecycle {
            self.lifecycle = Lifecycle::ChatOpen { welcome: Welcome::Pending };
        }
        self.epoch.advance();
        self.epoch.token()
    }

    /// The widget handle was dropped; everything tied to it is void.
    pub fn widget_torn_down(&mut self) {
        self.welcome_sent = false;
        self.lifecycle = Lifecycle::Uninitialized;
    }
}
