//! Session lifecycle sequencer.
//!
//! Owns the single widget handle and decides when parameters and the
//! greeting go out:
//!
//! ```text
//! Uninitialized --ready--> Loaded --opened--> ChatOpen(Pending) --greeting--> ChatOpen(Sent)
//!                                    ^             |closed                          |closed
//!                                    |             v                                v
//!                                    +--------- Closed <----------------------------+
//! ```
//!
//! A new session (explicit, or forced by the message ceiling) clears the
//! welcome flag; a hard reset also drops the widget and waits for the new
//! one to report ready.

use std::sync::Arc;

use paramsync_browser::EnvironmentProbe;
use paramsync_config::SessionConfig;
use paramsync_core::{
    FormState, Notice, PageContext, PageSink, ParameterSet, SessionCounters, SyncError, Widget,
    WidgetEvent, WidgetFactory,
};
use paramsync_logging::{Direction, PayloadLog};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::builder;
use crate::counters::{MessageOutcome, SessionCounterManager};
use crate::session_state::{EpochToken, Lifecycle, SessionState};

/// Everything the sequencer needs from its host.
pub struct SequencerParts {
    pub config: SessionConfig,
    pub form: FormState,
    pub page: PageContext,
    pub probe: EnvironmentProbe,
    pub counters: SessionCounterManager,
    pub factory: Arc<dyn WidgetFactory>,
    pub sink: Arc<dyn PageSink>,
}

pub struct Sequencer {
    config: SessionConfig,
    form: FormState,
    page: PageContext,
    probe: EnvironmentProbe,
    counters: SessionCounterManager,
    factory: Arc<dyn WidgetFactory>,
    sink: Arc<dyn PageSink>,
    widget: Option<Box<dyn Widget>>,
    ready: bool,
    state: SessionState,
    log: PayloadLog,
}

impl Sequencer {
    /// Mount the first widget. Parameters go out once it reports ready.
    pub fn new(parts: SequencerParts) -> Self {
        let log = PayloadLog::new(parts.config.payload_log_capacity);
        let mut sequencer = Self {
            config: parts.config,
            form: parts.form,
            page: parts.page,
            probe: parts.probe,
            counters: parts.counters,
            factory: parts.factory,
            sink: parts.sink,
            widget: None,
            ready: false,
            state: SessionState::new(),
            log,
        };
        sequencer.mount_widget();
        sequencer
    }

    // -- accessors ---------------------------------------------------------

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.state.lifecycle
    }

    pub fn welcome_sent(&self) -> bool {
        self.state.welcome_sent()
    }

    pub fn counts(&self) -> Result<SessionCounters, SyncError> {
        self.counters.current_counts()
    }

    pub fn payload_log(&self) -> &PayloadLog {
        &self.log
    }

    /// Form edits take effect on the next build.
    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Token for deferred work tied to the current session.
    pub fn epoch_token(&self) -> EpochToken {
        self.state.epoch().token()
    }

    // -- building ----------------------------------------------------------

    /// Build a fresh payload from the current form, environment and counters.
    pub async fn build_parameters(&self) -> Result<ParameterSet, SyncError> {
        let env = self.probe.detect().await;
        let counters = self.counters.current_counts()?;
        Ok(builder::build(&self.form, &self.page, &env, counters))
    }

    /// Build and show the payload without sending it.
    pub async fn preview(&self) -> Result<ParameterSet, SyncError> {
        let params = self.build_parameters().await?;
        self.sink.show_preview(&params);
        Ok(params)
    }

    /// Build and push the payload. `None` when there is no ready widget or
    /// the widget rejected the call.
    pub async fn push_parameters(&mut self) -> Result<Option<ParameterSet>, SyncError> {
        if self.ready_widget().is_none() {
            debug!("Widget not ready; skipping setParameters");
            return Ok(None);
        }

        let params = self.build_parameters().await?;
        let result = match self.ready_widget() {
            Some(widget) => widget.set_parameters(&params).await,
            None => return Ok(None),
        };
        self.sink.show_preview(&params);

        match result {
            Ok(()) => {
                self.log.record(
                    Direction::Outbound,
                    "setParameters",
                    json!({ "parameters": params.to_map() }),
                );
                debug!(
                    session_count = params.session_count,
                    message_count = params.message_count,
                    "Parameters pushed"
                );
                Ok(Some(params))
            }
            Err(e) => {
                self.widget_failed("setParameters", e);
                Ok(None)
            }
        }
    }

    // -- widget events -----------------------------------------------------

    pub async fn handle_event(&mut self, event: WidgetEvent) -> Result<(), SyncError> {
        debug!(event = %event, session_id = %self.state.session_id, "Widget event");
        match event {
            WidgetEvent::Ready => self.on_ready().await,
            WidgetEvent::OpenedChanged { opened: true } => self.on_chat_opened().await,
            WidgetEvent::OpenedChanged { opened: false } => {
                if self.ready {
                    self.state.chat_closed();
                }
                Ok(())
            }
            WidgetEvent::RequestSent { request_body } => self.on_request_sent(request_body).await,
            WidgetEvent::ResponseReceived { body } => {
                self.log.record(Direction::Inbound, "response-received", body);
                Ok(())
            }
            WidgetEvent::Error { error } => {
                warn!(error = %error, "Widget reported an error");
                self.log.record(Direction::Error, "error", Value::String(error));
                Ok(())
            }
        }
    }

    async fn on_ready(&mut self) -> Result<(), SyncError> {
        if self.widget.is_none() {
            warn!("Ready event without a mounted widget; ignoring");
            return Ok(());
        }
        self.ready = true;
        self.counters.increment_session()?;
        self.state.lifecycle = Lifecycle::Loaded;
        self.push_parameters().await?;
        info!(session_id = %self.state.session_id, "Widget ready");
        Ok(())
    }

    async fn on_chat_opened(&mut self) -> Result<(), SyncError> {
        if !self.ready {
            debug!("Chat opened before widget ready; ignoring");
            return Ok(());
        }
        self.state.chat_opened();
        if self.state.welcome_sent() {
            debug!("Greeting already sent for this session");
            return Ok(());
        }
        self.push_parameters().await?;
        self.send_greeting().await?;
        Ok(())
    }

    async fn on_request_sent(&mut self, request_body: Value) -> Result<(), SyncError> {
        self.log.record(Direction::Outbound, "request-sent", request_body);

        match self.counters.increment_message()? {
            MessageOutcome::Counted(_) => {
                self.push_parameters().await?;
            }
            MessageOutcome::LimitExceeded { ceiling, .. } => {
                self.sink.notify(&Notice::warning(format!(
                    "Message limit of {ceiling} reached; a new session was started."
                )));
                self.new_session(self.config.hard_reset).await?;
            }
        }
        Ok(())
    }

    // -- user actions ------------------------------------------------------

    /// "Apply" button: push the current payload now.
    pub async fn apply(&mut self) -> Result<Option<ParameterSet>, SyncError> {
        let pushed = self.push_parameters().await?;
        if pushed.is_some() {
            self.sink.notify(&Notice::info(
                "Applied. The next message you send will carry these parameters.",
            ));
        }
        Ok(pushed)
    }

    /// "New session" button.
    pub async fn request_new_session(&mut self) -> Result<EpochToken, SyncError> {
        let token = self.new_session(self.config.hard_reset).await?;
        self.sink.notify(&Notice::info("New session started (history cleared)."));
        Ok(token)
    }

    /// Send a user-typed query through the widget. `false` when not ready.
    pub async fn send_message(&mut self, text: &str) -> Result<bool, SyncError> {
        let result = match self.ready_widget() {
            Some(widget) => widget.send_query(text).await,
            None => {
                debug!("Widget not ready; dropping query");
                return Ok(false);
            }
        };
        match result {
            Ok(()) => {
                self.log.record(Direction::Outbound, "sendQuery", json!(text));
                Ok(true)
            }
            Err(e) => {
                self.widget_failed("sendQuery", e);
                Ok(false)
            }
        }
    }

    /// "Send hello" button: the greeting query, independent of the welcome flag.
    pub async fn send_greeting_now(&mut self) -> Result<bool, SyncError> {
        let greeting = self.config.greeting_query.clone();
        self.send_message(&greeting).await
    }

    /// The once-per-session greeting. Marks the welcome as sent on success.
    async fn send_greeting(&mut self) -> Result<(), SyncError> {
        let greeting = self.config.greeting_query.clone();
        let result = match self.ready_widget() {
            Some(widget) => widget.send_query(&greeting).await,
            None => return Ok(()),
        };
        match result {
            Ok(()) => {
                self.log.record(Direction::Outbound, "greeting", json!(greeting));
                self.state.mark_welcome_sent();
                info!(session_id = %self.state.session_id, "Greeting sent");
            }
            Err(e) => self.widget_failed("greeting", e),
        }
        Ok(())
    }

    // -- session reset -----------------------------------------------------

    /// Start a new logical session.
    ///
    /// Soft: the widget clears its history. Hard: the widget is torn down
    /// and remounted; parameters follow its ready event. Either way the
    /// message count is zeroed, the lifetime count moves and the welcome
    /// flag is cleared. The returned token drives a deferred re-apply.
    pub async fn new_session(&mut self, hard: bool) -> Result<EpochToken, SyncError> {
        if hard {
            self.remount_widget().await;
        } else {
            let result = match self.ready_widget() {
                Some(widget) => Some(widget.start_new_session().await),
                None => None,
            };
            if let Some(Err(e)) = result {
                self.widget_failed("startNewSession", e);
            }
        }

        let counts = self.counters.reset_for_new_session()?;
        let token = self.state.begin_new_session();
        self.push_parameters().await?;

        info!(
            hard,
            session_count = counts.session_count,
            session_id = %self.state.session_id,
            "New session started"
        );
        Ok(token)
    }

    /// Re-push parameters after a reset delay, unless the session moved on.
    pub async fn run_deferred_reapply(&mut self, token: &EpochToken) -> Result<bool, SyncError> {
        if !token.is_current() {
            debug!(epoch = token.value(), "Deferred re-apply superseded");
            return Ok(false);
        }
        Ok(self.push_parameters().await?.is_some())
    }

    // -- widget handle -----------------------------------------------------

    fn ready_widget(&self) -> Option<&dyn Widget> {
        if self.ready { self.widget.as_deref() } else { None }
    }

    fn mount_widget(&mut self) {
        match self.factory.create() {
            Ok(widget) => {
                self.widget = Some(widget);
                debug!("Widget mounted; waiting for ready");
            }
            Err(e) => self.widget_failed("mount", e),
        }
    }

    async fn remount_widget(&mut self) {
        self.ready = false;
        if let Some(old) = self.widget.take() {
            if let Err(e) = old.teardown().await {
                self.widget_failed("teardown", e);
            }
        }
        self.state.widget_torn_down();
        self.mount_widget();
    }

    fn widget_failed(&mut self, op: &str, err: SyncError) {
        warn!(op, error = %err, "Widget call failed");
        self.log.record(Direction::Error, op, json!(err.to_string()));
    }
}
