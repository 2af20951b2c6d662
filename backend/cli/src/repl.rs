//! Interactive driver.
//!
//! One task owns the sequencer and multiplexes three inputs: stdin
//! commands, widget events, and deferred work (re-apply after reset,
//! decoration results). Deferred work carries an epoch token and is
//! dropped by the sequencer when stale.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use paramsync_core::{DeviceKind, FormState, WidgetEvent};
use paramsync_sequencer::{decorate_with_retry, DecorationOutcome, EpochToken, RetrySchedule, Sequencer};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::config::{Runtime, Wired};
use crate::demo::drain;
use crate::sim_widget::{SimShell, TitleBadge};
use crate::terminal_output::{
    note_error, note_info, note_success, note_warn, render_counts, render_payload_log, ConsoleSink,
};

const HELP: &str = "\
commands:
  open | close          open or close the chat window
  send <text>           send a message through the widget
  hello                 send the greeting query now
  apply                 push the current parameters
  preview               show the parameters without sending
  set <field> <value>   edit the form (language, region, country, user, email,
                        tier, debug, device, omit-region)
  new | hard            start a new session (soft / remount the widget)
  counts                show the session counters
  log [n]               show the newest n payload log entries (default 10)
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Open,
    Close,
    Send(String),
    Hello,
    Apply,
    Preview,
    Set { field: String, value: String },
    NewSession { hard: bool },
    Counts,
    Log(usize),
    Help,
    Quit,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let command = match verb.to_ascii_lowercase().as_str() {
            "open" => ReplCommand::Open,
            "close" => ReplCommand::Close,
            "send" if !rest.is_empty() => ReplCommand::Send(rest.to_string()),
            "send" => bail!("usage: send <text>"),
            "hello" => ReplCommand::Hello,
            "apply" => ReplCommand::Apply,
            "preview" => ReplCommand::Preview,
            "set" => match rest.split_once(char::is_whitespace) {
                Some((field, value)) => ReplCommand::Set {
                    field: field.to_ascii_lowercase(),
                    value: value.trim().to_string(),
                },
                None if !rest.is_empty() => ReplCommand::Set {
                    field: rest.to_ascii_lowercase(),
                    value: String::new(),
                },
                None => bail!("usage: set <field> <value>"),
            },
            "new" => ReplCommand::NewSession { hard: false },
            "hard" => ReplCommand::NewSession { hard: true },
            "counts" => ReplCommand::Counts,
            "log" if rest.is_empty() => ReplCommand::Log(10),
            "log" => match rest.parse() {
                Ok(n) => ReplCommand::Log(n),
                Err(_) => bail!("usage: log [n]"),
            },
            "help" | "?" => ReplCommand::Help,
            "quit" | "exit" => ReplCommand::Quit,
            other => bail!("unknown command: {other} (try `help`)"),
        };
        Ok(Some(command))
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => bail!("expected on/off, got {other}"),
    }
}

/// Apply one `set <field> <value>` edit to the form.
pub fn apply_form_edit(form: &mut FormState, field: &str, value: &str) -> Result<()> {
    match field {
        "language" | "lang" => form.language = value.to_string(),
        "region" => form.region = value.to_string(),
        "country" | "countrycode" => form.country_code = value.to_string(),
        "user" | "userid" => form.user_id = value.to_string(),
        "email" => form.email = value.to_string(),
        "tier" | "usertier" => form.user_tier = value.to_string(),
        "debug" => form.debug_mode = parse_flag(value)?,
        "omit-region" => form.omit_region = parse_flag(value)?,
        "device" => {
            form.device = match value {
                "" | "auto" => None,
                other => Some(other.parse::<DeviceKind>().map_err(anyhow::Error::msg)?),
            }
        }
        other => bail!("unknown field: {other}"),
    }
    Ok(())
}

/// Deferred work completing outside the sequencer's task.
enum Deferred {
    Reapply(EpochToken),
    Decorated(DecorationOutcome),
}

struct Repl {
    sequencer: Sequencer,
    shell: Arc<SimShell>,
    deferred_tx: mpsc::Sender<Deferred>,
    reapply_delay: Duration,
    decoration: Option<RetrySchedule>,
}

impl Repl {
    fn schedule_reapply(&self, token: EpochToken) {
        let tx = self.deferred_tx.clone();
        let delay = self.reapply_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Deferred::Reapply(token)).await;
        });
    }

    fn schedule_decoration(&self) {
        let Some(schedule) = self.decoration else { return };
        let token = self.sequencer.epoch_token();
        let badge = TitleBadge::new(self.shell.clone());
        let tx = self.deferred_tx.clone();
        tokio::spawn(async move {
            let outcome = decorate_with_retry(&badge, schedule, &token).await;
            let _ = tx.send(Deferred::Decorated(outcome)).await;
        });
    }

    async fn on_event(&mut self, event: WidgetEvent) {
        let is_ready = matches!(event, WidgetEvent::Ready);
        if let WidgetEvent::ResponseReceived { body } = &event {
            if let Some(text) = body.pointer("/queryResult/responseMessages/0/text/text/0") {
                println!("bot> {}", text.as_str().unwrap_or_default());
            }
        }
        if let Err(e) = self.sequencer.handle_event(event).await {
            error!(error = %e, "Failed to handle widget event");
            note_error(&e.to_string());
        }
        if is_ready {
            note_success("Widget ready");
            self.schedule_decoration();
        }
    }

    async fn on_deferred(&mut self, deferred: Deferred) {
        match deferred {
            Deferred::Reapply(token) => match self.sequencer.run_deferred_reapply(&token).await {
                Ok(applied) => debug!(applied, "Deferred re-apply finished"),
                Err(e) => note_error(&e.to_string()),
            },
            Deferred::Decorated(outcome) => debug!(?outcome, "Decoration finished"),
        }
    }

    /// Returns `false` when the user asked to quit.
    async fn on_command(&mut self, command: ReplCommand) -> Result<bool> {
        match command {
            ReplCommand::Open => {
                self.sequencer.handle_event(WidgetEvent::OpenedChanged { opened: true }).await?
            }
            ReplCommand::Close => {
                self.sequencer.handle_event(WidgetEvent::OpenedChanged { opened: false }).await?
            }
            ReplCommand::Send(text) => {
                if !self.sequencer.send_message(&text).await? {
                    note_warn("Widget not ready yet");
                }
            }
            ReplCommand::Hello => {
                if !self.sequencer.send_greeting_now().await? {
                    note_warn("Widget not ready yet");
                }
            }
            ReplCommand::Apply => match self.sequencer.apply().await? {
                Some(params) => println!("{}", params.render_preview()),
                None => note_warn("Widget not ready yet"),
            },
            ReplCommand::Preview => {
                println!("{}", self.sequencer.preview().await?.render_preview());
            }
            ReplCommand::Set { field, value } => {
                apply_form_edit(self.sequencer.form_mut(), &field, &value)?;
                println!("{}", self.sequencer.preview().await?.render_preview());
            }
            ReplCommand::NewSession { hard } => {
                let token = if hard {
                    let token = self.sequencer.new_session(true).await?;
                    note_info("Widget remounted; new session started.");
                    token
                } else {
                    self.sequencer.request_new_session().await?
                };
                self.schedule_reapply(token);
            }
            ReplCommand::Counts => {
                let counts = self.sequencer.counts()?;
                print!("{}", render_counts(&counts, self.sequencer.config().message_ceiling));
                println!(
                    "  lifecycle: {:?}, welcome sent: {}",
                    self.sequencer.lifecycle(),
                    self.sequencer.welcome_sent()
                );
            }
            ReplCommand::Log(n) => print!("{}", render_payload_log(self.sequencer.payload_log(), n)),
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Quit => return Ok(false),
        }
        Ok(true)
    }
}

pub async fn run(runtime: &Runtime, user_agent: Option<String>, fresh: bool) -> Result<()> {
    let Wired { sequencer, mut events_rx, shell, .. } =
        runtime.sequencer(user_agent, !fresh, Arc::new(ConsoleSink::new(false)))?;

    let (deferred_tx, mut deferred_rx) = mpsc::channel(16);
    let decoration = &runtime.config.decoration;
    let mut repl = Repl {
        sequencer,
        shell,
        deferred_tx,
        reapply_delay: Duration::from_millis(runtime.config.session.reapply_delay_ms),
        decoration: decoration.enabled.then(|| RetrySchedule::from(decoration)),
    };

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(event) = events_rx.recv() => repl.on_event(event).await,
            Some(deferred) = deferred_rx.recv() => repl.on_deferred(deferred).await,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match ReplCommand::parse(&line) {
                    Ok(Some(command)) => match repl.on_command(command).await {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(e) => note_error(&e.to_string()),
                    },
                    Ok(None) => {}
                    Err(e) => note_error(&e.to_string()),
                }
                drain(&mut repl.sequencer, &mut events_rx).await;
            }
        }
    }

    note_info("Bye");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(ReplCommand::parse("  ").unwrap(), None);
        assert_eq!(
            ReplCommand::parse("send what is my tier?").unwrap(),
            Some(ReplCommand::Send("what is my tier?".into()))
        );
        assert_eq!(
            ReplCommand::parse("SET Region SG").unwrap(),
            Some(ReplCommand::Set { field: "region".into(), value: "SG".into() })
        );
        assert_eq!(ReplCommand::parse("hard").unwrap(), Some(ReplCommand::NewSession { hard: true }));
        assert_eq!(ReplCommand::parse("log 3").unwrap(), Some(ReplCommand::Log(3)));
        assert!(ReplCommand::parse("send").is_err());
        assert!(ReplCommand::parse("dance").is_err());
    }

    #[test]
    fn edits_form_fields() {
        let mut form = FormState::default();
        apply_form_edit(&mut form, "omit-region", "on").unwrap();
        apply_form_edit(&mut form, "device", "tablet").unwrap();
        apply_form_edit(&mut form, "user", "u-42").unwrap();
        assert!(form.omit_region);
        assert_eq!(form.device, Some(DeviceKind::Tablet));
        assert_eq!(form.user_id, "u-42");

        apply_form_edit(&mut form, "device", "auto").unwrap();
        assert_eq!(form.device, None);
        assert!(apply_form_edit(&mut form, "device", "watch").is_err());
        assert!(apply_form_edit(&mut form, "debug", "maybe").is_err());
    }
}
