//! Scripted end-to-end run against the simulated widget.

use std::sync::Arc;

use anyhow::Result;
use paramsync_core::WidgetEvent;
use paramsync_sequencer::Sequencer;
use tokio::sync::mpsc;
use tracing::error;

use crate::config::{Runtime, Wired};
use crate::terminal_output::{note_info, note_success, render_counts, render_payload_log, ConsoleSink};

/// Feed every queued widget event to the sequencer.
///
/// Handling an event may queue more (a hard reset mounts a widget that
/// reports ready), so this loops until the channel is empty.
pub async fn drain(sequencer: &mut Sequencer, events: &mut mpsc::Receiver<WidgetEvent>) {
    while let Ok(event) = events.try_recv() {
        if let Err(e) = sequencer.handle_event(event).await {
            error!(error = %e, "Failed to handle widget event");
        }
    }
}

/// Sends needed for the next one to be refused, given `already` counted.
fn sends_to_cross(ceiling: u32, already: u32) -> u32 {
    ceiling.saturating_sub(already) + 1
}

fn show_counts(sequencer: &Sequencer) -> Result<()> {
    let counts = sequencer.counts()?;
    print!("{}", render_counts(&counts, sequencer.config().message_ceiling));
    Ok(())
}

pub async fn run(runtime: &Runtime, user_agent: Option<String>) -> Result<()> {
    let Wired { mut sequencer, mut events_rx, .. } =
        runtime.sequencer(user_agent, false, Arc::new(ConsoleSink::new(false)))?;

    note_info("Mounting widget (fresh storage)");
    drain(&mut sequencer, &mut events_rx).await;
    show_counts(&sequencer)?;

    note_info("Sending 3 messages");
    for text in ["What are your opening hours?", "Do you ship abroad?", "Thanks"] {
        sequencer.send_message(text).await?;
        drain(&mut sequencer, &mut events_rx).await;
    }
    show_counts(&sequencer)?;

    note_info("Starting a new session");
    sequencer.request_new_session().await?;
    drain(&mut sequencer, &mut events_rx).await;
    show_counts(&sequencer)?;

    note_info("Opening chat window (greeting goes out once)");
    sequencer.handle_event(WidgetEvent::OpenedChanged { opened: true }).await?;
    drain(&mut sequencer, &mut events_rx).await;
    sequencer.handle_event(WidgetEvent::OpenedChanged { opened: true }).await?;
    drain(&mut sequencer, &mut events_rx).await;

    let ceiling = sequencer.config().message_ceiling;
    let already = sequencer.counts()?.message_count;
    note_info(&format!(
        "Sending messages until the ceiling of {ceiling} is crossed ({already} already counted)"
    ));
    for i in 1..=sends_to_cross(ceiling, already) {
        sequencer.send_message(&format!("message {i}")).await?;
        drain(&mut sequencer, &mut events_rx).await;
    }
    show_counts(&sequencer)?;

    println!();
    print!("{}", render_payload_log(sequencer.payload_log(), 8));
    println!();
    println!("{}", sequencer.preview().await?.render_preview());

    note_success("Demo finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_already_counted_shortens_the_run() {
        assert_eq!(sends_to_cross(30, 0), 31);
        assert_eq!(sends_to_cross(30, 1), 30);
        assert_eq!(sends_to_cross(30, 30), 1);
    }

    #[tokio::test]
    async fn scripted_run_crosses_ceiling_once() {
        let runtime = Runtime {
            config: paramsync_config::ParamSyncConfig::default(),
            location: paramsync_config::ConfigLocation::resolve(Some(
                std::env::temp_dir().join("paramsync-demo-test/config.yaml"),
            )),
            client_hints: None,
        };
        let Wired { mut sequencer, mut events_rx, .. } =
            runtime.sequencer(None, false, Arc::new(ConsoleSink::new(false))).unwrap();
        drain(&mut sequencer, &mut events_rx).await;
        sequencer.handle_event(WidgetEvent::OpenedChanged { opened: true }).await.unwrap();
        drain(&mut sequencer, &mut events_rx).await;

        let already = sequencer.counts().unwrap().message_count;
        assert_eq!(already, 1);
        for i in 1..sends_to_cross(30, already) {
            sequencer.send_message(&format!("m{i}")).await.unwrap();
            drain(&mut sequencer, &mut events_rx).await;
        }
        assert_eq!(sequencer.counts().unwrap().message_count, 30);

        sequencer.send_message("one more").await.unwrap();
        drain(&mut sequencer, &mut events_rx).await;
        assert_eq!(sequencer.counts().unwrap().message_count, 0);
        assert_eq!(sequencer.counts().unwrap().session_count, 2);
    }
}
