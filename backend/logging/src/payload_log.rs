//! Payload Log
//!
//! Timestamped record of every payload exchanged with the widget, newest
//! first, for the page's debug panel. Each entry is mirrored to `tracing`
//! (redacted) under the `payload_log` target.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Page -> widget/bot (parameters, queries, request bodies).
    Outbound,
    /// Bot -> page (responses).
    Inbound,
    /// Widget-reported errors.
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayloadEntry {
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    pub label: String,
    pub payload: Value,
}

impl PayloadEntry {
    /// One-line rendering: `[12:00:01] outbound setParameters {...}`.
    pub fn render(&self) -> String {
        let direction = match self.direction {
            Direction::Outbound => "outbound",
            Direction::Inbound => "inbound",
            Direction::Error => "error",
        };
        format!(
            "[{}] {} {} {}",
            self.timestamp.format("%H:%M:%S"),
            direction,
            self.label,
            self.payload
        )
    }
}

/// Append-only log, newest entry first.
///
/// Unbounded unless a capacity is given, in which case the oldest entries
/// are evicted.
#[derive(Debug, Default)]
pub struct PayloadLog {
    entries: VecDeque<PayloadEntry>,
    capacity: Option<usize>,
}

impl PayloadLog {
    pub fn new(capacity: Option<usize>) -> Self {
        Self { entries: VecDeque::new(), capacity }
    }

    pub fn record(&mut self, direction: Direction, label: impl Into<String>, payload: Value) {
        let entry = PayloadEntry {
            timestamp: Utc::now(),
            direction,
            label: label.into(),
            payload,
        };

        debug!(
            target: "payload_log",
            direction = ?entry.direction,
            label = %entry.label,
            payload = %redact_sensitive_data(&entry.payload.to_string()),
            "Payload recorded"
        );

        self.entries.push_front(entry);
        if let Some(cap) = self.capacity {
            self.entries.truncate(cap);
        }
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &PayloadEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&PayloadEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, direction: Direction, label: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| e.direction == direction && e.label == label)
            .count()
    }
}
