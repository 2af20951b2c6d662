//! Terminal output: ANSI notes, tables, and the console page sink.

use paramsync_core::{Notice, NoticeLevel, PageSink, ParameterSet, SessionCounters};
use paramsync_logging::PayloadLog;

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // Skip until 'm'
            for next in chars.by_ref() {
                if next == 'm' { break; }
            }
        } else {
            result.push(c);
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Formatted notes
// ---------------------------------------------------------------------------

pub fn note_info(msg: &str) {
    if supports_color() {
        println!("{CYAN}{BOLD}ℹ{RESET} {msg}");
    } else {
        println!("INFO: {msg}");
    }
}

pub fn note_warn(msg: &str) {
    if supports_color() {
        println!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        println!("WARN: {msg}");
    }
}

pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

pub fn note_success(msg: &str) {
    if supports_color() {
        println!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        println!("OK: {msg}");
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Render left-aligned rows under a bold header.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(strip_ansi(cell).chars().count());
        }
    }

    let pad = |cell: &str, width: usize| {
        let visible = strip_ansi(cell).chars().count();
        format!("{cell}{}", " ".repeat(width.saturating_sub(visible)))
    };

    let mut out = String::new();
    let header: Vec<String> = headers.iter().zip(&widths).map(|(h, w)| pad(*h, *w)).collect();
    out.push_str(&format!("{BOLD}  {}  {RESET}\n", header.join("  ")));

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("  {}  \n", sep.join("  ")));

    for row in rows {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| pad(row.get(i).map(String::as_str).unwrap_or(""), *w))
            .collect();
        out.push_str(&format!("  {}  \n", cells.join("  ")));
    }
    out
}

pub fn render_counts(counts: &SessionCounters, ceiling: u32) -> String {
    render_table(
        &["session_count", "message_count", "ceiling"],
        &[vec![
            counts.session_count.to_string(),
            counts.message_count.to_string(),
            ceiling.to_string(),
        ]],
    )
}

/// The newest `limit` payload log entries, one per line.
pub fn render_payload_log(log: &PayloadLog, limit: usize) -> String {
    if log.is_empty() {
        return format!("{DIM}(payload log is empty){RESET}\n");
    }
    let mut out = String::new();
    for entry in log.entries().take(limit) {
        out.push_str(&entry.render());
        out.push('\n');
    }
    if log.len() > limit {
        out.push_str(&format!("{DIM}... {} older entries{RESET}\n", log.len() - limit));
    }
    out
}

// ---------------------------------------------------------------------------
// Page sink
// ---------------------------------------------------------------------------

/// Prints notices as terminal notes; previews only when asked to.
pub struct ConsoleSink {
    show_previews: bool,
}

impl ConsoleSink {
    pub fn new(show_previews: bool) -> Self {
        Self { show_previews }
    }
}

impl PageSink for ConsoleSink {
    fn show_preview(&self, params: &ParameterSet) {
        if self.show_previews {
            println!("{}", params.render_preview());
        }
    }

    fn notify(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Info => note_info(&notice.message),
            NoticeLevel::Warning => note_warn(&notice.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ansi() {
        let colored = format!("{GREEN}hello{RESET}");
        assert_eq!(strip_ansi(&colored), "hello");
    }

    #[test]
    fn renders_counts_table() {
        let table = render_counts(&SessionCounters { session_count: 2, message_count: 7 }, 30);
        let plain = strip_ansi(&table);
        assert!(plain.contains("session_count"));
        assert!(plain.contains("  2  "));
        assert!(plain.contains("30"));
    }

    #[test]
    fn empty_log_renders_placeholder() {
        let log = PayloadLog::default();
        assert!(strip_ansi(&render_payload_log(&log, 5)).contains("empty"));
    }
}
