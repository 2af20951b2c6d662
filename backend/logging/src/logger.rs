//! Subscriber setup for the `paramsync` binary.
//!
//! Human-readable lines go to stderr (stdout belongs to the REPL and demo
//! output); every event is also written as NDJSON to a daily file through a
//! non-blocking writer.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "paramsync.log";

/// `RUST_LOG` when set and valid, else `level`, else `info`.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Targets are only interesting once someone asks for debug output.
fn wants_targets(level: &str) -> bool {
    matches!(level.trim().to_ascii_lowercase().as_str(), "debug" | "trace")
}

/// Install the global subscriber. Keep the returned guard alive for the
/// life of the process; dropping it flushes and closes the log file.
///
/// A second call leaves the existing subscriber in place.
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str) -> WorkerGuard {
    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .json()
        .with_current_span(false)
        .with_writer(file_writer)
        .with_ansi(false);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(wants_targets(level))
        .with_ansi(true);

    let _ = tracing_subscriber::registry()
        .with(build_filter(level))
        .with(console_layer)
        .with(file_layer)
        .try_init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_shown_only_when_verbose() {
        assert!(wants_targets("DEBUG"));
        assert!(wants_targets("trace"));
        assert!(!wants_targets("info"));
    }
}
