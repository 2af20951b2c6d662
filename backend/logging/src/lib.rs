//! Structured logging for paramsync.
//!
//! Handles subscriber setup, redaction of personal data, and the page-facing
//! payload log of outbound/inbound widget traffic.

pub mod logger;
pub mod payload_log;
pub mod redact;

pub use logger::init_logger;
pub use payload_log::{Direction, PayloadEntry, PayloadLog};
pub use redact::redact_sensitive_data;
