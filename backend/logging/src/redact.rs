//! Log Redaction Layer
//!
//! Scrubs email addresses and phone numbers from payloads before they reach
//! the tracing output. The page-facing payload log keeps raw values.

use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
});
static TELEPHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,3}[-.\s]?)?\(?\d{3,4}\)?[-.\s]\d{3,4}[-.\s]?\d{4}").unwrap()
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = EMAIL_RE.replace_all(input, "[REDACTED_EMAIL]");
    TELEPHONE_RE
        .replace_all(&redacted, "[REDACTED_PHONE]")
        .into_owned()
}
