use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle events emitted by the chat widget.
///
/// Names follow the widget's DOM events (`ready`, `opened-changed`,
/// `request-sent`, `response-received`, `error`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum WidgetEvent {
    /// The widget finished loading and accepts calls.
    Ready,
    /// The chat window was opened or closed.
    OpenedChanged { opened: bool },
    /// An outbound request left the widget.
    #[serde(rename_all = "camelCase")]
    RequestSent { request_body: Value },
    /// The bot answered.
    ResponseReceived { body: Value },
    /// The widget reported an error.
    Error { error: String },
}

impl WidgetEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WidgetEvent::Ready => "ready",
            WidgetEvent::OpenedChanged { .. } => "opened-changed",
            WidgetEvent::RequestSent { .. } => "request-sent",
            WidgetEvent::ResponseReceived { .. } => "response-received",
            WidgetEvent::Error { .. } => "error",
        }
    }
}

impl std::fmt::Display for WidgetEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Severity of a user-visible notice (toast).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// A short message surfaced to the person using the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_sent_uses_dom_event_shape() {
        let event = WidgetEvent::RequestSent { request_body: json!({"queryInput": {}}) };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "request-sent");
        assert!(value.get("requestBody").is_some());
    }

    #[test]
    fn parses_opened_changed() {
        let event: WidgetEvent =
            serde_json::from_str(r#"{"type":"opened-changed","opened":true}"#).unwrap();
        assert_eq!(event, WidgetEvent::OpenedChanged { opened: true });
        assert_eq!(event.to_string(), "opened-changed");
    }
}
