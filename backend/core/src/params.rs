//! Parameter payload and the inputs it is derived from.
//!
//! `ParameterSet` serializes to the exact key layout the bot expects:
//! camelCase for page/user fields, snake_case for the two counters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Coarse device classification sent as the `device` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Desktop,
    Mobile,
    Tablet,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Desktop => "desktop",
            DeviceKind::Mobile => "mobile",
            DeviceKind::Tablet => "tablet",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(DeviceKind::Desktop),
            "mobile" => Ok(DeviceKind::Mobile),
            "tablet" => Ok(DeviceKind::Tablet),
            other => Err(format!("unknown device kind: {other}")),
        }
    }
}

/// Current values of the page's form controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormState {
    pub language: String,
    pub region: String,
    pub country_code: String,
    pub user_id: String,
    pub email: String,
    pub user_tier: String,
    pub debug_mode: bool,
    /// Explicit device selector; `None` means "auto" (use the probe).
    pub device: Option<DeviceKind>,
    /// Test mode: leave `region` out of the payload entirely.
    pub omit_region: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            region: "HK".to_string(),
            country_code: "852".to_string(),
            user_id: String::new(),
            email: String::new(),
            user_tier: String::new(),
            debug_mode: false,
            device: None,
            omit_region: false,
        }
    }
}

/// Location of the hosting page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageContext {
    pub url: String,
    pub path: String,
    pub title: String,
    /// Free-text identification string (User-Agent).
    pub user_agent: String,
}

/// Browser / OS facts gathered by the environment probe.
///
/// Every field is best-effort: an empty string means "unknown".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentInfo {
    pub browser_brand: String,
    pub browser_version: String,
    pub device_model: String,
    pub os_platform: String,
    pub os_version: String,
    pub device_kind: Option<DeviceKind>,
}

impl EnvironmentInfo {
    pub fn is_empty(&self) -> bool {
        self.browser_brand.is_empty()
            && self.browser_version.is_empty()
            && self.device_model.is_empty()
            && self.os_platform.is_empty()
            && self.os_version.is_empty()
            && self.device_kind.is_none()
    }

    /// Fill every unknown field from `other`, keeping known values.
    pub fn backfill(&mut self, other: &EnvironmentInfo) {
        fn fill(slot: &mut String, from: &str) {
            if slot.is_empty() {
                *slot = from.to_string();
            }
        }
        fill(&mut self.browser_brand, &other.browser_brand);
        fill(&mut self.browser_version, &other.browser_version);
        fill(&mut self.device_model, &other.device_model);
        fill(&mut self.os_platform, &other.os_platform);
        fill(&mut self.os_version, &other.os_version);
        if self.device_kind.is_none() {
            self.device_kind = other.device_kind;
        }
    }
}

/// Snapshot of the two session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCounters {
    /// Lifetime count of logical sessions, durable across restarts.
    pub session_count: u64,
    /// Outbound messages in the current logical session.
    pub message_count: u32,
}

/// The key-value context pushed into the widget.
///
/// Optional fields are skipped rather than serialized as `null`: the bot
/// treats a missing key as an unfilled slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSet {
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_tier: Option<String>,
    pub is_debug_mode: bool,
    pub device: DeviceKind,
    pub page_url: String,
    pub page_path: String,
    pub page_title: String,
    pub user_agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    pub browser_brand: String,
    pub browser_version: String,
    pub device_model: String,
    pub os_platform: String,
    pub os_version: String,
    #[serde(rename = "session_count")]
    pub session_count: u64,
    #[serde(rename = "message_count")]
    pub message_count: u32,
}

impl ParameterSet {
    /// Parameter name to scalar value, as the widget receives it.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.to_map().contains_key(key)
    }

    /// Pretty-printed JSON for the live preview pane.
    pub fn render_preview(&self) -> String {
        serde_json::to_string_pretty(&Value::Object(self.to_map())).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParameterSet {
        ParameterSet {
            language: "en".into(),
            user_id: None,
            email: Some("a@example.com".into()),
            user_tier: None,
            is_debug_mode: true,
            device: DeviceKind::Mobile,
            page_url: "https://example.com/demo".into(),
            page_path: "/demo".into(),
            page_title: "Demo".into(),
            user_agent: String::new(),
            region: None,
            country_code: Some("852".into()),
            browser_brand: "Chrome".into(),
            browser_version: "120.0".into(),
            device_model: String::new(),
            os_platform: "Android".into(),
            os_version: "14".into(),
            session_count: 2,
            message_count: 5,
        }
    }

    #[test]
    fn counters_keep_snake_case_keys() {
        let map = sample().to_map();
        assert_eq!(map["session_count"], 2);
        assert_eq!(map["message_count"], 5);
        assert_eq!(map["isDebugMode"], true);
        assert_eq!(map["device"], "mobile");
    }

    #[test]
    fn absent_optionals_are_not_null() {
        let params = sample();
        assert!(!params.contains("region"));
        assert!(!params.contains("userId"));
        assert!(params.contains("email"));
        assert!(!params.render_preview().contains("null"));
    }

    #[test]
    fn backfill_keeps_known_values() {
        let mut native = EnvironmentInfo {
            browser_brand: "Google Chrome".into(),
            ..Default::default()
        };
        let fallback = EnvironmentInfo {
            browser_brand: "Chrome".into(),
            os_platform: "Windows".into(),
            device_kind: Some(DeviceKind::Desktop),
            ..Default::default()
        };
        native.backfill(&fallback);
        assert_eq!(native.browser_brand, "Google Chrome");
        assert_eq!(native.os_platform, "Windows");
        assert_eq!(native.device_kind, Some(DeviceKind::Desktop));
    }

    #[test]
    fn device_kind_parses_case_insensitively() {
        assert_eq!("Tablet".parse::<DeviceKind>().unwrap(), DeviceKind::Tablet);
        assert!("watch".parse::<DeviceKind>().is_err());
    }
}
