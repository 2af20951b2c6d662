//! User-Agent classifier: the fallback environment provider.
//!
//! Platforms and browsers are matched against fixed, ordered signature
//! tables. The first matching signature wins, so specific tokens are listed
//! before the generic tokens they embed (`Edg/` before `Chrome/`, `iPhone`
//! before `Mac OS X`, `Android` before `Linux`). Anything unmatched stays an
//! empty string.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use paramsync_core::{DeviceKind, EnvironmentInfo};

use crate::probe::{CapabilityProvider, ProbeError};

/// How the device model is read once a platform signature matched.
#[derive(Debug, Clone, Copy)]
enum ModelSource {
    None,
    Literal(&'static str),
    AndroidBuild,
}

/// How the device kind is derived once a platform signature matched.
#[derive(Debug, Clone, Copy)]
enum KindSource {
    Fixed(DeviceKind),
    /// Android phones carry a `Mobile` token, tablets don't.
    MobileToken,
}

struct PlatformSignature {
    platform: &'static str,
    pattern: Regex,
    model: ModelSource,
    kind: KindSource,
}

struct BrowserSignature {
    brand: &'static str,
    pattern: Regex,
}

fn platform(
    platform: &'static str,
    pattern: &str,
    model: ModelSource,
    kind: KindSource,
) -> PlatformSignature {
    PlatformSignature {
        platform,
        pattern: Regex::new(pattern).unwrap(),
        model,
        kind,
    }
}

fn browser(brand: &'static str, pattern: &str) -> BrowserSignature {
    BrowserSignature { brand, pattern: Regex::new(pattern).unwrap() }
}

/// Platform signatures in priority order. Capture group 1 is the OS version.
static PLATFORMS: Lazy<Vec<PlatformSignature>> = Lazy::new(|| {
    use DeviceKind::*;
    use KindSource::*;
    use ModelSource::*;
    vec![
        platform("Windows Phone", r"Windows Phone(?: OS)? ([\d.]+)", None, Fixed(Mobile)),
        platform("iOS", r"iPhone(?:.*? OS ([\d_]+))?", Literal("iPhone"), Fixed(Mobile)),
        platform("iOS", r"iPad(?:.*? OS ([\d_]+))?", Literal("iPad"), Fixed(Tablet)),
        platform("iOS", r"iPod(?:.*? OS ([\d_]+))?", Literal("iPod"), Fixed(Mobile)),
        platform("Android", r"Android(?: ([\d.]+))?", AndroidBuild, MobileToken),
        platform("Chrome OS", r"CrOS \S+ ([\d.]+)", None, Fixed(Desktop)),
        platform("Windows", r"Windows NT ([\d.]+)", None, Fixed(Desktop)),
        platform("macOS", r"Mac OS X(?: ([\d_.]+))?", None, Fixed(Desktop)),
        platform("Linux", r"Linux()", None, Fixed(Desktop)),
    ]
});

/// Browser signatures in priority order. Capture group 1 is the version.
static BROWSERS: Lazy<Vec<BrowserSignature>> = Lazy::new(|| {
    vec![
        browser("Microsoft Edge", r"Edg(?:e|A|iOS)?/([\d.]+)"),
        browser("Opera", r"(?:OPR|OPT|Opera)/([\d.]+)"),
        browser("Samsung Internet", r"SamsungBrowser/([\d.]+)"),
        browser("Firefox", r"(?:Firefox|FxiOS)/([\d.]+)"),
        browser("Chrome", r"CriOS/([\d.]+)"),
        browser("Chrome", r"(?:Chrome|Chromium)/([\d.]+)"),
        browser("Safari", r"Version/([\d.]+)(?:\s+Mobile/\S+)?\s+Safari/"),
    ]
});

/// `Android 13; Pixel 7)` / `Android 4.0.3; ko-kr; LG-L160L Build/IML74K)`
static ANDROID_MODEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Android[^;)]*;\s*(?:[a-z]{2}(?:[-_][A-Za-z]{2})?;\s*)?([^;)]+?)(?:\s+Build/[^;)]*)?\s*[;)]")
        .unwrap()
});

/// Tokens that sit in the model slot but name no device.
const PLACEHOLDER_MODELS: &[&str] = &["Mobile", "Tablet", "K", "wv", "U"];

/// Classify a User-Agent string. Never fails; unknown parts stay empty.
pub fn classify(user_agent: &str) -> EnvironmentInfo {
    let mut info = EnvironmentInfo::default();

    if let Some((sig, caps)) = PLATFORMS
        .iter()
        .find_map(|sig| sig.pattern.captures(user_agent).map(|caps| (sig, caps)))
    {
        info.os_platform = sig.platform.to_string();
        info.os_version = caps
            .get(1)
            .map(|m| m.as_str().replace('_', "."))
            .unwrap_or_default();
        info.device_model = match sig.model {
            ModelSource::None => String::new(),
            ModelSource::Literal(model) => model.to_string(),
            ModelSource::AndroidBuild => android_model(user_agent),
        };
        info.device_kind = Some(match sig.kind {
            KindSource::Fixed(kind) => kind,
            KindSource::MobileToken if user_agent.contains("Mobile") => DeviceKind::Mobile,
            KindSource::MobileToken => DeviceKind::Tablet,
        });
    }

    if let Some((sig, caps)) = BROWSERS
        .iter()
        .find_map(|sig| sig.pattern.captures(user_agent).map(|caps| (sig, caps)))
    {
        info.browser_brand = sig.brand.to_string();
        info.browser_version = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
    }

    info
}

fn android_model(user_agent: &str) -> String {
    ANDROID_MODEL
        .captures(user_agent)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|model| !PLACEHOLDER_MODELS.contains(model) && !model.starts_with("rv:"))
        .map(str::to_string)
        .unwrap_or_default()
}

/// Fallback provider: always available, classifies a fixed User-Agent.
#[derive(Debug, Clone)]
pub struct UserAgentClassifier {
    user_agent: String,
}

impl UserAgentClassifier {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self { user_agent: user_agent.into() }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn classify(&self) -> EnvironmentInfo {
        classify(&self.user_agent)
    }
}

#[async_trait]
impl CapabilityProvider for UserAgentClassifier {
    fn name(&self) -> &str {
        "user-agent"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn probe(&self) -> Result<EnvironmentInfo, ProbeError> {
        Ok(self.classify())
    }
}
