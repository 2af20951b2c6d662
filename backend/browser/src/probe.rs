use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use paramsync_core::EnvironmentInfo;

use crate::classifier::UserAgentClassifier;

/// Why an optional capability produced nothing. Never leaves this crate's probe.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("capability unavailable: {0}")]
    Unavailable(String),

    #[error("capability denied: {0}")]
    Denied(String),

    #[error("capability timed out after {0}ms")]
    TimedOut(u64),
}

/// A source of browser / OS facts.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Cheap synchronous check: does the underlying API exist?
    fn is_available(&self) -> bool;

    async fn probe(&self) -> Result<EnvironmentInfo, ProbeError>;
}

/// Strategy composition: the native provider when available, the
/// classifier otherwise. Native blanks are backfilled from the classifier.
pub struct EnvironmentProbe {
    native: Option<Box<dyn CapabilityProvider>>,
    fallback: UserAgentClassifier,
}

impl EnvironmentProbe {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            native: None,
            fallback: UserAgentClassifier::new(user_agent),
        }
    }

    pub fn with_native(mut self, provider: Box<dyn CapabilityProvider>) -> Self {
        self.native = Some(provider);
        self
    }

    pub fn user_agent(&self) -> &str {
        self.fallback.user_agent()
    }

    /// Resolve the environment. Always returns; failures degrade to the classifier.
    pub async fn detect(&self) -> EnvironmentInfo {
        let fallback = self.fallback.classify();

        let Some(native) = self.native.as_ref().filter(|p| p.is_available()) else {
            return fallback;
        };

        match native.probe().await {
            Ok(mut info) => {
                info.backfill(&fallback);
                info
            }
            Err(e) => {
                debug!(provider = native.name(), error = %e, "Native probe failed; using classifier");
                fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramsync_core::DeviceKind;

    const ANDROID: &str = "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.144 Mobile Safari/537.36";

    struct Scripted {
        available: bool,
        result: Result<EnvironmentInfo, ProbeError>,
    }

    #[async_trait]
    impl CapabilityProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn probe(&self) -> Result<EnvironmentInfo, ProbeError> {
            self.result.clone()
        }
    }

    #[tokio::test]
    async fn no_native_uses_classifier() {
        let info = EnvironmentProbe::new(ANDROID).detect().await;
        assert_eq!(info.os_platform, "Android");
        assert_eq!(info.device_model, "Pixel 7");
    }

    #[tokio::test]
    async fn native_result_is_backfilled() {
        let probe = EnvironmentProbe::new(ANDROID).with_native(Box::new(Scripted {
            available: true,
            result: Ok(EnvironmentInfo {
                browser_brand: "Google Chrome".into(),
                os_version: "13.0.0".into(),
                ..Default::default()
            }),
        }));
        let info = probe.detect().await;
        assert_eq!(info.browser_brand, "Google Chrome");
        assert_eq!(info.os_version, "13.0.0");
        assert_eq!(info.os_platform, "Android");
        assert_eq!(info.device_kind, Some(DeviceKind::Mobile));
    }

    #[tokio::test]
    async fn native_failure_is_swallowed() {
        let probe = EnvironmentProbe::new(ANDROID).with_native(Box::new(Scripted {
            available: true,
            result: Err(ProbeError::Denied("blocked".into())),
        }));
        let info = probe.detect().await;
        assert_eq!(info.browser_brand, "Chrome");
    }

    #[tokio::test]
    async fn unavailable_native_is_not_called() {
        let probe = EnvironmentProbe::new("").with_native(Box::new(Scripted {
            available: false,
            result: Ok(EnvironmentInfo {
                browser_brand: "should not appear".into(),
                ..Default::default()
            }),
        }));
        assert!(probe.detect().await.is_empty());
    }
}
