//! High-entropy client hints provider (`navigator.userAgentData`).
//!
//! The query may be missing (non-Chromium browsers), denied by permissions
//! policy, or hang; each case maps to a [`ProbeError`] and the caller falls
//! back to the classifier.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use paramsync_core::{DeviceKind, EnvironmentInfo};

use crate::probe::{CapabilityProvider, ProbeError};

/// Hints requested from the high-entropy query.
pub const REQUESTED_HINTS: &[&str] = &["model", "platformVersion", "fullVersionList"];

/// One `{brand, version}` entry of a brand list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandVersion {
    pub brand: String,
    pub version: String,
}

/// Result shape of `getHighEntropyValues`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HighEntropyValues {
    pub brands: Vec<BrandVersion>,
    pub full_version_list: Vec<BrandVersion>,
    pub mobile: bool,
    pub model: String,
    pub platform: String,
    pub platform_version: String,
}

/// Host side of the client hints API.
#[async_trait]
pub trait HighEntropySource: Send + Sync {
    /// Whether the API exists at all in this browser.
    fn is_supported(&self) -> bool;

    async fn get_high_entropy_values(
        &self,
        hints: &[&str],
    ) -> Result<HighEntropyValues, ProbeError>;
}

/// GREASE entries such as `Not_A Brand` or `Not)A;Brand` carry no information.
fn is_grease(brand: &str) -> bool {
    brand.contains("Not") && brand.contains("Brand")
}

/// Pick the most specific brand: a named browser beats the `Chromium` engine token.
fn pick_brand(list: &[BrandVersion]) -> Option<&BrandVersion> {
    let real = || list.iter().filter(|b| !is_grease(&b.brand));
    real()
        .find(|b| b.brand != "Chromium")
        .or_else(|| real().next())
}

impl HighEntropyValues {
    pub fn to_environment(&self) -> EnvironmentInfo {
        let list = if self.full_version_list.is_empty() {
            &self.brands
        } else {
            &self.full_version_list
        };
        let (browser_brand, browser_version) = pick_brand(list)
            .map(|b| (b.brand.clone(), b.version.clone()))
            .unwrap_or_default();

        EnvironmentInfo {
            browser_brand,
            browser_version,
            device_model: self.model.clone(),
            os_platform: self.platform.clone(),
            os_version: self.platform_version.clone(),
            // `mobile == false` cannot tell tablets from desktops.
            device_kind: self.mobile.then_some(DeviceKind::Mobile),
        }
    }
}

/// Native provider backed by a [`HighEntropySource`], bounded by a timeout.
pub struct ClientHintsProvider {
    source: Arc<dyn HighEntropySource>,
    timeout: Duration,
}

impl ClientHintsProvider {
    pub fn new(source: Arc<dyn HighEntropySource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }
}

#[async_trait]
impl CapabilityProvider for ClientHintsProvider {
    fn name(&self) -> &str {
        "client-hints"
    }

    fn is_available(&self) -> bool {
        self.source.is_supported()
    }

    async fn probe(&self) -> Result<EnvironmentInfo, ProbeError> {
        let values = tokio::time::timeout(
            self.timeout,
            self.source.get_high_entropy_values(REQUESTED_HINTS),
        )
        .await
        .map_err(|_| ProbeError::TimedOut(self.timeout.as_millis() as u64))??;

        debug!(platform = %values.platform, mobile = values.mobile, "Client hints resolved");
        Ok(values.to_environment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bv(brand: &str, version: &str) -> BrandVersion {
        BrandVersion { brand: brand.into(), version: version.into() }
    }

    struct FixedSource(Result<HighEntropyValues, ProbeError>);

    #[async_trait]
    impl HighEntropySource for FixedSource {
        fn is_supported(&self) -> bool {
            true
        }

        async fn get_high_entropy_values(
            &self,
            _hints: &[&str],
        ) -> Result<HighEntropyValues, ProbeError> {
            self.0.clone()
        }
    }

    struct HangingSource;

    #[async_trait]
    impl HighEntropySource for HangingSource {
        fn is_supported(&self) -> bool {
            true
        }

        async fn get_high_entropy_values(
            &self,
            _hints: &[&str],
        ) -> Result<HighEntropyValues, ProbeError> {
            std::future::pending().await
        }
    }

    #[test]
    fn named_brand_beats_chromium_and_grease() {
        let values = HighEntropyValues {
            full_version_list: vec![
                bv("Not_A Brand", "8.0.0.0"),
                bv("Chromium", "120.0.6099.130"),
                bv("Google Chrome", "120.0.6099.130"),
            ],
            platform: "Windows".into(),
            platform_version: "15.0.0".into(),
            ..Default::default()
        };
        let info = values.to_environment();
        assert_eq!(info.browser_brand, "Google Chrome");
        assert_eq!(info.browser_version, "120.0.6099.130");
        assert_eq!(info.os_version, "15.0.0");
        assert_eq!(info.device_kind, None);
    }

    #[test]
    fn falls_back_to_low_entropy_brands() {
        let values = HighEntropyValues {
            brands: vec![bv("Not)A;Brand", "99"), bv("Chromium", "120")],
            mobile: true,
            model: "Pixel 7".into(),
            ..Default::default()
        };
        let info = values.to_environment();
        assert_eq!(info.browser_brand, "Chromium");
        assert_eq!(info.device_model, "Pixel 7");
        assert_eq!(info.device_kind, Some(DeviceKind::Mobile));
    }

    #[tokio::test]
    async fn denial_is_reported() {
        let provider = ClientHintsProvider::new(
            Arc::new(FixedSource(Err(ProbeError::Denied("policy".into())))),
            Duration::from_millis(50),
        );
        assert!(matches!(provider.probe().await, Err(ProbeError::Denied(_))));
    }

    #[tokio::test]
    async fn hanging_query_times_out() {
        let provider =
            ClientHintsProvider::new(Arc::new(HangingSource), Duration::from_millis(10));
        assert!(matches!(provider.probe().await, Err(ProbeError::TimedOut(10))));
    }
}
