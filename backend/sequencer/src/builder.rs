//! Parameter builder: form + page + environment + counters -> payload.

use paramsync_core::{
    EnvironmentInfo, FormState, PageContext, ParameterSet, SessionCounters,
};

/// Trimmed value, or `None` when blank.
fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Build a fresh payload. Pure: reads its inputs, mutates nothing.
///
/// `region` is present (possibly empty) unless `form.omit_region` is set,
/// in which case the key is left out entirely.
pub fn build(
    form: &FormState,
    page: &PageContext,
    env: &EnvironmentInfo,
    counters: SessionCounters,
) -> ParameterSet {
    let device = form.device.or(env.device_kind).unwrap_or_default();

    ParameterSet {
        language: form.language.trim().to_string(),
        user_id: optional(&form.user_id),
        email: optional(&form.email),
        user_tier: optional(&form.user_tier),
        is_debug_mode: form.debug_mode,
        device,
        page_url: page.url.clone(),
        page_path: page.path.clone(),
        page_title: page.title.clone(),
        user_agent: page.user_agent.clone(),
        region: (!form.omit_region).then(|| form.region.trim().to_string()),
        country_code: optional(&form.country_code),
        browser_brand: env.browser_brand.clone(),
        browser_version: env.browser_version.clone(),
        device_model: env.device_model.clone(),
        os_platform: env.os_platform.clone(),
        os_version: env.os_version.clone(),
        session_count: counters.session_count,
        message_count: counters.message_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paramsync_core::DeviceKind;

    fn page() -> PageContext {
        PageContext {
            url: "https://demo.example/chat?x=1".into(),
            path: "/chat".into(),
            title: "Chat demo".into(),
            user_agent: "test-agent".into(),
        }
    }

    #[test]
    fn region_present_unless_omitted() {
        let env = EnvironmentInfo::default();
        let counters = SessionCounters::default();

        for region in ["", "HK", "  SG  "] {
            let mut form = FormState { region: region.into(), ..Default::default() };
            let params = build(&form, &page(), &env, counters);
            assert!(params.contains("region"), "region {region:?} should be present");
            assert_eq!(params.region.as_deref(), Some(region.trim()));

            form.omit_region = true;
            let params = build(&form, &page(), &env, counters);
            assert!(!params.contains("region"));
            assert!(!params.render_preview().contains("region"));
        }
    }

    #[test]
    fn blank_identity_fields_are_dropped() {
        let form = FormState {
            user_id: "   ".into(),
            email: " a@example.com ".into(),
            ..Default::default()
        };
        let params = build(&form, &page(), &EnvironmentInfo::default(), SessionCounters::default());
        assert!(!params.contains("userId"));
        assert_eq!(params.email.as_deref(), Some("a@example.com"));
        assert!(!params.contains("userTier"));
    }

    #[test]
    fn explicit_device_beats_probe() {
        let env = EnvironmentInfo { device_kind: Some(DeviceKind::Mobile), ..Default::default() };
        let auto = build(&FormState::default(), &page(), &env, SessionCounters::default());
        assert_eq!(auto.device, DeviceKind::Mobile);

        let form = FormState { device: Some(DeviceKind::Tablet), ..Default::default() };
        let fixed = build(&form, &page(), &env, SessionCounters::default());
        assert_eq!(fixed.device, DeviceKind::Tablet);

        let unknown =
            build(&FormState::default(), &page(), &EnvironmentInfo::default(), SessionCounters::default());
        assert_eq!(unknown.device, DeviceKind::Desktop);
    }

    #[test]
    fn counters_and_page_are_reflected() {
        let counters = SessionCounters { session_count: 4, message_count: 7 };
        let params = build(&FormState::default(), &page(), &EnvironmentInfo::default(), counters);
        let map = params.to_map();
        assert_eq!(map["session_count"], 4);
        assert_eq!(map["message_count"], 7);
        assert_eq!(map["pagePath"], "/chat");
        assert_eq!(map["userAgent"], "test-agent");
    }
}
