//! Cosmetic decoration of the widget's UI.
//!
//! The widget's element tree is opaque and renders asynchronously, so
//! injection is polled on a fixed interval with a hard attempt ceiling. A
//! run whose epoch went stale (the session was reset meanwhile) stops
//! without touching anything.

use std::time::Duration;

use async_trait::async_trait;
use paramsync_config::DecorationConfig;
use tracing::{debug, info};

use crate::session_state::EpochToken;

/// A best-effort cosmetic change applied to the widget's UI.
#[async_trait]
pub trait Decorator: Send + Sync {
    fn name(&self) -> &str;

    /// Try once. `false` means the target element is not there yet.
    async fn try_inject(&self) -> bool;
}

/// How a decoration run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationOutcome {
    Injected { attempts: u32 },
    /// Attempts exhausted; given up silently.
    Abandoned { attempts: u32 },
    /// The session moved on before injection succeeded.
    Superseded { attempts: u32 },
}

/// Fixed-interval polling schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySchedule {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl From<&DecorationConfig> for RetrySchedule {
    fn from(config: &DecorationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            interval: Duration::from_millis(config.interval_ms),
        }
    }
}

/// Poll `decorator` until it succeeds, the schedule runs out, or `token` goes stale.
pub async fn decorate_with_retry(
    decorator: &dyn Decorator,
    schedule: RetrySchedule,
    token: &EpochToken,
) -> DecorationOutcome {
    let mut attempts = 0;
    while attempts < schedule.max_attempts {
        if !token.is_current() {
            debug!(decorator = decorator.name(), attempts, "Decoration superseded");
            return DecorationOutcome::Superseded { attempts };
        }

        attempts += 1;
        if decorator.try_inject().await {
            info!(decorator = decorator.name(), attempts, "Decoration injected");
            return DecorationOutcome::Injected { attempts };
        }

        if attempts < schedule.max_attempts {
            tokio::time::sleep(schedule.interval).await;
        }
    }

    debug!(decorator = decorator.name(), attempts, "Decoration target never appeared");
    DecorationOutcome::Abandoned { attempts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session_state::SessionState;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Succeeds on the `ready_after`-th call.
    struct LateTarget {
        calls: AtomicU32,
        ready_after: u32,
    }

    #[async_trait]
    impl Decorator for LateTarget {
        fn name(&self) -> &str {
            "late-target"
        }

        async fn try_inject(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst) + 1 >= self.ready_after
        }
    }

    fn schedule(max_attempts: u32) -> RetrySchedule {
        RetrySchedule { max_attempts, interval: Duration::from_millis(1) }
    }

    #[tokio::test]
    async fn injects_once_target_appears() {
        let state = SessionState::new();
        let target = LateTarget { calls: AtomicU32::new(0), ready_after: 3 };
        let outcome = decorate_with_retry(&target, schedule(5), &state.epoch().token()).await;
        assert_eq!(outcome, DecorationOutcome::Injected { attempts: 3 });
    }

    #[tokio::test]
    async fn gives_up_at_ceiling() {
        let state = SessionState::new();
        let target = LateTarget { calls: AtomicU32::new(0), ready_after: u32::MAX };
        let outcome = decorate_with_retry(&target, schedule(4), &state.epoch().token()).await;
        assert_eq!(outcome, DecorationOutcome::Abandoned { attempts: 4 });
        assert_eq!(target.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn stale_token_does_nothing() {
        let mut state = SessionState::new();
        let token = state.epoch().token();
        state.begin_new_session();
        let target = LateTarget { calls: AtomicU32::new(0), ready_after: 1 };
        let outcome = decorate_with_retry(&target, schedule(4), &token).await;
        assert_eq!(outcome, DecorationOutcome::Superseded { attempts: 0 });
        assert_eq!(target.calls.load(Ordering::SeqCst), 0);
    }
}
