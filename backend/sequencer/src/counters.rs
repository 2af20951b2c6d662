//! Session counter manager.
//!
//! `session_count` lives in the durable store; the initialized marker and
//! `message_count` live in the session store and die with the logical
//! session.

use std::sync::Arc;

use paramsync_core::{KeyValueStore, SessionCounters, SyncError};
use tracing::{debug, info, warn};

pub const SESSION_COUNT_KEY: &str = "paramsync.session_count";
pub const SESSION_INITIALIZED_KEY: &str = "paramsync.session_initialized";
pub const MESSAGE_COUNT_KEY: &str = "paramsync.message_count";

/// Result of counting one outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Stored; carries the new count.
    Counted(u32),
    /// The count would pass the ceiling. Nothing was stored; the caller
    /// must start a new session.
    LimitExceeded { attempted: u32, ceiling: u32 },
}

pub struct SessionCounterManager {
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    ceiling: u32,
}

impl SessionCounterManager {
    pub fn new(
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        ceiling: u32,
    ) -> Self {
        Self { durable, session, ceiling }
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    pub fn is_initialized(&self) -> Result<bool, SyncError> {
        Ok(self.session.get(SESSION_INITIALIZED_KEY)?.as_deref() == Some("true"))
    }

    /// Count a new logical session, at most once until the marker is cleared.
    ///
    /// Returns whether the lifetime counter moved.
    pub fn increment_session(&self) -> Result<bool, SyncError> {
        if self.is_initialized()? {
            debug!("Session already initialized; not counting again");
            return Ok(false);
        }

        let session_count = read_counter(self.durable.as_ref(), SESSION_COUNT_KEY)? + 1;
        self.durable.set(SESSION_COUNT_KEY, &session_count.to_string())?;
        self.session.set(MESSAGE_COUNT_KEY, "0")?;
        self.session.set(SESSION_INITIALIZED_KEY, "true")?;

        info!(session_count, "Logical session started");
        Ok(true)
    }

    /// Count one outbound message against the ceiling.
    pub fn increment_message(&self) -> Result<MessageOutcome, SyncError> {
        let attempted = self.message_count()? + 1;
        if attempted > self.ceiling {
            warn!(attempted, ceiling = self.ceiling, "Message ceiling exceeded");
            return Ok(MessageOutcome::LimitExceeded { attempted, ceiling: self.ceiling });
        }
        self.session.set(MESSAGE_COUNT_KEY, &attempted.to_string())?;
        debug!(message_count = attempted, "Outbound message counted");
        Ok(MessageOutcome::Counted(attempted))
    }

    pub fn current_counts(&self) -> Result<SessionCounters, SyncError> {
        Ok(SessionCounters {
            session_count: read_counter(self.durable.as_ref(), SESSION_COUNT_KEY)?,
            message_count: self.message_count()?,
        })
    }

    /// Zero the message count, clear the marker, and count the new session.
    pub fn reset_for_new_session(&self) -> Result<SessionCounters, SyncError> {
        self.session.set(MESSAGE_COUNT_KEY, "0")?;
        self.session.remove(SESSION_INITIALIZED_KEY)?;
        self.increment_session()?;
        self.current_counts()
    }

    fn message_count(&self) -> Result<u32, SyncError> {
        let count = read_counter(self.session.as_ref(), MESSAGE_COUNT_KEY)?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

/// Missing or unparseable values read as zero.
fn read_counter(store: &dyn KeyValueStore, key: &str) -> Result<u64, SyncError> {
    let Some(raw) = store.get(key)? else {
        return Ok(0);
    };
    Ok(raw.trim().parse().unwrap_or_else(|_| {
        warn!(key, value = %raw, "Unparseable counter; treating as 0");
        0
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn manager(ceiling: u32) -> (SessionCounterManager, Arc<MemoryStore>) {
        let durable = Arc::new(MemoryStore::new());
        let manager =
            SessionCounterManager::new(durable.clone(), Arc::new(MemoryStore::new()), ceiling);
        (manager, durable)
    }

    #[test]
    fn fresh_storage_reads_zero() {
        let (counters, _) = manager(30);
        assert_eq!(counters.current_counts().unwrap(), SessionCounters::default());
        assert!(!counters.is_initialized().unwrap());
    }

    #[test]
    fn session_counts_once_until_reset() {
        let (counters, _) = manager(30);
        assert!(counters.increment_session().unwrap());
        assert!(!counters.increment_session().unwrap());
        assert_eq!(counters.current_counts().unwrap().session_count, 1);
    }

    #[test]
    fn messages_count_up_to_ceiling() {
        let (counters, _) = manager(30);
        counters.increment_session().unwrap();
        for n in 1..=30 {
            assert_eq!(counters.increment_message().unwrap(), MessageOutcome::Counted(n));
        }
        assert_eq!(
            counters.increment_message().unwrap(),
            MessageOutcome::LimitExceeded { attempted: 31, ceiling: 30 }
        );
        // The overflowing message is never stored.
        assert_eq!(counters.current_counts().unwrap().message_count, 30);
    }

    #[test]
    fn reset_zeroes_messages_and_counts_session() {
        let (counters, _) = manager(30);
        counters.increment_session().unwrap();
        for _ in 0..3 {
            counters.increment_message().unwrap();
        }
        let after = counters.reset_for_new_session().unwrap();
        assert_eq!(after, SessionCounters { session_count: 2, message_count: 0 });
        assert!(counters.is_initialized().unwrap());
        // A late widget-ready in the new session must not count it twice.
        assert!(!counters.increment_session().unwrap());
    }

    #[test]
    fn durable_count_survives_new_session_store() {
        let (first, durable) = manager(30);
        first.increment_session().unwrap();

        // Browser restart: same durable store, empty session store.
        let second = SessionCounterManager::new(durable, Arc::new(MemoryStore::new()), 30);
        assert!(second.increment_session().unwrap());
        assert_eq!(second.current_counts().unwrap().session_count, 2);
    }

    #[test]
    fn garbage_counter_reads_zero() {
        let (counters, durable) = manager(30);
        durable.set(SESSION_COUNT_KEY, "abc").unwrap();
        assert_eq!(counters.current_counts().unwrap().session_count, 0);
    }
}
