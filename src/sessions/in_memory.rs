//! In-memory session store implementation.
//!
//! The map itself sits behind a short-lived `parking_lot` lock; each entry
//! carries its own `tokio::sync::Mutex`, and `resolve` hands back an owned
//! guard so that a whole turn runs with exclusive access to its session.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::traits::{Session, SessionGuard, SessionStore};

struct SessionEntry {
    handle: Arc<tokio::sync::Mutex<Session>>,
    /// Shadow of the session's activity time, readable without the
    /// per-session lock; used only for eviction ordering.
    last_seen: DateTime<Utc>,
}

/// An in-memory session store backed by a mutex-protected hash map.
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    timeout: Duration,
    max_sessions: usize,
}

impl InMemorySessionStore {
    pub fn new(timeout_secs: u64, max_sessions: usize) -> Self {
        let timeout_secs = i64::try_from(timeout_secs).unwrap_or(i64::MAX);
        Self {
            sessions: Mutex::new(HashMap::new()),
            timeout: Duration::try_seconds(timeout_secs).unwrap_or(Duration::MAX),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Drop the entry with the oldest activity. Caller holds the map lock.
    fn evict_stalest(sessions: &mut HashMap<String, SessionEntry>) {
        let stalest = sessions
            .iter()
            .min_by_key(|(_, entry)| entry.last_seen)
            .map(|(id, _)| id.clone());
        if let Some(id) = stalest {
            warn!(session = %id, "session capacity reached; evicting stalest session");
            sessions.remove(&id);
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn resolve(&self, id: &str, now: DateTime<Utc>) -> Result<SessionGuard> {
        let handle = {
            let mut sessions = self.sessions.lock();
            if let Some(entry) = sessions.get_mut(id) {
                entry.last_seen = now;
                entry.handle.clone()
            } else {
                if sessions.len() >= self.max_sessions {
                    Self::evict_stalest(&mut sessions);
                }
                let handle = Arc::new(tokio::sync::Mutex::new(Session::new(now)));
                sessions.insert(
                    id.to_string(),
                    SessionEntry {
                        handle: handle.clone(),
                        last_seen: now,
                    },
                );
                handle
            }
        };

        let mut session = handle.lock_owned().await;
        if now.signed_duration_since(session.last_active_at) > self.timeout {
            info!(session = %id, "session timed out; resetting state");
            session.reset(now);
        }
        session.last_active_at = now;
        Ok(session)
    }

    fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}
