//! Session management — per-conversation state with lazy timeout reset.

pub mod in_memory;
pub mod traits;

pub use in_memory::InMemorySessionStore;
pub use traits::{Phase, Sender, Session, SessionGuard, SessionStore, Turn};

/// Create the default in-memory session store.
pub fn create_session_store(timeout_secs: u64, max_sessions: usize) -> Box<dyn SessionStore> {
    Box::new(InMemorySessionStore::new(timeout_secs, max_sessions))
}
