//! Session storage traits and types for decoy conversation state.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;

use crate::intel::Intelligence;

/// Which side of the conversation produced a turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The remote party, presumed scammer.
    Actor,
    /// The decoy persona.
    Agent,
}

/// A single entry in a session's conversation history.
///
/// Timestamps stay strings: actor timestamps are echoed from the request
/// verbatim, agent timestamps are RFC 3339.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub sender: Sender,
    pub text: String,
    pub timestamp: String,
}

/// Engagement lifecycle of one session.
///
/// `Reported` is terminal until a full reset; the transition into it can
/// happen at most once, which is what makes report delivery at-most-once.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No turns exchanged yet.
    Fresh,
    /// Conversation under way.
    Engaging,
    /// Intelligence report handed to the dispatcher.
    Reported,
}

/// Per-conversation state, keyed externally by an opaque session identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Conversation turns, always appended in (actor, agent) pairs.
    pub history: Vec<Turn>,
    /// Accumulated forensic indicators.
    pub intelligence: Intelligence,
    /// Most recent accepted message; drives lazy expiry.
    pub last_active_at: DateTime<Utc>,
    /// Sticky scam flag: set true once, cleared only by a full reset.
    pub scam_detected: bool,
    phase: Phase,
}

impl Session {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            history: Vec::new(),
            intelligence: Intelligence::default(),
            last_active_at: now,
            scam_detected: false,
            phase: Phase::Fresh,
        }
    }

    /// Discard all accumulated state, as if the identifier were new.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        *self = Session::new(now);
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the report trigger has already been consumed.
    pub fn report_sent(&self) -> bool {
        self.phase == Phase::Reported
    }

    /// Append one (actor, agent) turn pair. History only ever grows through
    /// this method, which keeps its length even.
    pub fn push_turn_pair(&mut self, actor: Turn, agent: Turn) {
        debug_assert_eq!(actor.sender, Sender::Actor);
        debug_assert_eq!(agent.sender, Sender::Agent);
        self.history.push(actor);
        self.history.push(agent);
        if self.phase == Phase::Fresh {
            self.phase = Phase::Engaging;
        }
    }

    /// One-shot transition into `Reported`. Returns true exactly once per
    /// session lifetime; the caller owns dispatching iff it gets true.
    pub fn try_mark_reported(&mut self) -> bool {
        if self.phase == Phase::Reported {
            return false;
        }
        self.phase = Phase::Reported;
        true
    }
}

/// Exclusive handle to one session, held for the duration of a turn.
/// While a guard is alive, no other task can touch the same session.
pub type SessionGuard = OwnedMutexGuard<Session>;

/// Storage for decoy conversation sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolve the session for `id`: create it if absent, reset it in place
    /// if the time since its last activity exceeds the store's timeout, and
    /// stamp `last_active_at = now`. The returned guard serializes all access
    /// to that session until it is dropped.
    async fn resolve(&self, id: &str, now: DateTime<Utc>) -> Result<SessionGuard>;

    /// Number of live sessions.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The name of this session store implementation.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(sender: Sender, text: &str) -> Turn {
        Turn {
            sender,
            text: text.to_string(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn new_session_is_fresh_and_empty() {
        let session = Session::new(Utc::now());
        assert_eq!(session.phase(), Phase::Fresh);
        assert!(session.history.is_empty());
        assert!(session.intelligence.is_empty());
        assert!(!session.scam_detected);
        assert!(!session.report_sent());
    }

    #[test]
    fn pushing_a_pair_enters_engaging() {
        let mut session = Session::new(Utc::now());
        session.push_turn_pair(turn(Sender::Actor, "hi"), turn(Sender::Agent, "Who is this?"));
        assert_eq!(session.phase(), Phase::Engaging);
        assert_eq!(session.history.len(), 2);
    }

    #[test]
    fn mark_reported_succeeds_exactly_once() {
        let mut session = Session::new(Utc::now());
        session.push_turn_pair(turn(Sender::Actor, "hi"), turn(Sender::Agent, "hm"));
        assert!(session.try_mark_reported());
        assert!(session.report_sent());
        assert!(!session.try_mark_reported());
        assert!(!session.try_mark_reported());
    }

    #[test]
    fn reset_clears_everything() {
        let now = Utc::now();
        let mut session = Session::new(now);
        session.scam_detected = true;
        session.push_turn_pair(turn(Sender::Actor, "hi"), turn(Sender::Agent, "hm"));
        assert!(session.try_mark_reported());

        session.reset(now);
        assert_eq!(session.phase(), Phase::Fresh);
        assert!(session.history.is_empty());
        assert!(!session.scam_detected);
        assert!(!session.report_sent());
    }
}
