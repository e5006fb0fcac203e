//! One-shot intelligence report for a session.

pub mod dispatcher;
pub mod traits;

pub use dispatcher::{HttpReportSink, ReportDispatcher};
pub use traits::ReportSink;

use serde::{Deserialize, Serialize};

use crate::intel::Intelligence;
use crate::sessions::Session;

/// Fixed summary attached to every report.
const AGENT_NOTES: &str =
    "Scam detected. Agent engaged user and successfully wasted time while extracting tokens.";

/// Payload POSTed to the collection endpoint, wire names as it expects them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub session_id: String,
    pub scam_detected: bool,
    pub total_messages_exchanged: usize,
    pub extracted_intelligence: Intelligence,
    pub agent_notes: String,
}

impl SessionReport {
    /// Snapshot a session at trigger time. Only ever built for sessions with
    /// the scam flag set, so `scam_detected` is unconditionally true.
    pub fn from_session(session_id: &str, session: &Session) -> Self {
        Self {
            session_id: session_id.to_string(),
            scam_detected: true,
            total_messages_exchanged: session.history.len(),
            extracted_intelligence: session.intelligence.clone(),
            agent_notes: AGENT_NOTES.to_string(),
        }
    }
}
