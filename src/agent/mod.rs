//! Per-turn orchestration: session resolution, classification, extraction,
//! engagement, and the one-shot report trigger.

pub mod persona;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::intel::{classify, extract, Intelligence, PatternSet};
use crate::providers::ReplyGenerator;
use crate::report::{ReportDispatcher, SessionReport};
use crate::sessions::{Sender, SessionStore, Turn};

/// One inbound message, as the transport hands it to the core.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender: String,
    pub text: String,
    pub timestamp: String,
}

/// What one processed turn produces for the caller.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub scam_detected: bool,
    pub intelligence: Intelligence,
}

/// The decoy engine. Owns every collaborator a turn touches; all state lives
/// in the session store.
pub struct DecoyAgent {
    store: Box<dyn SessionStore>,
    generator: Box<dyn ReplyGenerator>,
    reports: ReportDispatcher,
    patterns: PatternSet,
    model: String,
    temperature: f64,
    report_threshold: usize,
}

impl DecoyAgent {
    pub fn new(
        store: Box<dyn SessionStore>,
        generator: Box<dyn ReplyGenerator>,
        reports: ReportDispatcher,
        patterns: PatternSet,
        model: String,
        temperature: f64,
        report_threshold: usize,
    ) -> Self {
        Self {
            store,
            generator,
            reports,
            patterns,
            model,
            temperature,
            report_threshold,
        }
    }

    /// Number of live sessions in the store.
    pub fn session_count(&self) -> usize {
        self.store.len()
    }

    /// Process one inbound message end to end. Total over its input domain:
    /// generator failures become the fallback reply, empty text simply
    /// matches nothing.
    pub async fn handle_message(
        &self,
        session_id: &str,
        message: &InboundMessage,
    ) -> Result<TurnOutcome> {
        let now = Utc::now();
        let mut session = self.store.resolve(session_id, now).await?;

        if classify(&self.patterns, &message.text) && !session.scam_detected {
            info!(session = %session_id, "scam signals detected");
            session.scam_detected = true;
        }

        let found = extract(&self.patterns, &message.text);
        if !found.is_empty() {
            debug!(session = %session_id, indicators = found.len(), "extracted indicators");
        }
        session.intelligence.absorb(found);

        // Engagement continues once started, or starts immediately when the
        // very first message already looks like a scam.
        let activate = session.scam_detected || !session.history.is_empty();
        let reply = if activate {
            let messages = persona::build_messages(&session.history, &message.text);
            match self
                .generator
                .chat_with_history(&messages, &self.model, self.temperature)
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    warn!(session = %session_id, error = %e, "reply generation failed; using fallback");
                    persona::FALLBACK_REPLY.to_string()
                }
            }
        } else {
            persona::NEUTRAL_REPLY.to_string()
        };

        session.push_turn_pair(
            Turn {
                sender: Sender::Actor,
                text: message.text.clone(),
                timestamp: message.timestamp.clone(),
            },
            Turn {
                sender: Sender::Agent,
                text: reply.clone(),
                timestamp: now.to_rfc3339(),
            },
        );

        // The Reported transition is consumed before the enqueue, so delivery
        // can never be scheduled twice for one session lifetime.
        if session.scam_detected
            && session.history.len() >= self.report_threshold
            && session.try_mark_reported()
        {
            info!(
                session = %session_id,
                messages = session.history.len(),
                indicators = session.intelligence.len(),
                "evidence threshold reached; queueing session report"
            );
            self.reports
                .dispatch(SessionReport::from_session(session_id, &session));
        }

        Ok(TurnOutcome {
            reply,
            scam_detected: session.scam_detected,
            intelligence: session.intelligence.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ChatMessage;
    use crate::report::ReportSink;
    use crate::sessions::InMemorySessionStore;
    use anyhow::Result;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    struct CannedGenerator {
        reply: Option<String>,
        calls: Arc<Mutex<usize>>,
    }

    impl CannedGenerator {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                calls: Arc::new(Mutex::new(0)),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                calls: Arc::new(Mutex::new(0)),
            }
        }

        fn call_counter(&self) -> Arc<Mutex<usize>> {
            self.calls.clone()
        }
    }

    #[async_trait]
    impl ReplyGenerator for CannedGenerator {
        async fn chat_with_history(
            &self,
            _messages: &[ChatMessage],
            _model: &str,
            _temperature: f64,
        ) -> Result<String> {
            *self.calls.lock() += 1;
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => anyhow::bail!("generator unreachable"),
            }
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    struct RecordingSink {
        delivered: Mutex<Vec<SessionReport>>,
    }

    #[async_trait]
    impl ReportSink for RecordingSink {
        async fn deliver(&self, report: &SessionReport) -> Result<()> {
            self.delivered.lock().push(report.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn agent_with(generator: CannedGenerator) -> (DecoyAgent, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink {
            delivered: Mutex::new(Vec::new()),
        });
        let agent = DecoyAgent::new(
            Box::new(InMemorySessionStore::new(1800, 10_000)),
            Box::new(generator),
            ReportDispatcher::spawn(sink.clone(), 8),
            PatternSet::compile().unwrap(),
            "gpt-3.5-turbo".to_string(),
            0.8,
            10,
        );
        (agent, sink)
    }

    fn message(text: &str) -> InboundMessage {
        InboundMessage {
            sender: "scammer".to_string(),
            text: text.to_string(),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn first_benign_message_gets_neutral_reply() {
        let generator = CannedGenerator::replying("persona reply");
        let calls = generator.call_counter();
        let (agent, sink) = agent_with(generator);

        let outcome = agent.handle_message("sess-1", &message("hello")).await.unwrap();

        assert!(!outcome.scam_detected);
        assert_eq!(outcome.reply, persona::NEUTRAL_REPLY);
        assert!(outcome.intelligence.is_empty());
        // The persona stays dormant: the generator was never invoked.
        assert_eq!(*calls.lock(), 0);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(sink.delivered.lock().is_empty());
    }

    #[tokio::test]
    async fn first_scam_message_activates_persona_immediately() {
        let (agent, _sink) = agent_with(CannedGenerator::replying("persona reply"));

        let outcome = agent
            .handle_message("sess-1", &message("URGENT: verify your account"))
            .await
            .unwrap();

        assert!(outcome.scam_detected);
        assert_eq!(outcome.reply, "persona reply");
    }

    #[tokio::test]
    async fn second_message_activates_even_without_scam_signal() {
        // History-non-empty is treated as already-engaging, by design.
        let (agent, _sink) = agent_with(CannedGenerator::replying("persona reply"));

        let first = agent.handle_message("sess-1", &message("hello")).await.unwrap();
        assert_eq!(first.reply, persona::NEUTRAL_REPLY);

        let second = agent.handle_message("sess-1", &message("how are you")).await.unwrap();
        assert!(!second.scam_detected);
        assert_eq!(second.reply, "persona reply");
    }

    #[tokio::test]
    async fn generator_failure_substitutes_fallback_without_retry() {
        let generator = CannedGenerator::failing();
        let calls = generator.call_counter();
        let (agent, _sink) = agent_with(generator);

        let outcome = agent
            .handle_message("sess-1", &message("your kyc is blocked"))
            .await
            .unwrap();

        assert!(outcome.scam_detected);
        assert_eq!(outcome.reply, persona::FALLBACK_REPLY);
        assert_eq!(*calls.lock(), 1);
    }

    #[tokio::test]
    async fn detection_is_sticky_across_turns() {
        let (agent, _sink) = agent_with(CannedGenerator::replying("ok"));

        let flagged = agent
            .handle_message("sess-1", &message("pay to anna@upi"))
            .await
            .unwrap();
        assert!(flagged.scam_detected);

        let benign = agent.handle_message("sess-1", &message("nice weather")).await.unwrap();
        assert!(benign.scam_detected);
    }

    #[tokio::test]
    async fn extraction_is_idempotent_across_turns() {
        let (agent, _sink) = agent_with(CannedGenerator::replying("ok"));
        let text = "pay to anna@upi or visit http://bit.ly/x";

        let first = agent.handle_message("sess-1", &message(text)).await.unwrap();
        let second = agent.handle_message("sess-1", &message(text)).await.unwrap();

        assert_eq!(first.intelligence, second.intelligence);
        assert_eq!(second.intelligence.payment_identifiers, vec!["anna@upi"]);
        assert_eq!(second.intelligence.links, vec!["http://bit.ly/x"]);
    }

    #[tokio::test]
    async fn kyc_block_message_classifies_and_extracts() {
        let (agent, _sink) = agent_with(CannedGenerator::replying("ok"));

        let outcome = agent
            .handle_message(
                "sess-1",
                &message("Your KYC is blocked, pay to upi id john@upi or verify at http://bit.ly/x"),
            )
            .await
            .unwrap();

        assert!(outcome.scam_detected);
        assert_eq!(outcome.intelligence.payment_identifiers, vec!["john@upi"]);
        assert_eq!(outcome.intelligence.links, vec!["http://bit.ly/x"]);
        for term in ["kyc", "blocked", "pay", "verify"] {
            assert!(
                outcome.intelligence.suspicious_terms.iter().any(|t| t == term),
                "missing term {term}"
            );
        }
    }

    #[tokio::test]
    async fn history_grows_by_pairs() {
        let (agent, _sink) = agent_with(CannedGenerator::replying("ok"));

        for i in 1..=3_usize {
            agent.handle_message("sess-1", &message("urgent pay now")).await.unwrap();
            let session = agent.store.resolve("sess-1", Utc::now()).await.unwrap();
            assert_eq!(session.history.len(), i * 2);
        }
    }

    #[tokio::test]
    async fn report_fires_exactly_once_at_threshold() {
        let (agent, sink) = agent_with(CannedGenerator::replying("ok"));

        // Five scam-flagged exchanges reach the 10-entry threshold; three
        // more keep qualifying but must not fire again.
        for _ in 0..8 {
            agent
                .handle_message("sess-1", &message("urgent: send otp to anna@upi"))
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        let delivered = sink.delivered.lock();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].session_id, "sess-1");
        assert_eq!(delivered[0].total_messages_exchanged, 10);
        assert!(delivered[0].scam_detected);
    }

    #[tokio::test]
    async fn benign_conversation_never_reports() {
        let (agent, sink) = agent_with(CannedGenerator::replying("ok"));

        for _ in 0..8 {
            agent.handle_message("sess-1", &message("hello there")).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(sink.delivered.lock().is_empty());
    }

    #[tokio::test]
    async fn empty_text_is_a_quiet_turn() {
        let (agent, _sink) = agent_with(CannedGenerator::replying("ok"));

        let outcome = agent.handle_message("sess-1", &message("")).await.unwrap();
        assert!(!outcome.scam_detected);
        assert!(outcome.intelligence.is_empty());
        assert_eq!(outcome.reply, persona::NEUTRAL_REPLY);
    }
}
