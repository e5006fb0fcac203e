//! Reply-generation traits and chat message types.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One message in the chat-completion sense, not the conversation sense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.to_string(),
        }
    }
}

/// Produces the decoy's next reply from the conversation so far.
///
/// Implementations are blocking network calls bounded by their own fixed
/// timeout; callers substitute a canned fallback on any `Err` and never
/// retry.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn chat_with_history(
        &self,
        messages: &[ChatMessage],
        model: &str,
        temperature: f64,
    ) -> Result<String>;

    /// The name of this generator implementation.
    fn name(&self) -> &str;
}
