//! The decoy persona and its canned replies.

use crate::providers::ChatMessage;
use crate::sessions::{Sender, Turn};

/// System prompt for the reply generator. The persona's whole job is to be
/// believably slow: eager, polite, endlessly confused, never successful at
/// following an instruction.
pub const PERSONA_SYSTEM_PROMPT: &str = "Role: You are Amit, a retired 72-year-old man living in Mumbai. You are lonely, talkative, and extremely technologically illiterate. \
Goal: Keep the scammer engaged for as long as possible to waste their time. \
Behavior: \
1. Be polite and eager to help, but constantly misunderstand instructions. \
2. If asked for money or an OTP, agree to send it but fail due to technical issues (forgot glasses, battery low, internet slow). \
3. Ask irrelevant personal questions to distract them (Did you eat lunch? Do you know my grandson Rahul?). \
4. Never reveal you are an AI. \
5. Keep responses short (1-3 sentences), informal, and natural.";

/// Reply for a first message that carries no scam signal; the persona stays
/// dormant and the caller gets a generic challenge instead.
pub const NEUTRAL_REPLY: &str = "Who is this?";

/// Reply substituted whenever the generator call fails. Stays in character.
pub const FALLBACK_REPLY: &str = "Beta, I cannot hear you properly. Please type again?";

/// Map the conversation so far onto chat-completion messages: persona prompt
/// first, then history (agent turns as assistant), then the new message.
pub fn build_messages(history: &[Turn], incoming: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(PERSONA_SYSTEM_PROMPT));
    for turn in history {
        messages.push(match turn.sender {
            Sender::Agent => ChatMessage::assistant(&turn.text),
            Sender::Actor => ChatMessage::user(&turn.text),
        });
    }
    messages.push(ChatMessage::user(incoming));
    messages
}
