//! Reply-generation backends.
//!
//! The decoy's replies come from an external chat-completions API behind the
//! [`ReplyGenerator`] trait. The orchestrator treats any failure here as
//! recoverable: it substitutes a fixed fallback reply and the turn completes
//! normally.

pub mod compatible;
pub mod traits;

pub use compatible::OpenAiCompatibleGenerator;
pub use traits::{ChatMessage, ReplyGenerator};

const MAX_API_ERROR_CHARS: usize = 200;

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')
}

fn token_end(input: &str, from: usize) -> usize {
    let mut end = from;
    for (i, c) in input[from..].char_indices() {
        if is_secret_char(c) {
            end = from + i + c.len_utf8();
        } else {
            break;
        }
    }
    end
}

/// Scrub known secret-like token prefixes from provider error strings.
pub fn scrub_secret_patterns(input: &str) -> String {
    const PREFIXES: [&str; 3] = ["sk-", "sk_", "api-"];

    let mut scrubbed = input.to_string();

    for prefix in PREFIXES {
        let mut search_from = 0;
        loop {
            let Some(rel) = scrubbed[search_from..].find(prefix) else {
                break;
            };

            let start = search_from + rel;
            let content_start = start + prefix.len();
            let end = token_end(&scrubbed, content_start);

            if end == content_start {
                search_from = content_start;
                continue;
            }

            scrubbed.replace_range(start..end, "[REDACTED]");
            search_from = start + "[REDACTED]".len();
        }
    }

    scrubbed
}

/// Sanitize API error text by scrubbing secrets and truncating length.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);

    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed;
    }

    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !scrubbed.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &scrubbed[..end])
}

/// Build a sanitized generator error from a failed HTTP response.
pub async fn api_error(generator: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read generator error body>".to_string());
    let sanitized = sanitize_api_error(&body);
    anyhow::anyhow!("{generator} API error ({status}): {sanitized}")
}

/// Factory: build the configured reply generator.
pub fn create_generator(llm: &crate::config::LlmConfig) -> Box<dyn ReplyGenerator> {
    Box::new(OpenAiCompatibleGenerator::new(
        "openai",
        &llm.base_url,
        llm.api_key.as_deref(),
        Some(llm.max_tokens),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_scrubs_sk_prefix() {
        let input = "request failed: sk-1234567890abcdef";
        let out = sanitize_api_error(input);
        assert!(!out.contains("sk-1234567890abcdef"));
        assert!(out.contains("[REDACTED]"));
    }

    #[test]
    fn sanitize_truncates_long_error() {
        let long = "a".repeat(400);
        let result = sanitize_api_error(&long);
        assert!(result.len() <= 203);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn sanitize_no_secret_no_change() {
        let input = "simple upstream timeout";
        let result = sanitize_api_error(input);
        assert_eq!(result, input);
    }

    #[test]
    fn scrub_bare_prefix_is_left_alone() {
        // A prefix with no token after it is not a secret.
        let input = "error in sk- handling";
        assert_eq!(scrub_secret_patterns(input), input);
    }

    #[test]
    fn factory_builds_from_config() {
        let llm = crate::config::LlmConfig::default();
        let generator = create_generator(&llm);
        assert_eq!(generator.name(), "openai");
    }
}
