//! Best-effort knowledge lookup for factual questions.
//!
//! When an utterance opens like a question about the world ("who is",
//! "tell me about", ...) and is not about the user or the assistant, a short
//! encyclopedia summary is appended to the text forwarded to the chat
//! backend. Lookup failures are swallowed by the caller.

use crate::config::KnowledgeConfig;
use crate::error::{ArjunError, Result};
use std::time::Duration;

/// Phrases that mark an utterance as a knowledge question.
pub const QUESTION_OPENERS: [&str; 5] = ["who is", "what is", "tell me about", "why is", "how does"];

/// Encyclopedia-style summary source.
pub trait KnowledgeSource: Send + Sync {
    /// At most `sentences` sentences summarizing `topic`.
    ///
    /// # Errors
    ///
    /// Returns an error when the topic is unknown or the source unreachable.
    fn summary(&self, topic: &str, sentences: usize) -> Result<String>;
}

/// Extracts the lookup topic from a knowledge question.
///
/// Returns `None` when the utterance is not a knowledge question, refers to
/// the user ("my"), or asks about the assistant itself.
#[must_use]
pub fn knowledge_topic(utterance: &str, wake_word: &str) -> Option<String> {
    let lower = utterance.to_lowercase();
    if !QUESTION_OPENERS.iter().any(|o| lower.contains(o)) {
        return None;
    }
    if lower.split_whitespace().any(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == "my") {
        return None;
    }
    let mut topic = lower;
    for opener in ["who is", "what is", "tell me about"] {
        topic = topic.replace(opener, "");
    }
    topic = topic.replace(&format!("hey {wake_word}"), "");
    let topic = topic
        .trim()
        .trim_matches(|c: char| c == '?' || c == '.' || c == '!')
        .trim()
        .to_owned();
    if topic.is_empty() || topic == wake_word || topic == "you" {
        return None;
    }
    Some(topic)
}

/// First `n` sentences of `text`.
#[must_use]
pub fn first_sentences(text: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let mut count = 0;
    for (idx, ch) in text.char_indices() {
        if matches!(ch, '.' | '!' | '?') {
            let next = text[idx + ch.len_utf8()..].chars().next();
            if next.is_none_or(char::is_whitespace) {
                count += 1;
                if count == n {
                    return text[..idx + ch.len_utf8()].trim().to_owned();
                }
            }
        }
    }
    text.trim().to_owned()
}

/// Wikipedia REST summary endpoint.
pub struct WikipediaSource {
    base_url: String,
    agent: ureq::Agent,
}

impl WikipediaSource {
    #[must_use]
    pub fn new(config: &KnowledgeConfig) -> Self {
        Self {
            base_url: config.api_url.trim_end_matches('/').to_owned(),
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(config.timeout_s.max(1)))
                .build(),
        }
    }
}

impl KnowledgeSource for WikipediaSource {
    fn summary(&self, topic: &str, sentences: usize) -> Result<String> {
        let title = urlencoding::encode(&topic.replace(' ', "_")).into_owned();
        let url = format!("{}/api/rest_v1/page/summary/{title}", self.base_url);
        let text = self
            .agent
            .get(&url)
            .set("Accept", "application/json")
            .call()
            .map_err(|e| ArjunError::Lookup(format!("summary request for '{topic}' failed: {e}")))?
            .into_string()
            .map_err(|e| ArjunError::Lookup(format!("summary for '{topic}' unreadable: {e}")))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| ArjunError::Lookup(format!("invalid summary for '{topic}': {e}")))?;

        if value["type"].as_str() == Some("disambiguation") {
            return Err(ArjunError::Lookup(format!("'{topic}' is ambiguous")));
        }
        let extract = value["extract"]
            .as_str()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ArjunError::Lookup(format!("no summary for '{topic}'")))?;
        Ok(first_sentences(extract, sentences))
    }
}
