//! Chat completion backend.
//!
//! [`ApiCompletion`] talks to any server implementing the OpenAI chat
//! completions API:
//! - Ollama (`http://localhost:11434`)
//! - llama.cpp server, vLLM, MLX server, etc.
//!
//! Requests are blocking and non-streaming; the session loop is suspended
//! for the duration of a completion anyway.

use crate::config::LlmConfig;
use crate::error::{ArjunError, Result};
use crate::history::ChatMessage;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Chat completion capability.
pub trait Completion: Send + Sync {
    /// Complete the conversation in `messages` with `model`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures, non-success status codes or
    /// responses without message content.
    fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String>;
}

/// Completion backend using an OpenAI-compatible HTTP API.
pub struct ApiCompletion {
    url: String,
    api_key: String,
    temperature: f64,
    agent: ureq::Agent,
}

impl ApiCompletion {
    #[must_use]
    pub fn new(config: &LlmConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_s.max(1)))
            .build();
        let url = chat_completions_url(&config.api_url);
        info!("completion backend configured: {url}");
        Self {
            url,
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            agent,
        }
    }
}

impl Completion for ApiCompletion {
    fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        let messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role.as_str(),
                    "content": m.content,
                })
            })
            .collect();

        let body = serde_json::json!({
            "model": model,
            "messages": messages,
            "stream": false,
            "temperature": self.temperature,
        });

        let started = Instant::now();
        let mut req = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json");
        if !self.api_key.is_empty() {
            let auth = format!("Bearer {}", self.api_key);
            req = req.set("Authorization", &auth);
        }

        let body_str = serde_json::to_string(&body)
            .map_err(|e| ArjunError::Llm(format!("failed to encode completion request: {e}")))?;
        let response = req.send_string(&body_str).map_err(|e| match e {
            ureq::Error::Status(code, _) => {
                ArjunError::Llm(format!("completion request returned status {code}"))
            }
            other => ArjunError::Http(format!("completion request failed: {other}")),
        })?;

        let text = response
            .into_string()
            .map_err(|e| ArjunError::Llm(format!("completion response unreadable: {e}")))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| ArjunError::Llm(format!("invalid completion response: {e}")))?;

        let content = value["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ArjunError::Llm("completion response has no content".to_owned()))?;

        debug!(
            model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "completion finished"
        );
        Ok(strip_think_blocks(content).trim().to_owned())
    }
}

/// `<base>/v1/chat/completions`, tolerating a trailing `/v1` or slash.
fn chat_completions_url(api_url: &str) -> String {
    let base = api_url.trim_end_matches('/');
    let base = base.strip_suffix("/v1").unwrap_or(base);
    format!("{base}/v1/chat/completions")
}

/// Remove `<think>...</think>` reasoning some local models emit.
fn strip_think_blocks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("<think>") {
        out.push_str(&rest[..start]);
        match rest[start..].find("</think>") {
            Some(end) => rest = &rest[start + end + "</think>".len()..],
            None => {
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}
