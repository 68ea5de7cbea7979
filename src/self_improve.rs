//! Self-improvement review of recent episodes.
//!
//! The completion backend reads the tail of the episode log and answers with
//! a JSON object of suggestions. Only `system_prompt_append` changes
//! behavior; proposed triggers are advisory and never reach the router.

use serde_json::Value;

/// Instructions for the review model. The episode lines follow under `LOGS:`.
pub const IMPROVE_PROMPT: &str = r#"You are the assistant's self-improvement module.

Chat in a natural way. Do not use Sir often. Have a normal conversation like a friend.
Below are recent interaction logs in JSONL format. Each line has: query, handler, success, and notes.

1. Briefly summarize any recurring problems, user frustrations, or obvious misunderstandings.
2. Propose:
   - New trigger phrases that should map to EXISTING handler names I already use.
   - Optional extra instructions to append to my system prompt to better match the user's preferences.
3. Only use handlers that sound generic (like 'chat', 'weather_builtin', 'notes_add', 'media_playpause', etc.).
4. DO NOT propose new code.

Respond ONLY in this strict JSON format (no extra commentary, no markdown):

{
  "new_triggers": [
    {"trigger": "phrase user says", "handler": "existing_handler_name", "reason": "why this helps"}
  ],
  "system_prompt_append": "extra natural-language instructions to append to the current prompt or empty string"
}
"#;

pub const MSG_NO_HISTORY: &str = "I have no interaction history to learn from yet.";
pub const MSG_READ_FAILED: &str = "I had trouble reading my logs.";
pub const MSG_BACKEND_FAILED: &str =
    "I had trouble accessing my local AI brain for self-improvement.";
pub const MSG_EMPTY: &str =
    "I tried to improve myself but got an empty response from my local model.";
pub const MSG_INVALID: &str = "I tried to improve myself but the suggestions were not valid JSON.";
pub const MSG_APPLIED: &str = "I have reviewed my recent interactions and updated some of my internal settings to improve future responses.";

/// A trigger phrase the review model proposes for an existing handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerSuggestion {
    pub trigger: String,
    pub handler: String,
    pub reason: String,
}

/// Parsed review output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suggestions {
    pub new_triggers: Vec<TriggerSuggestion>,
    pub system_prompt_append: String,
}

/// Why a review response could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryError {
    Empty,
    InvalidJson,
}

/// User prompt for the review: instructions plus the raw log lines.
#[must_use]
pub fn review_prompt(lines: &[String]) -> String {
    let mut prompt = String::from(IMPROVE_PROMPT);
    prompt.push_str("\n\nLOGS:\n");
    for line in lines {
        prompt.push_str(line);
        prompt.push('\n');
    }
    prompt
}

/// Two-stage JSON recovery.
///
/// First the whole response is parsed; failing that, the slice from the
/// first `{` to the last `}` is tried. Models often wrap the object in prose
/// or code fences.
pub fn recover_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, RecoveryError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RecoveryError::Empty);
    }
    if let Ok(value) = serde_json::from_str(raw) {
        return Ok(value);
    }
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if end > start => {
            serde_json::from_str(&raw[start..=end]).map_err(|_| RecoveryError::InvalidJson)
        }
        _ => Err(RecoveryError::InvalidJson),
    }
}

/// Parse a review response into [`Suggestions`].
///
/// Only the top level has to be a JSON object. A missing or non-string
/// `system_prompt_append` reads as empty, and trigger entries that are
/// neither objects nor plain phrases are dropped.
pub fn parse_suggestions(raw: &str) -> Result<Suggestions, RecoveryError> {
    let value: Value = recover_json(raw)?;
    let Value::Object(map) = value else {
        return Err(RecoveryError::InvalidJson);
    };
    let system_prompt_append = map
        .get("system_prompt_append")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_owned();
    let new_triggers = map
        .get("new_triggers")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(trigger_from_value).collect())
        .unwrap_or_default();
    Ok(Suggestions {
        new_triggers,
        system_prompt_append,
    })
}

fn trigger_from_value(value: &Value) -> Option<TriggerSuggestion> {
    let field = |key: &str| value[key].as_str().unwrap_or("").trim().to_owned();
    let suggestion = match value {
        Value::String(phrase) => TriggerSuggestion {
            trigger: phrase.trim().to_owned(),
            ..TriggerSuggestion::default()
        },
        Value::Object(_) => TriggerSuggestion {
            trigger: field("trigger"),
            handler: field("handler"),
            reason: field("reason"),
        },
        _ => return None,
    };
    (!suggestion.trigger.is_empty()).then_some(suggestion)
}

/// Text appended to `improvements.txt` for an applied review.
#[must_use]
pub fn improvement_record(suggestions: &Suggestions) -> String {
    let mut out = String::new();
    let append = suggestions.system_prompt_append.trim();
    if !append.is_empty() {
        out.push_str("SYSTEM_PROMPT_APPEND:\n");
        out.push_str(append);
        out.push_str("\n\n");
    }
    let triggers: Vec<&TriggerSuggestion> = suggestions
        .new_triggers
        .iter()
        .filter(|t| !t.trigger.trim().is_empty())
        .collect();
    if !triggers.is_empty() {
        out.push_str("SUGGESTED_TRIGGERS (advisory):\n");
        for t in triggers {
            out.push_str(&format!("- \"{}\"", t.trigger));
            if !t.handler.is_empty() {
                out.push_str(&format!(" -> {}", t.handler));
            }
            if !t.reason.is_empty() {
                out.push_str(&format!(" ({})", t.reason));
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out
}
