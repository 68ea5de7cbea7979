//! Bounded chat history pinned to a system message.
//!
//! The first entry is always the current system message whenever the history
//! is non-empty. Appends evict the oldest user/assistant turns once the cap
//! is reached; the system message is never evicted.

use serde::{Deserialize, Serialize};

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name used by chat completion APIs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered chat log capped at `limit` entries.
#[derive(Debug, Clone)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
    limit: usize,
}

impl ChatHistory {
    /// Create a history holding only `system_message`.
    ///
    /// A `limit` below 2 is raised to 2 so at least one turn fits beside the
    /// system message.
    #[must_use]
    pub fn new(system_message: impl Into<String>, limit: usize) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_message)],
            limit: limit.max(2),
        }
    }

    /// Replace the whole history with a single system message.
    pub fn reset(&mut self, system_message: impl Into<String>) {
        self.messages.clear();
        self.messages.push(ChatMessage::system(system_message));
    }

    /// Append a turn, then enforce the cap.
    ///
    /// A system-role append replaces the pinned system message instead of
    /// adding a second one.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        let content = content.into();
        match role {
            Role::System => match self.messages.first_mut() {
                Some(first) if first.role == Role::System => first.content = content,
                _ => self.messages.insert(0, ChatMessage::system(content)),
            },
            Role::User | Role::Assistant => self.messages.push(ChatMessage { role, content }),
        }
        self.truncate(self.limit);
    }

    /// Keep the system message plus the most recent `limit - 1` entries.
    pub fn truncate(&mut self, limit: usize) {
        let limit = limit.max(1);
        if self.messages.len() > limit {
            let drain_end = self.messages.len() - (limit - 1);
            self.messages.drain(1..drain_end);
        }
    }

    /// Drop the newest entry if it is an unanswered user turn.
    pub fn discard_pending_user_turn(&mut self) {
        if self.messages.len() > 1
            && self.messages.last().is_some_and(|m| m.role == Role::User)
        {
            self.messages.pop();
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn system_message(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
