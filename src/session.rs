//! Per-process conversation state owned by the session loop.

use crate::history::ChatHistory;
use crate::memory;
use crate::personality::{self, Persona};

/// Persona, learned facts, self-improvement text and the bounded chat log.
///
/// Every prompt rebuild also resets the history to the new system message,
/// so a persona switch always starts a fresh conversation.
#[derive(Debug, Clone)]
pub struct SessionState {
    persona: Persona,
    facts: Vec<String>,
    evolution_append: String,
    user_name: Option<String>,
    system_prompt: String,
    history: ChatHistory,
    prompt_revision: u64,
}

impl SessionState {
    #[must_use]
    pub fn new(persona: Persona, facts: Vec<String>, history_limit: usize) -> Self {
        let system_prompt = personality::build_system_prompt(&facts, persona, "");
        let user_name = memory::user_name(&facts);
        Self {
            persona,
            history: ChatHistory::new(system_prompt.clone(), history_limit),
            facts,
            evolution_append: String::new(),
            user_name,
            system_prompt,
            prompt_revision: 0,
        }
    }

    #[must_use]
    pub fn persona(&self) -> Persona {
        self.persona
    }

    #[must_use]
    pub fn facts(&self) -> &[String] {
        &self.facts
    }

    #[must_use]
    pub fn evolution_append(&self) -> &str {
        &self.evolution_append
    }

    #[must_use]
    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    #[must_use]
    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut ChatHistory {
        &mut self.history
    }

    /// Number of prompt rebuilds since startup.
    #[must_use]
    pub fn prompt_revision(&self) -> u64 {
        self.prompt_revision
    }

    /// Rebuild the system prompt and reset history to it.
    pub fn rebuild_prompt(&mut self) {
        self.system_prompt =
            personality::build_system_prompt(&self.facts, self.persona, &self.evolution_append);
        self.history.reset(self.system_prompt.clone());
        self.prompt_revision += 1;
    }

    /// Switch persona; the conversation restarts under the new prompt.
    pub fn set_persona(&mut self, persona: Persona) {
        self.persona = persona;
        self.rebuild_prompt();
    }

    /// Replace learned facts (after a reload from disk).
    pub fn set_facts(&mut self, facts: Vec<String>) {
        self.user_name = memory::user_name(&facts);
        self.facts = facts;
        self.rebuild_prompt();
    }

    /// Add self-improvement instructions.
    ///
    /// The text is appended as `"\n\n" + text`; blank text is ignored and
    /// leaves the prompt untouched. Returns whether anything was applied.
    pub fn append_evolution(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        self.evolution_append.push_str("\n\n");
        self.evolution_append.push_str(text);
        self.rebuild_prompt();
        true
    }
}
