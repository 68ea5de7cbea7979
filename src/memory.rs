//! Plain-text fact memory.
//!
//! Facts live in a single file, one `- ...` line per fact, so they are easy
//! to inspect and edit by hand. They are folded into the system prompt by
//! [`crate::personality::build_system_prompt`].

use crate::error::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const NAME_MARKER: &str = "my name is";
const NAME_FACT_MARKER: &str = "user's name is";

/// File-backed list of learned facts.
#[derive(Debug, Clone)]
pub struct FactStore {
    path: PathBuf,
}

impl FactStore {
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all non-empty fact lines.
    ///
    /// A missing or unreadable file yields no facts; read failures are logged.
    pub fn load(&self) -> Vec<String> {
        if !self.path.exists() {
            return Vec::new();
        }
        match std::fs::read_to_string(&self.path) {
            Ok(body) => body
                .lines()
                .map(str::trim_end)
                .filter(|l| !l.trim().is_empty())
                .map(str::to_owned)
                .collect(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read fact memory");
                Vec::new()
            }
        }
    }

    /// Append one fact line.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory file cannot be opened or written.
    pub fn append(&self, fact_line: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{fact_line}")?;
        info!(fact = fact_line, "remembered fact");
        Ok(())
    }
}

/// Turns a "remember ..." utterance into a fact line.
///
/// Returns `None` when nothing is left after stripping the trigger words.
#[must_use]
pub fn fact_from_utterance(utterance: &str, wake_word: &str) -> Option<String> {
    let trigger = format!("{wake_word} remember");
    let fact = utterance
        .replace(&trigger, "")
        .replace("remember this", "")
        .trim()
        .to_owned();
    if fact.is_empty() {
        return None;
    }
    match fact.rsplit_once(NAME_MARKER) {
        Some((_, name)) if !name.trim().is_empty() => {
            Some(format!("- The user's name is {}", name.trim()))
        }
        _ => Some(format!("- The user told you to remember: {fact}")),
    }
}

/// Extracts the user's name from the learned facts, last mention wins.
#[must_use]
pub fn user_name(facts: &[String]) -> Option<String> {
    facts
        .iter()
        .filter(|line| line.to_lowercase().contains(NAME_FACT_MARKER))
        .filter_map(|line| line.rsplit_once(" is ").map(|(_, name)| name))
        .map(|name| name.trim().replace('.', ""))
        .filter(|name| !name.is_empty())
        .last()
}
