//! User-taught custom commands and their JSON store.
//!
//! The store file holds `{"commands": [...]}` and is rewritten wholesale on
//! every mutation. A missing file is bootstrapped as an empty collection; an
//! unreadable or malformed file loads as empty and is logged, never raised.

use crate::error::{ArjunError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Words that select the open branch of a custom command.
pub const OPEN_ACTIONS: [&str; 5] = ["open", "launch", "start", "visit", "go to"];

/// Words that select the close branch of an app command.
pub const CLOSE_ACTIONS: [&str; 4] = ["close", "quit", "terminate", "shut down"];

/// What a custom command does when opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    /// Open `target` as a URL.
    Website,
    /// Launch `target` as an application path.
    App,
    /// Report the weather for the city in `target`.
    Weather,
}

/// A persisted custom command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Substring matched against utterances.
    pub trigger: String,
    #[serde(rename = "type")]
    pub kind: CommandKind,
    pub target: String,
    /// Executable name used to close an app command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_name: Option<String>,
}

impl Command {
    /// Whether `utterance` contains this command's trigger.
    #[must_use]
    pub fn is_triggered_by(&self, utterance: &str) -> bool {
        !self.trigger.is_empty() && utterance.contains(self.trigger.as_str())
    }
}

/// Which branch of a custom command an utterance selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    Open,
    Close,
}

/// Finds the first command whose trigger the utterance contains and which an
/// open or close keyword disambiguates.
///
/// Commands are checked in store order. A matching trigger without an open
/// keyword only selects `Close` for app commands; otherwise the search moves
/// on to the next command.
#[must_use]
pub fn match_command(commands: &[Command], utterance: &str) -> Option<(usize, CommandAction)> {
    commands.iter().enumerate().find_map(|(idx, cmd)| {
        if !cmd.is_triggered_by(utterance) {
            return None;
        }
        if contains_any(utterance, &OPEN_ACTIONS) {
            return Some((idx, CommandAction::Open));
        }
        if cmd.kind == CommandKind::App && contains_any(utterance, &CLOSE_ACTIONS) {
            return Some((idx, CommandAction::Close));
        }
        None
    })
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

/// Removes spoken spacing and prefixes `https://` when no scheme is present.
///
/// Idempotent: normalizing an already normalized target changes nothing.
#[must_use]
pub fn normalize_website_target(raw: &str) -> String {
    let target: String = raw.split_whitespace().collect();
    if target.starts_with("http://") || target.starts_with("https://") {
        target
    } else {
        format!("https://{target}")
    }
}

/// Removes spoken spacing and appends `suffix` when missing.
#[must_use]
pub fn normalize_process_name(raw: &str, suffix: &str) -> String {
    let name: String = raw.split_whitespace().collect();
    if suffix.is_empty() || name.to_lowercase().ends_with(&suffix.to_lowercase()) {
        name
    } else {
        format!("{name}{suffix}")
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CommandsFile {
    #[serde(default)]
    commands: Vec<Command>,
}

/// Load commands from `path`, bootstrapping an empty store when absent.
pub fn load(path: &Path) -> Vec<Command> {
    if !path.exists() {
        if let Err(e) = save(path, &[]) {
            warn!(path = %path.display(), error = %e, "failed to bootstrap command store");
        }
        return Vec::new();
    }
    let body = match std::fs::read_to_string(path) {
        Ok(body) => body,
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to read command store");
            return Vec::new();
        }
    };
    match serde_json::from_str::<CommandsFile>(&body) {
        Ok(file) => file
            .commands
            .into_iter()
            .filter(|c| !c.trigger.trim().is_empty())
            .collect(),
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to parse command store");
            Vec::new()
        }
    }
}

/// Overwrite `path` with the full command collection.
///
/// # Errors
///
/// Returns an error if the collection cannot be serialized or written.
pub fn save(path: &Path, commands: &[Command]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = CommandsFile {
        commands: commands.to_vec(),
    };
    let body = serde_json::to_string_pretty(&file)
        .map_err(|e| ArjunError::Store(format!("serialize commands: {e}")))?;
    std::fs::write(path, body)?;
    Ok(())
}

/// In-memory command collection backed by its store file.
#[derive(Debug, Clone)]
pub struct CommandStore {
    path: PathBuf,
    commands: Vec<Command>,
}

impl CommandStore {
    /// Load the store at `path`.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        let commands = load(path);
        info!(count = commands.len(), "loaded custom commands");
        Self {
            path: path.to_path_buf(),
            commands,
        }
    }

    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Append a command and persist the whole collection.
    ///
    /// The command stays in memory even if persisting fails.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty trigger or when the store cannot be written.
    pub fn append(&mut self, command: Command) -> Result<()> {
        if command.trigger.trim().is_empty() {
            return Err(ArjunError::Store("command trigger is empty".to_owned()));
        }
        info!(trigger = %command.trigger, kind = ?command.kind, "adding custom command");
        self.commands.push(command);
        self.save()
    }

    /// Persist the current collection.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be written.
    pub fn save(&self) -> Result<()> {
        save(&self.path, &self.commands).inspect_err(|e| {
            error!(path = %self.path.display(), error = %e, "failed to save command store");
        })
    }
}
