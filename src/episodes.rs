//! Append-only interaction log (`episodes.jsonl`).
//!
//! One JSON record per completed turn. The log feeds the self-improvement
//! review and the offline dataset builder. Writes are fire-and-forget: a
//! failure is logged and never reaches the session loop.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One logged turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Seconds since the Unix epoch.
    pub ts: f64,
    pub query: String,
    /// Final reply text; empty when the turn failed.
    pub assistant_reply: String,
    /// Name of the handler that served the turn (e.g. `"chat"`).
    pub handler: String,
    pub success: bool,
    #[serde(default)]
    pub notes: String,
}

impl Episode {
    /// A record stamped with the current time.
    #[must_use]
    pub fn now(
        query: impl Into<String>,
        assistant_reply: impl Into<String>,
        handler: impl Into<String>,
        success: bool,
    ) -> Self {
        let ts = chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0;
        Self {
            ts,
            query: query.into(),
            assistant_reply: assistant_reply.into(),
            handler: handler.into(),
            success,
            notes: String::new(),
        }
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Writer and tail reader for the episode log file.
#[derive(Debug, Clone)]
pub struct EpisodeLog {
    path: PathBuf,
}

impl EpisodeLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `episode`; failures are only logged.
    pub fn record(&self, episode: &Episode) {
        if let Err(e) = self.try_record(episode) {
            warn!(path = %self.path.display(), "episode log write failed: {e}");
        }
    }

    fn try_record(&self, episode: &Episode) -> std::io::Result<()> {
        let line = serde_json::to_string(episode)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }

    /// Whether any episode has been written yet.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// The last `n` raw lines of the log, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error when the log cannot be read.
    pub fn tail(&self, n: usize) -> std::io::Result<Vec<String>> {
        let content = std::fs::read_to_string(&self.path)?;
        let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(n);
        Ok(lines[start..].iter().map(|l| (*l).to_owned()).collect())
    }
}
