//! Centralized application directory paths.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! # Directory Layout
//!
//! | Purpose | macOS | Linux | Windows |
//! |---------|-------|-------|---------|
//! | App data | `~/Library/Application Support/arjun/` | `~/.local/share/arjun/` | `%APPDATA%\arjun\` |
//! | Config | `~/Library/Application Support/arjun/` | `~/.config/arjun/` | `%APPDATA%\arjun\` |
//!
//! # Environment Overrides
//!
//! - `ARJUN_DATA_DIR` overrides [`data_dir`]
//! - `ARJUN_CONFIG_DIR` overrides [`config_dir`]

use std::path::{Path, PathBuf};

/// Application data root directory.
///
/// Holds the fact memory, custom commands, notes, the episode log and logs.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ARJUN_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("arjun"))
        .unwrap_or_else(|| PathBuf::from("/tmp/arjun-data"))
}

/// Application config directory.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ARJUN_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("arjun"))
        .unwrap_or_else(|| PathBuf::from("/tmp/arjun-config"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Log file directory under a data root.
#[must_use]
pub fn logs_dir(root: &Path) -> PathBuf {
    root.join("logs")
}

/// Every persisted file the assistant touches, resolved under one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    /// Data root.
    pub root: PathBuf,
    /// Learned facts, one `- ...` line per fact.
    pub memory_file: PathBuf,
    /// Custom commands (`{"commands": [...]}`).
    pub commands_file: PathBuf,
    /// Timestamped notes.
    pub notes_file: PathBuf,
    /// Append-only episode log (JSONL).
    pub episode_log: PathBuf,
    /// Applied self-improvement instructions.
    pub improvements_file: PathBuf,
}

impl StoragePaths {
    #[must_use]
    pub fn under(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            memory_file: root.join("arjun_memory.txt"),
            commands_file: root.join("custom_commands.json"),
            notes_file: root.join("notes.txt"),
            episode_log: root.join("episodes.jsonl"),
            improvements_file: root.join("improvements.txt"),
        }
    }

    /// Create the data root if it does not exist yet.
    pub fn ensure_root(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }
}
