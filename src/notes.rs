//! Dictated notes and spoken file search.

use crate::error::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Replies that confirm an offer ("open it?", "shut down?").
pub const CONFIRM_WORDS: [&str; 8] = [
    "yes", "yeah", "yep", "sure", "open it", "please", "okay", "do it",
];

/// Whether `reply` confirms.
#[must_use]
pub fn is_confirmation(reply: &str) -> bool {
    CONFIRM_WORDS.iter().any(|w| reply.contains(w))
}

/// Timestamped notes file.
#[derive(Debug, Clone)]
pub struct Notebook {
    path: PathBuf,
}

impl Notebook {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append `"<YYYY-MM-DD HH:MM:SS>: <note>"`.
    ///
    /// # Errors
    ///
    /// Returns an error when the notes file cannot be written.
    pub fn add(&self, note: &str) -> Result<()> {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{stamp}: {}", note.trim())?;
        info!("note saved");
        Ok(())
    }

    /// Whole notes file, `None` when it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error when an existing file cannot be read.
    pub fn read(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Spoken file name to a searchable one (`"report dot pdf"` → `"report.pdf"`).
#[must_use]
pub fn spoken_file_name(spoken: &str) -> String {
    spoken.trim().replace(" dot ", ".")
}

/// Home sub-folder for a spoken folder name (`"downloads"` → `~/Downloads`).
#[must_use]
pub fn search_root(home: &Path, spoken_folder: &str) -> PathBuf {
    home.join(title_case(spoken_folder.trim()))
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// First file under `root` whose name contains `needle`, case-insensitively.
///
/// Directories are walked depth-first in read order; unreadable entries are
/// skipped.
#[must_use]
pub fn find_file(root: &Path, needle: &str) -> Option<PathBuf> {
    let needle = needle.to_lowercase();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            debug!(dir = %dir.display(), "skipping unreadable directory");
            continue;
        };
        let mut subdirs = Vec::new();
        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                subdirs.push(entry.path());
            } else if entry
                .file_name()
                .to_string_lossy()
                .to_lowercase()
                .contains(&needle)
            {
                return Some(entry.path());
            }
        }
        // Files of a directory win over its subdirectories.
        stack.extend(subdirs.into_iter().rev());
    }
    None
}
