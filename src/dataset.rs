//! Fine-tuning dataset builder over the episode log.
//!
//! Each usable log line becomes one chat-format example:
//!
//! ```json
//! {"messages":[{"role":"user","content":"..."},{"role":"assistant","content":"..."}]}
//! ```
//!
//! Logs from older assistant builds used different key names, so user and
//! assistant text are taken from the first non-empty key of a candidate list.

use crate::error::{ArjunError, Result};
use serde_json::{Map, Value};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Keys tried for the user's text, in order.
pub const USER_KEYS: [&str; 5] = ["query", "user", "user_input", "prompt", "question"];

/// Keys tried for the assistant's text, in order.
pub const ASSISTANT_KEYS: [&str; 6] = [
    "assistant_reply",
    "reply",
    "response",
    "assistant",
    "final_reply",
    "answer",
];

/// Filters applied while building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetOptions {
    pub max_examples: Option<usize>,
    /// Minimum user text length, in characters.
    pub min_user_len: usize,
    /// Minimum assistant text length, in characters.
    pub min_assistant_len: usize,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            max_examples: None,
            min_user_len: 4,
            min_assistant_len: 4,
        }
    }
}

/// Counters reported after a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetReport {
    pub total_lines: usize,
    pub written: usize,
    pub malformed: usize,
    pub missing_fields: usize,
}

/// First non-empty trimmed string among `keys`.
fn pick_first<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| record.get(*k)?.as_str())
        .map(str::trim)
        .find(|v| !v.is_empty())
}

/// Convert a log stream into a dataset stream.
///
/// # Errors
///
/// Returns an error when reading the log or writing the dataset fails.
pub fn build<R: BufRead, W: Write>(
    log: R,
    mut out: W,
    options: &DatasetOptions,
) -> Result<DatasetReport> {
    let mut report = DatasetReport::default();
    for line in log.lines() {
        if options.max_examples.is_some_and(|max| report.written >= max) {
            break;
        }
        let line = line?;
        report.total_lines += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                report.malformed += 1;
                continue;
            }
        };

        let user = pick_first(&record, &USER_KEYS);
        let assistant = pick_first(&record, &ASSISTANT_KEYS);
        let (Some(user), Some(assistant)) = (user, assistant) else {
            report.missing_fields += 1;
            continue;
        };
        if user.chars().count() < options.min_user_len
            || assistant.chars().count() < options.min_assistant_len
        {
            report.missing_fields += 1;
            continue;
        }

        let example = serde_json::json!({
            "messages": [
                {"role": "user", "content": user},
                {"role": "assistant", "content": assistant},
            ]
        });
        let encoded = serde_json::to_string(&example)
            .map_err(|e| ArjunError::Store(format!("encode example: {e}")))?;
        writeln!(out, "{encoded}")?;
        report.written += 1;
    }
    out.flush()?;
    Ok(report)
}

/// File-to-file wrapper around [`build`]; creates the output directory.
///
/// # Errors
///
/// Returns an error when the log is missing or either file cannot be
/// opened.
pub fn build_file(log_path: &Path, out_path: &Path, options: &DatasetOptions) -> Result<DatasetReport> {
    if !log_path.is_file() {
        return Err(ArjunError::Store(format!(
            "log file not found: {}",
            log_path.display()
        )));
    }
    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let reader = BufReader::new(std::fs::File::open(log_path)?);
    let writer = BufWriter::new(std::fs::File::create(out_path)?);
    build(reader, writer, options)
}
