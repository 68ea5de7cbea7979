//! Dataset building from a log produced by a real session.

use crate::helpers::{Harness, website};
use arjun::dataset::{self, DatasetOptions};

#[test]
fn session_log_converts_to_chat_examples() {
    let mut h = Harness::with_commands(&[website("netflix", "https://netflix.com")]);
    h.completion.reply("Rust is a systems programming language.");
    h.assistant.handle_utterance("open netflix");
    h.assistant.handle_utterance("describe rust to me");
    // Failed turn: logged with an empty reply, so it cannot become an example.
    h.assistant.handle_utterance("describe go to me");

    let out = h.dir.path().join("export").join("dataset.jsonl");
    let report = dataset::build_file(
        h.assistant.episodes().path(),
        &out,
        &DatasetOptions::default(),
    )
    .unwrap();

    assert_eq!(report.total_lines, 3);
    assert_eq!(report.written, 2);
    assert_eq!(report.missing_fields, 1);

    let body = std::fs::read_to_string(&out).unwrap();
    let examples: Vec<serde_json::Value> = body
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(examples[0]["messages"][0]["content"], "open netflix");
    assert_eq!(examples[0]["messages"][1]["content"], "Opening netflix...");
    assert_eq!(
        examples[1]["messages"][1]["content"],
        "Rust is a systems programming language."
    );
}
