//! Teaching custom commands through the spoken dialog.

use crate::helpers::{Harness, website};
use arjun::app_dirs::StoragePaths;
use arjun::commands::{self, CommandKind};
use arjun::dialog::CancelReason;
use arjun::platform::OsAction;

fn store_path(h: &Harness) -> std::path::PathBuf {
    StoragePaths::under(&h.dir.path().join("data")).commands_file
}

#[test]
fn website_command_is_learned_and_persisted() {
    let mut h = Harness::new();
    h.voice.push(&["youtube", "open website", "youtube.com"]);

    h.assistant.handle_utterance("learn a new command");

    assert_eq!(h.assistant.commands().len(), 1);
    let saved = commands::load(&store_path(&h));
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].trigger, "youtube");
    assert_eq!(saved[0].kind, CommandKind::Website);
    assert_eq!(saved[0].target, "https://youtube.com");
    assert!(h.voice.spoken().iter().any(|s| {
        s == "Command saved. When you say 'youtube', I will perform the action."
    }));
    let episode = &h.episodes()[0];
    assert_eq!(episode.handler, "learn_command");
    assert!(episode.success);

    // The new trigger routes immediately.
    h.assistant.handle_utterance("open youtube");
    assert_eq!(
        h.os.actions(),
        vec![OsAction::OpenUrl("https://youtube.com".to_owned())]
    );
}

#[test]
fn app_command_reads_path_from_clipboard() {
    let mut h = Harness::new();
    h.os.set_clipboard("  /usr/bin/gedit \n");
    h.voice
        .push(&["editor", "run application", "one moment", "done", "gedit"]);

    h.assistant.handle_utterance("learn a new command");

    let saved = commands::load(&store_path(&h));
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].kind, CommandKind::App);
    assert_eq!(saved[0].target, "/usr/bin/gedit");
    assert_eq!(saved[0].process_name.as_deref(), Some("gedit.exe"));
    assert_eq!(h.os.actions(), vec![OsAction::ReadClipboard]);
}

#[test]
fn cancelled_dialog_leaves_store_unchanged() {
    let mut h = Harness::with_commands(&[website("netflix", "https://netflix.com")]);
    let before = std::fs::read_to_string(store_path(&h)).unwrap();
    h.voice.push(&["spotify", "cancel"]);

    h.assistant.handle_utterance("learn a new command");

    assert_eq!(h.assistant.commands().len(), 1);
    assert_eq!(std::fs::read_to_string(store_path(&h)).unwrap(), before);
    assert!(
        h.voice
            .spoken()
            .contains(&CancelReason::UserCancelled.message().to_owned())
    );
    let episode = &h.episodes()[0];
    assert!(!episode.success);
    assert!(episode.notes.contains("UserCancelled"));
}

#[test]
fn silence_and_empty_clipboard_cancel() {
    let mut h = Harness::new();
    // Nothing scripted: the first listen returns the no-speech sentinel.
    h.assistant.handle_utterance("learn a new command");
    assert!(
        h.voice
            .spoken()
            .contains(&CancelReason::NoSpeech.message().to_owned())
    );

    h.voice.push(&["editor", "application", "done"]);
    h.assistant.handle_utterance("new command");
    assert!(
        h.voice
            .spoken()
            .contains(&CancelReason::EmptyClipboard.message().to_owned())
    );
    assert!(h.assistant.commands().is_empty());

    // A fresh attempt starts over from the trigger question.
    h.voice.push(&["netflix", "website", "netflix.com"]);
    h.assistant.handle_utterance("learn a new command");
    assert_eq!(h.assistant.commands().len(), 1);
}
