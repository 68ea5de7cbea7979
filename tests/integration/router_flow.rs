//! End-to-end session behaviour over scripted capabilities.

use crate::helpers::{Harness, app, website};
use arjun::app_dirs::StoragePaths;
use arjun::history::Role;
use arjun::personality::Persona;
use arjun::platform::OsAction;
use arjun::router::{CHAT_APOLOGY, Flow, GateState, QUIT_LINE, WAKE_LINE};
use arjun::self_improve;
use arjun::ui::UiMessage;
use std::time::Duration;

#[test]
fn custom_website_command_opens_and_logs() {
    let mut h = Harness::with_commands(&[website("netflix", "https://netflix.com")]);

    assert_eq!(h.assistant.handle_utterance("Open Netflix"), Flow::Continue);

    assert_eq!(
        h.os.actions(),
        vec![OsAction::OpenUrl("https://netflix.com".to_owned())]
    );
    assert_eq!(h.voice.spoken(), vec!["Opening netflix...".to_owned()]);
    let episodes = h.episodes();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].query, "open netflix");
    assert_eq!(episodes[0].handler, "custom_command_open");
    assert_eq!(episodes[0].assistant_reply, "Opening netflix...");
    assert!(episodes[0].success);
}

#[test]
fn custom_app_command_closes_by_process_name() {
    let mut h = Harness::with_commands(&[app("notepad", "C:\\notepad.exe", "notepad.exe")]);

    h.assistant.handle_utterance("close notepad");

    assert_eq!(
        h.os.actions(),
        vec![OsAction::Kill {
            process_name: "notepad.exe".to_owned()
        }]
    );
    assert_eq!(h.episodes()[0].handler, "custom_command_close");
}

#[test]
fn failed_custom_command_is_logged_as_failure() {
    let mut h = Harness::with_commands(&[website("netflix", "https://netflix.com")]);
    h.os.set_failing(true);

    h.assistant.handle_utterance("open netflix");

    let episode = &h.episodes()[0];
    assert!(!episode.success);
    assert_eq!(episode.assistant_reply, "");
    assert!(episode.notes.contains("helper not installed"));
}

#[test]
fn sleeping_assistant_only_listens_for_wake_phrase() {
    let mut h = Harness::new();
    h.voice.push(&[
        "go to sleep",
        "what is the time",
        "wake up",
        "what is the time",
        "go to sleep",
        "hey arjun",
    ]);

    h.assistant.step();
    assert_eq!(h.assistant.gate(), GateState::Asleep);

    h.voice.clear_spoken();
    h.assistant.step();
    assert_eq!(h.assistant.gate(), GateState::Asleep);
    assert!(h.voice.spoken().is_empty(), "asleep turns are ignored");

    h.assistant.step();
    assert_eq!(h.assistant.gate(), GateState::Awake);
    assert_eq!(h.voice.spoken(), vec![WAKE_LINE.to_owned()]);

    h.assistant.step();
    assert!(h.voice.spoken()[1].starts_with("Sir, the time is "));

    h.assistant.step();
    assert_eq!(h.assistant.gate(), GateState::Asleep);
    h.voice.clear_spoken();
    h.assistant.step();
    assert_eq!(h.assistant.gate(), GateState::Awake);
    assert_eq!(h.voice.spoken(), vec![WAKE_LINE.to_owned()]);

    let events = h.ui_events();
    assert_eq!(
        events,
        vec![
            UiMessage::Sleeping,
            UiMessage::Awake,
            UiMessage::Sleeping,
            UiMessage::Awake
        ]
    );
    let handlers: Vec<String> = h.episodes().into_iter().map(|e| e.handler).collect();
    assert_eq!(handlers, vec!["sleep", "time", "sleep"]);
}

#[test]
fn ui_controls_apply_at_the_next_iteration() {
    let mut h = Harness::new();

    h.handle.set_persona(Persona::Jarvis);
    h.handle.toggle_sleep();
    h.handle.toggle_sleep();
    h.assistant.step();

    assert_eq!(h.assistant.session().persona(), Persona::Jarvis);
    // Two requests before the loop looked collapse into one toggle.
    assert_eq!(h.assistant.gate(), GateState::Asleep);
    let events = h.ui_events();
    assert_eq!(
        events,
        vec![
            UiMessage::Mode(Persona::Jarvis),
            UiMessage::WakeWord("Jarvis".to_owned()),
            UiMessage::Sleeping,
        ]
    );

    h.handle.toggle_sleep();
    h.assistant.step();
    assert_eq!(h.assistant.gate(), GateState::Awake);
}

#[test]
fn persona_switch_starts_a_fresh_conversation() {
    let mut h = Harness::new();
    h.completion.reply("Hello there!");
    h.assistant.handle_utterance("how are you doing");
    assert_eq!(h.assistant.session().history().len(), 3);
    let friendly_prompt = h.assistant.session().system_prompt().to_owned();

    h.assistant.handle_utterance("switch to jarvis mode");

    let session = h.assistant.session();
    assert_eq!(session.persona(), Persona::Jarvis);
    assert_eq!(session.history().len(), 1);
    assert_ne!(session.system_prompt(), friendly_prompt);
    assert_eq!(
        session.history().system_message(),
        Some(session.system_prompt())
    );
    assert!(h.voice.spoken().contains(&"Jarvis mode activated.".to_owned()));
    assert!(h.ui_events().contains(&UiMessage::Mode(Persona::Jarvis)));

    // The jarvis wake word now controls sleep.
    h.assistant.handle_utterance("stop jarvis");
    assert_eq!(h.assistant.gate(), GateState::Asleep);
}

#[test]
fn chat_history_stays_bounded() {
    let mut h = Harness::with(|c| c.conversation.history_limit = 5, &[]);
    for i in 0..6 {
        h.completion.reply(&format!("answer {i}"));
        h.assistant.handle_utterance(&format!("tell me something {i}"));
    }

    let history = h.assistant.session().history();
    assert_eq!(history.len(), 5);
    let messages = history.messages();
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[4].content, "answer 5");
    assert_eq!(messages[3].content, "tell me something 5");
}

#[test]
fn chat_sends_persona_model_and_history() {
    let mut h = Harness::new();
    h.completion.reply("Greetings, it is nice out.");

    h.assistant.handle_utterance("how is it going");

    let calls = h.completion.calls();
    assert_eq!(calls.len(), 1);
    let (model, messages) = &calls[0];
    assert_eq!(model, "arjun-custom");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "how is it going");
    // Friendly persona drops the stiff opener.
    assert_eq!(h.voice.spoken(), vec!["it is nice out.".to_owned()]);
}

#[test]
fn chat_failure_apologises_and_leaves_history_untouched() {
    let mut h = Harness::new();
    h.completion.fail();

    h.assistant.handle_utterance("how is it going");

    assert_eq!(h.voice.spoken(), vec![CHAT_APOLOGY.to_owned()]);
    assert_eq!(h.assistant.session().history().len(), 1);
    let episode = &h.episodes()[0];
    assert_eq!(episode.handler, "chat");
    assert!(!episode.success);
    assert_eq!(episode.assistant_reply, "");
}

#[test]
fn knowledge_questions_carry_context() {
    let mut h = Harness::new();
    h.knowledge
        .set_summary("Alan Turing was an English mathematician.");
    h.completion.reply("He was a pioneer of computing.");

    h.assistant.handle_utterance("who is alan turing");

    let calls = h.completion.calls();
    let forwarded = &calls[0].1.last().unwrap().content;
    assert_eq!(
        forwarded,
        "who is alan turing\n\n[Context: Alan Turing was an English mathematician.]"
    );
    assert_eq!(
        h.voice.spoken()[0],
        "I found this on Wikipedia about alan turing."
    );
}

#[test]
fn remembered_name_is_recalled() {
    let mut h = Harness::new();

    h.assistant.handle_utterance("arjun remember my name is ravi");
    h.assistant.handle_utterance("what is my name");

    assert_eq!(h.assistant.session().user_name(), Some("ravi"));
    assert!(h.assistant.session().system_prompt().contains("- The user's name is ravi"));
    assert_eq!(
        h.voice.spoken().last().map(String::as_str),
        Some("Your name is ravi, sir.")
    );
}

#[test]
fn timers_are_scheduled_and_bad_durations_fail() {
    let mut h = Harness::new();

    h.assistant.handle_utterance("set a timer for 5 minutes");
    h.assistant.handle_utterance("set a timer for a while");

    let scheduled = h.reminders.scheduled();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].0, Duration::from_secs(300));
    assert_eq!(scheduled[0].1, "Sir, your timer for 5 minutes is up.");
    let successes: Vec<bool> = h.episodes().into_iter().map(|e| e.success).collect();
    assert_eq!(successes, vec![true, false]);
}

#[test]
fn power_actions_need_confirmation() {
    let mut h = Harness::new();
    h.voice.push(&["no thanks"]);
    h.assistant.handle_utterance("shutdown the computer");
    assert!(h.os.actions().is_empty());
    assert_eq!(h.voice.spoken().last().unwrap(), "Shutdown cancelled.");

    h.voice.push(&["yes"]);
    h.assistant.handle_utterance("restart my pc");
    assert_eq!(h.os.actions(), vec![OsAction::Restart]);
}

#[test]
fn invalid_self_improvement_changes_nothing() {
    let mut h = Harness::new();
    h.completion.reply("Hi!");
    h.assistant.handle_utterance("hello there");
    let revision = h.assistant.session().prompt_revision();
    let prompt = h.assistant.session().system_prompt().to_owned();

    h.completion.reply("Sure! I think you should be nicer.");
    h.voice.clear_spoken();
    h.assistant.handle_utterance("improve yourself");

    let spoken = h.voice.spoken();
    assert_eq!(
        spoken
            .iter()
            .filter(|s| s.as_str() == self_improve::MSG_INVALID)
            .count(),
        1
    );
    assert!(!spoken.contains(&self_improve::MSG_APPLIED.to_owned()));
    assert_eq!(h.assistant.session().prompt_revision(), revision);
    assert_eq!(h.assistant.session().system_prompt(), prompt);
    assert_eq!(h.assistant.session().evolution_append(), "");
}

#[test]
fn valid_self_improvement_extends_the_prompt_once() {
    let mut h = Harness::new();
    h.completion.reply("Hi!");
    h.assistant.handle_utterance("hello there");
    let revision = h.assistant.session().prompt_revision();

    h.completion.reply(
        "Here you go:\n```json\n{\"new_triggers\": [{\"trigger\": \"play lofi\", \"handler\": \"music_play\", \"reason\": \"asked twice\"}], \"system_prompt_append\": \"Keep answers short.\"}\n```",
    );
    h.assistant.handle_utterance("improve yourself");

    let session = h.assistant.session();
    assert_eq!(session.evolution_append(), "\n\nKeep answers short.");
    assert_eq!(session.prompt_revision(), revision + 1);
    assert!(session.system_prompt().ends_with("Keep answers short."));
    assert!(h.voice.spoken().contains(&self_improve::MSG_APPLIED.to_owned()));

    // The review model saw the logged turn.
    let calls = h.completion.calls();
    let (model, review) = calls.last().unwrap();
    assert_eq!(model, "llama3:8b");
    assert!(review[0].content.contains("\"query\":\"hello there\""));

    let improvements = std::fs::read_to_string(
        StoragePaths::under(&h.dir.path().join("data")).improvements_file,
    )
    .unwrap();
    assert!(improvements.contains("Keep answers short."));
    assert!(improvements.contains("play lofi"));
}

#[test]
fn null_prompt_append_is_accepted_without_change() {
    let mut h = Harness::new();
    h.completion.reply("Hi!");
    h.assistant.handle_utterance("hello there");
    let revision = h.assistant.session().prompt_revision();
    let prompt = h.assistant.session().system_prompt().to_owned();

    h.completion
        .reply(r#"{"new_triggers": null, "system_prompt_append": null}"#);
    h.voice.clear_spoken();
    h.assistant.handle_utterance("improve yourself");

    let spoken = h.voice.spoken();
    assert!(!spoken.contains(&self_improve::MSG_INVALID.to_owned()));
    assert!(spoken.contains(&self_improve::MSG_APPLIED.to_owned()));
    assert_eq!(h.assistant.session().prompt_revision(), revision);
    assert_eq!(h.assistant.session().system_prompt(), prompt);
    assert!(h.episodes().last().unwrap().success);
}

#[test]
fn plain_string_triggers_still_apply_the_append() {
    let mut h = Harness::new();
    h.completion.reply("Hi!");
    h.assistant.handle_utterance("hello there");
    let revision = h.assistant.session().prompt_revision();

    h.completion
        .reply(r#"{"new_triggers": ["say hi"], "system_prompt_append": "X"}"#);
    h.assistant.handle_utterance("improve yourself");

    let session = h.assistant.session();
    assert_eq!(session.evolution_append(), "\n\nX");
    assert_eq!(session.prompt_revision(), revision + 1);
    let improvements = std::fs::read_to_string(
        StoragePaths::under(&h.dir.path().join("data")).improvements_file,
    )
    .unwrap();
    assert!(improvements.contains("- \"say hi\""));
}

#[test]
fn self_improvement_without_history_says_so() {
    let mut h = Harness::new();

    h.assistant.handle_utterance("improve yourself");

    assert!(h.voice.spoken().contains(&self_improve::MSG_NO_HISTORY.to_owned()));
    assert!(h.completion.calls().is_empty());
}

#[test]
fn quit_ends_the_loop() {
    let mut h = Harness::new();

    assert_eq!(h.assistant.handle_utterance("exit"), Flow::Quit);

    assert_eq!(h.voice.spoken(), vec![QUIT_LINE.to_owned()]);
    assert_eq!(h.ui_events(), vec![UiMessage::Quit]);
    assert_eq!(h.episodes()[0].handler, "quit");
}

#[test]
fn no_speech_is_not_logged() {
    let mut h = Harness::new();

    assert_eq!(h.assistant.step(), Flow::Continue);
    assert_eq!(h.assistant.handle_utterance("none"), Flow::Continue);

    assert!(h.episodes().is_empty());
    assert!(h.completion.calls().is_empty());
}
