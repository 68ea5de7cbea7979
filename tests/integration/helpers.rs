//! Scripted doubles and a session harness shared by the integration tests.

use arjun::commands::{self, Command};
use arjun::config::ArjunConfig;
use arjun::error::{ArjunError, Result};
use arjun::history::ChatMessage;
use arjun::integrations::{Integrations, MailRequest};
use arjun::knowledge::KnowledgeSource;
use arjun::llm::Completion;
use arjun::platform::{OsAction, OsActions};
use arjun::reminders::ReminderScheduler;
use arjun::router::{Assistant, Capabilities};
use arjun::ui::{AssistantHandle, UiMessage, UiReceiver, control_channel, status_channel};
use arjun::voice::{NO_SPEECH, Speaker, Voice};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Voice fed from a queue of transcripts; records everything spoken.
#[derive(Default)]
pub(crate) struct ScriptedVoice {
    heard: Mutex<VecDeque<String>>,
    spoken: Mutex<Vec<String>>,
}

impl ScriptedVoice {
    pub(crate) fn push(&self, lines: &[&str]) {
        let mut heard = self.heard.lock().unwrap();
        heard.extend(lines.iter().map(|l| (*l).to_owned()));
    }

    pub(crate) fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub(crate) fn clear_spoken(&self) {
        self.spoken.lock().unwrap().clear();
    }
}

impl Voice for ScriptedVoice {
    fn listen(&self) -> String {
        self.heard
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| NO_SPEECH.to_owned())
    }

    fn say(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_owned());
    }
}

/// Completion backend answering from a queue; an empty queue is an outage.
#[derive(Default)]
pub(crate) struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl ScriptedCompletion {
    pub(crate) fn reply(&self, text: &str) {
        self.replies.lock().unwrap().push_back(Ok(text.to_owned()));
    }

    pub(crate) fn fail(&self) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(ArjunError::Http("connection refused".to_owned())));
    }

    pub(crate) fn calls(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Completion for ScriptedCompletion {
    fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_owned(), messages.to_vec()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ArjunError::Llm("no scripted reply".to_owned())))
    }
}

/// Records host actions instead of performing them.
#[derive(Default)]
pub(crate) struct FakeOs {
    actions: Mutex<Vec<OsAction>>,
    clipboard: Mutex<String>,
    failing: AtomicBool,
}

impl FakeOs {
    pub(crate) fn set_clipboard(&self, text: &str) {
        *self.clipboard.lock().unwrap() = text.to_owned();
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn actions(&self) -> Vec<OsAction> {
        self.actions.lock().unwrap().clone()
    }
}

impl OsActions for FakeOs {
    fn run_os_action(&self, action: &OsAction) -> Result<Option<String>> {
        self.actions.lock().unwrap().push(action.clone());
        if self.failing.load(Ordering::SeqCst) {
            return Err(ArjunError::Os("helper not installed".to_owned()));
        }
        Ok(match action {
            OsAction::ReadClipboard => Some(self.clipboard.lock().unwrap().clone()),
            OsAction::SystemStatus => {
                Some("CPU usage is at 12 percent and RAM usage is at 40 percent.".to_owned())
            }
            OsAction::BrightnessUp => Some("60".to_owned()),
            OsAction::BrightnessDown => Some("40".to_owned()),
            _ => None,
        })
    }
}

/// Knowledge source with one canned summary (or none).
#[derive(Default)]
pub(crate) struct FakeKnowledge {
    summary: Mutex<Option<String>>,
}

impl FakeKnowledge {
    pub(crate) fn set_summary(&self, text: &str) {
        *self.summary.lock().unwrap() = Some(text.to_owned());
    }
}

impl KnowledgeSource for FakeKnowledge {
    fn summary(&self, topic: &str, _sentences: usize) -> Result<String> {
        self.summary
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| ArjunError::Lookup(format!("no page for {topic}")))
    }
}

/// Fixed weather and headlines; mail is never configured.
pub(crate) struct FakeIntegrations;

impl Integrations for FakeIntegrations {
    fn weather(&self, city: &str) -> Result<String> {
        Ok(format!("Sunny +31°C in {city}"))
    }

    fn headlines(&self) -> Result<Vec<String>> {
        Ok(vec!["First headline".to_owned(), "Second headline".to_owned()])
    }

    fn mail(&self, _request: &MailRequest) -> Result<String> {
        Err(ArjunError::Integration("mail is not configured".to_owned()))
    }
}

/// Keeps scheduled reminders for inspection.
#[derive(Default)]
pub(crate) struct RecordingReminders {
    scheduled: Mutex<Vec<(Duration, String)>>,
}

impl RecordingReminders {
    pub(crate) fn scheduled(&self) -> Vec<(Duration, String)> {
        self.scheduled.lock().unwrap().clone()
    }
}

impl ReminderScheduler for RecordingReminders {
    fn schedule(&self, delay: Duration, announcement: String) {
        self.scheduled.lock().unwrap().push((delay, announcement));
    }
}

/// An [`Assistant`] wired to doubles over a temporary data root.
pub(crate) struct Harness {
    pub(crate) assistant: Assistant,
    pub(crate) voice: Arc<ScriptedVoice>,
    pub(crate) completion: Arc<ScriptedCompletion>,
    pub(crate) os: Arc<FakeOs>,
    pub(crate) knowledge: Arc<FakeKnowledge>,
    pub(crate) reminders: Arc<RecordingReminders>,
    pub(crate) ui: UiReceiver,
    pub(crate) handle: AssistantHandle,
    pub(crate) dir: tempfile::TempDir,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with(|_| {}, &[])
    }

    pub(crate) fn with_commands(commands: &[Command]) -> Self {
        Self::with(|_| {}, commands)
    }

    /// Build with a config tweak and pre-seeded custom commands.
    pub(crate) fn with(tweak: impl FnOnce(&mut ArjunConfig), seed: &[Command]) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut config = ArjunConfig::default();
        config.storage.root_dir = dir.path().join("data");
        tweak(&mut config);
        if !seed.is_empty() {
            let paths = arjun::app_dirs::StoragePaths::under(&config.storage.root_dir);
            commands::save(&paths.commands_file, seed).expect("seed commands");
        }

        let voice = Arc::new(ScriptedVoice::default());
        let completion = Arc::new(ScriptedCompletion::default());
        let os = Arc::new(FakeOs::default());
        let knowledge = Arc::new(FakeKnowledge::default());
        let reminders = Arc::new(RecordingReminders::default());
        let (ui_tx, ui) = status_channel();
        let (handle, inbox) = control_channel();
        let speaker = Speaker::new(voice.clone(), ui_tx.clone(), config.conversation.default_persona);
        let caps = Capabilities {
            completion: completion.clone(),
            os: os.clone(),
            knowledge: knowledge.clone(),
            integrations: Arc::new(FakeIntegrations),
            reminders: reminders.clone(),
        };
        let assistant =
            Assistant::new(config, speaker, ui_tx, inbox, caps).with_home_dir(dir.path().join("home"));

        Self {
            assistant,
            voice,
            completion,
            os,
            knowledge,
            reminders,
            ui,
            handle,
            dir,
        }
    }

    /// Every non-status UI message queued so far.
    pub(crate) fn ui_events(&self) -> Vec<UiMessage> {
        self.ui
            .drain()
            .into_iter()
            .filter(|m| !matches!(m, UiMessage::Status(_)))
            .collect()
    }

    /// Parsed episode log.
    pub(crate) fn episodes(&self) -> Vec<arjun::episodes::Episode> {
        let path = self.assistant.episodes().path();
        let Ok(body) = std::fs::read_to_string(path) else {
            return Vec::new();
        };
        body.lines()
            .map(|l| serde_json::from_str(l).expect("episode line"))
            .collect()
    }
}

pub(crate) fn website(trigger: &str, target: &str) -> Command {
    Command {
        trigger: trigger.to_owned(),
        kind: arjun::commands::CommandKind::Website,
        target: target.to_owned(),
        process_name: None,
    }
}

pub(crate) fn app(trigger: &str, target: &str, process_name: &str) -> Command {
    Command {
        trigger: trigger.to_owned(),
        kind: arjun::commands::CommandKind::App,
        target: target.to_owned(),
        process_name: Some(process_name.to_owned()),
    }
}
