//! Session loop and intent router.
//!
//! [`Assistant`] owns all conversation state and runs on one dedicated
//! worker. Each iteration:
//!
//! 1. consumes pending UI controls (persona request, sleep toggle),
//! 2. listens once,
//! 3. while asleep, only checks for a wake phrase,
//! 4. while awake, dispatches through [`route`]: sleep phrases, then custom
//!    commands, then the built-in [`INTENT_TABLE`](crate::intents::INTENT_TABLE),
//!    then chat,
//! 5. records the finished turn in the episode log.

use crate::app_dirs::StoragePaths;
use crate::commands::{Command, CommandAction, CommandKind, CommandStore, match_command};
use crate::config::ArjunConfig;
use crate::dialog::{self, DialogOutcome};
use crate::episodes::{Episode, EpisodeLog};
use crate::history::{ChatMessage, Role};
use crate::integrations::{Integrations, MailRequest};
use crate::intents::{self, BuiltinIntent, Cue, JOKES};
use crate::knowledge::{self, KnowledgeSource};
use crate::llm::Completion;
use crate::memory::{self, FactStore};
use crate::notes::{self, Notebook};
use crate::personality::{self, Persona};
use crate::platform::{OsAction, OsActions};
use crate::reminders::{self, ReminderScheduler};
use crate::self_improve::{self, RecoveryError};
use crate::session::SessionState;
use crate::ui::{ControlInbox, UiMessage, UiSender};
use crate::voice::{Speaker, is_no_speech};
use rand::seq::SliceRandom;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Spoken when the chat backend fails.
pub const CHAT_APOLOGY: &str = "I'm having trouble connecting to my brain.";
/// Spoken when a narration request fails.
pub const GENERATE_APOLOGY: &str =
    "I'm having trouble connecting to my local AI brain. Is the model server running?";
pub const WELCOME_LINE: &str = "Welcome to Arjun A.I. I have loaded your custom commands.";
pub const WAKE_LINE: &str = "I am online and ready, sir.";
pub const SLEEP_LINE: &str = "Going to sleep, sir.";
pub const QUIT_LINE: &str = "Goodbye sir. Shutting down.";

/// Upper bound on knowledge sentences appended to a chat turn.
const MAX_KNOWLEDGE_SENTENCES: usize = 2;

const WEATHER_REPORT_PROMPT: &str = "You are a weather reporter. State the following weather data \
                                     in one simple sentence, starting directly with the conditions: ";

/// Black-box capabilities the router drives.
#[derive(Clone)]
pub struct Capabilities {
    pub completion: Arc<dyn Completion>,
    pub os: Arc<dyn OsActions>,
    pub knowledge: Arc<dyn KnowledgeSource>,
    pub integrations: Arc<dyn Integrations>,
    pub reminders: Arc<dyn ReminderScheduler>,
}

/// Top-level listening state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Awake,
    Asleep,
}

/// Where an awake utterance is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Sleep,
    Custom { index: usize, action: CommandAction },
    Builtin(BuiltinIntent),
    Chat,
}

impl Route {
    /// Handler name recorded in the episode log.
    #[must_use]
    pub fn handler_name(self) -> &'static str {
        match self {
            Self::Sleep => "sleep",
            Self::Custom {
                action: CommandAction::Open,
                ..
            } => "custom_command_open",
            Self::Custom {
                action: CommandAction::Close,
                ..
            } => "custom_command_close",
            Self::Builtin(intent) => intent.name(),
            Self::Chat => "chat",
        }
    }
}

/// First-match-wins dispatch for an awake, lower-cased utterance.
#[must_use]
pub fn route(commands: &[Command], utterance: &str, persona: Persona) -> Route {
    let cue = Cue::new(utterance, persona);
    if intents::is_sleep_request(cue) {
        return Route::Sleep;
    }
    if let Some((index, action)) = match_command(commands, utterance) {
        return Route::Custom { index, action };
    }
    match intents::classify(cue) {
        Some(intent) => Route::Builtin(intent),
        None => Route::Chat,
    }
}

/// Whether the loop keeps going after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Result of one handler, before episode logging.
#[derive(Debug)]
struct Handled {
    success: bool,
    notes: String,
}

impl Handled {
    fn ok() -> Self {
        Self {
            success: true,
            notes: String::new(),
        }
    }

    fn failed(notes: impl ToString) -> Self {
        Self {
            success: false,
            notes: notes.to_string(),
        }
    }
}

/// The assistant session: state, stores and capabilities.
pub struct Assistant {
    config: ArjunConfig,
    paths: StoragePaths,
    session: SessionState,
    commands: CommandStore,
    facts: FactStore,
    notebook: Notebook,
    episodes: EpisodeLog,
    speaker: Speaker,
    ui: UiSender,
    inbox: ControlInbox,
    caps: Capabilities,
    gate: GateState,
    home_dir: Option<PathBuf>,
    /// Lines spoken during the current turn.
    spoken: Vec<String>,
}

impl Assistant {
    /// Load persisted facts and commands under the configured data root.
    pub fn new(
        config: ArjunConfig,
        speaker: Speaker,
        ui: UiSender,
        inbox: ControlInbox,
        caps: Capabilities,
    ) -> Self {
        let paths = StoragePaths::under(&config.storage.root_dir);
        if let Err(e) = paths.ensure_root() {
            warn!(root = %paths.root.display(), "failed to create data root: {e}");
        }
        let facts = FactStore::new(&paths.memory_file);
        let persona = config.conversation.default_persona;
        let session = SessionState::new(persona, facts.load(), config.conversation.history_limit);
        let commands = CommandStore::open(&paths.commands_file);
        speaker.set_persona(persona);
        info!(
            persona = %persona,
            facts = session.facts().len(),
            commands = commands.len(),
            "assistant initialised"
        );

        Self {
            notebook: Notebook::new(&paths.notes_file),
            episodes: EpisodeLog::new(&paths.episode_log),
            home_dir: dirs::home_dir(),
            config,
            paths,
            session,
            commands,
            facts,
            speaker,
            ui,
            inbox,
            caps,
            gate: GateState::Awake,
            spoken: Vec::new(),
        }
    }

    /// Search root for the file-search dialog (defaults to the home directory).
    #[must_use]
    pub fn with_home_dir(mut self, home: impl Into<PathBuf>) -> Self {
        self.home_dir = Some(home.into());
        self
    }

    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    #[must_use]
    pub fn commands(&self) -> &CommandStore {
        &self.commands
    }

    #[must_use]
    pub fn gate(&self) -> GateState {
        self.gate
    }

    #[must_use]
    pub fn episodes(&self) -> &EpisodeLog {
        &self.episodes
    }

    /// Run until the quit phrase.
    pub fn run(&mut self) {
        self.start();
        while self.step() == Flow::Continue {}
        info!("session loop finished");
    }

    /// Greet and publish the initial UI state.
    pub fn start(&mut self) {
        let persona = self.session.persona();
        self.ui.send(UiMessage::Mode(persona));
        self.ui.send(UiMessage::WakeWord(persona.display_name().to_owned()));
        self.ui.send(UiMessage::Awake);
        self.ui.status(format!("{} A.I is ready.", persona.display_name()));
        self.speaker.say(WELCOME_LINE);
    }

    /// One loop iteration: controls, one listen, dispatch.
    pub fn step(&mut self) -> Flow {
        self.poll_controls();
        match self.gate {
            GateState::Asleep => {
                let heard = self.speaker.voice().listen();
                if intents::is_wake_request(Cue::new(&heard, self.session.persona())) {
                    self.wake();
                }
                Flow::Continue
            }
            GateState::Awake => {
                self.ui.status("Listening...");
                let heard = self.speaker.voice().listen();
                if is_no_speech(&heard) {
                    return Flow::Continue;
                }
                self.ui.status(format!("User said: {heard}"));
                self.handle_utterance(&heard)
            }
        }
    }

    /// Consume the UI's persona request and sleep toggle.
    pub fn poll_controls(&mut self) {
        if let Some(persona) = self.inbox.take_persona_request() {
            self.switch_persona(persona);
        }
        if self.inbox.take_sleep_toggle() {
            match self.gate {
                GateState::Awake => {
                    debug!("sleep toggled from UI");
                    self.gate = GateState::Asleep;
                    self.ui.send(UiMessage::Sleeping);
                }
                GateState::Asleep => self.wake(),
            }
        }
    }

    fn wake(&mut self) {
        self.gate = GateState::Awake;
        self.ui.send(UiMessage::Awake);
        self.speaker.say(WAKE_LINE);
    }

    /// Dispatch one awake utterance and log the turn.
    pub fn handle_utterance(&mut self, utterance: &str) -> Flow {
        let utterance = utterance.trim().to_lowercase();
        if is_no_speech(&utterance) {
            return Flow::Continue;
        }
        let route = route(self.commands.commands(), &utterance, self.session.persona());
        debug!(?route, "utterance routed");
        self.spoken.clear();

        let handled = match route {
            Route::Sleep => {
                self.say(SLEEP_LINE);
                self.gate = GateState::Asleep;
                self.ui.send(UiMessage::Sleeping);
                Handled::ok()
            }
            Route::Custom { index, action } => self.run_custom(index, action),
            Route::Builtin(intent) => self.run_builtin(intent, &utterance),
            Route::Chat => self.chat(&utterance),
        };

        let reply = if handled.success {
            self.spoken.join(" ")
        } else {
            String::new()
        };
        self.episodes.record(
            &Episode::now(&utterance, reply, route.handler_name(), handled.success)
                .with_notes(handled.notes),
        );

        if route == Route::Builtin(BuiltinIntent::Quit) {
            Flow::Quit
        } else {
            Flow::Continue
        }
    }

    fn say(&mut self, text: &str) {
        self.speaker.say(text);
        self.spoken.push(text.to_owned());
    }

    fn listen(&self) -> String {
        self.speaker.voice().listen()
    }

    /// Switch persona: prompt rebuild, fresh history, voice and UI update.
    pub fn switch_persona(&mut self, persona: Persona) {
        info!(%persona, "switching persona");
        self.session.set_persona(persona);
        self.speaker.set_persona(persona);
        self.say(persona.activation_line());
        self.ui.send(UiMessage::Mode(persona));
        self.ui.send(UiMessage::WakeWord(persona.display_name().to_owned()));
    }

    // ── custom commands ──────────────────────────────────────────────

    fn run_custom(&mut self, index: usize, action: CommandAction) -> Handled {
        let Some(command) = self.commands.commands().get(index).cloned() else {
            return Handled::failed("command index out of range");
        };
        match action {
            CommandAction::Open => self.open_custom(&command),
            CommandAction::Close => self.close_custom(&command),
        }
    }

    fn open_custom(&mut self, command: &Command) -> Handled {
        self.say(&format!("Opening {}...", command.trigger));
        match command.kind {
            CommandKind::Website => {
                match self.caps.os.run_os_action(&OsAction::OpenUrl(command.target.clone())) {
                    Ok(_) => Handled::ok(),
                    Err(e) => {
                        warn!(trigger = %command.trigger, "open website failed: {e}");
                        self.say("Sorry, I couldn't open that website.");
                        Handled::failed(e)
                    }
                }
            }
            CommandKind::App => {
                match self.caps.os.run_os_action(&OsAction::Launch(command.target.clone())) {
                    Ok(_) => Handled::ok(),
                    Err(e) => {
                        warn!(trigger = %command.trigger, "launch failed: {e}");
                        self.say("I couldn't open the file. Check the path.");
                        Handled::failed(e)
                    }
                }
            }
            CommandKind::Weather => self.weather_report(&command.target),
        }
    }

    fn close_custom(&mut self, command: &Command) -> Handled {
        let Some(process_name) = command.process_name.clone().filter(|p| !p.is_empty()) else {
            self.say(&format!(
                "Sorry, I don't know the process name for {}.",
                command.trigger
            ));
            return Handled::failed("no process name");
        };
        match self
            .caps
            .os
            .run_os_action(&OsAction::Kill { process_name })
        {
            Ok(_) => {
                self.say(&format!("Closing {}.", command.trigger));
                Handled::ok()
            }
            Err(e) => {
                warn!(trigger = %command.trigger, "close failed: {e}");
                self.say(&format!(
                    "Sorry, I had trouble trying to close {}.",
                    command.trigger
                ));
                Handled::failed(e)
            }
        }
    }

    // ── built-in intents ─────────────────────────────────────────────

    fn run_builtin(&mut self, intent: BuiltinIntent, utterance: &str) -> Handled {
        match intent {
            BuiltinIntent::LearnCommand => self.learn_command(),
            BuiltinIntent::ClipboardRead => self.read_clipboard(),
            BuiltinIntent::MemoryRemember => self.remember(utterance),
            BuiltinIntent::NotesAdd => self.take_note(),
            BuiltinIntent::NotesRead => self.read_notes(),
            BuiltinIntent::FileSearch => self.find_file(),
            BuiltinIntent::GmailSummary => self.mail(&MailRequest::Summary, "Fetching Gmail summary..."),
            BuiltinIntent::GmailSearch => {
                let request = MailRequest::Search(mail_search_query(utterance));
                self.mail(&request, "Searching your Gmail...")
            }
            BuiltinIntent::GmailImportant => {
                self.mail(&MailRequest::Important, "Checking important emails...")
            }
            BuiltinIntent::GmailAttachments => self.mail(
                &MailRequest::Attachments { days: 7 },
                "Checking recent email attachments...",
            ),
            BuiltinIntent::MusicPlay => self.play_music(),
            BuiltinIntent::UserName => {
                let line = match self.session.user_name() {
                    Some(name) => format!("Your name is {name}, sir."),
                    None => format!(
                        "I don't know your name yet. You can tell me by saying '{} remember my name is...'",
                        self.session.persona().display_name()
                    ),
                };
                self.say(&line);
                Handled::ok()
            }
            BuiltinIntent::Time => {
                let now = chrono::Local::now().format("%H:%M:%S");
                self.say(&format!("Sir, the time is {now}"));
                Handled::ok()
            }
            BuiltinIntent::WeatherBuiltin => match weather_city(utterance) {
                Some(city) => self.weather_report(&city),
                None => {
                    self.say("Which city would you like the weather for?");
                    Handled::failed("no city")
                }
            },
            BuiltinIntent::AlarmSet => {
                let now = chrono::Local::now().naive_local();
                match reminders::parse_alarm(utterance, now) {
                    Some(alarm) => {
                        self.caps
                            .reminders
                            .schedule(alarm.delay, alarm.alarm_announcement());
                        self.say(&format!("Understood. I've set an alarm for {}.", alarm.label));
                        Handled::ok()
                    }
                    None => {
                        self.say("Sorry, I didn't catch that. Please specify a time with AM or PM.");
                        Handled::failed("unparsed alarm time")
                    }
                }
            }
            BuiltinIntent::TimerSet => match reminders::parse_timer(utterance) {
                Some(timer) => {
                    self.caps
                        .reminders
                        .schedule(timer.delay, timer.timer_announcement());
                    self.say(&format!("Okay, timer set for {}.", timer.label));
                    Handled::ok()
                }
                None => {
                    self.say(
                        "Sorry, I didn't understand the duration. Please say 'set a timer for 5 minutes' or '10 seconds'.",
                    );
                    Handled::failed("unparsed timer duration")
                }
            },
            BuiltinIntent::News => self.news(),
            BuiltinIntent::SystemStatus => match self.caps.os.run_os_action(&OsAction::SystemStatus) {
                Ok(Some(status)) => {
                    self.say(&status);
                    Handled::ok()
                }
                Ok(None) => {
                    self.say("Sorry, I am unable to check system status right now.");
                    Handled::failed("empty status")
                }
                Err(e) => {
                    self.say("Sorry, I am unable to check system status right now.");
                    Handled::failed(e)
                }
            },
            BuiltinIntent::VolumeUp => self.simple_action(
                OsAction::VolumeUp,
                "Increasing volume.",
                "Sorry, I couldn't change the volume.",
            ),
            BuiltinIntent::VolumeDown => self.simple_action(
                OsAction::VolumeDown,
                "Decreasing volume.",
                "Sorry, I couldn't change the volume.",
            ),
            BuiltinIntent::MediaPlayPause => self.simple_action(
                OsAction::MediaPlayPause,
                "Okay.",
                "Sorry, I couldn't control playback.",
            ),
            BuiltinIntent::MediaNext => self.simple_action(
                OsAction::MediaNext,
                "Next track.",
                "Sorry, I couldn't control playback.",
            ),
            BuiltinIntent::MediaPrev => self.simple_action(
                OsAction::MediaPrev,
                "Previous track.",
                "Sorry, I couldn't control playback.",
            ),
            BuiltinIntent::BrightnessUp => self.brightness(OsAction::BrightnessUp),
            BuiltinIntent::BrightnessDown => self.brightness(OsAction::BrightnessDown),
            BuiltinIntent::Joke => {
                let joke = JOKES
                    .choose(&mut rand::thread_rng())
                    .copied()
                    .unwrap_or(JOKES[0]);
                self.say(joke);
                Handled::ok()
            }
            BuiltinIntent::Shutdown => self.confirm_power(
                OsAction::Shutdown,
                "Are you sure you want to shutdown the system?",
                "Shutting down the system. Goodbye.",
                "Shutdown cancelled.",
            ),
            BuiltinIntent::Restart => self.confirm_power(
                OsAction::Restart,
                "Are you sure you want to restart the system?",
                "Restarting the system.",
                "Restart cancelled.",
            ),
            BuiltinIntent::Quit => {
                self.say(QUIT_LINE);
                self.ui.send(UiMessage::Quit);
                Handled::ok()
            }
            BuiltinIntent::PersonaJarvis => {
                self.switch_persona(Persona::Jarvis);
                Handled::ok()
            }
            BuiltinIntent::PersonaFriendly => {
                self.switch_persona(Persona::Friendly);
                Handled::ok()
            }
            BuiltinIntent::ResetChat => {
                self.say("Chat history has been reset.");
                self.session.set_facts(self.facts.load());
                Handled::ok()
            }
            BuiltinIntent::SelfImprove => {
                self.say("Okay, I will review recent interactions and try to improve.");
                self.self_improve()
            }
        }
    }

    fn learn_command(&mut self) -> Handled {
        let suffix = self.config.commands.process_suffix.clone();
        let outcome = dialog::run_teach_dialog(
            &self.speaker,
            &self.ui,
            self.caps.os.as_ref(),
            &mut self.commands,
            &suffix,
        );
        match outcome {
            DialogOutcome::Saved(command) => {
                self.spoken
                    .push(format!("Saved command '{}'.", command.trigger));
                Handled::ok()
            }
            DialogOutcome::Cancelled(reason) => {
                self.spoken.push(reason.message().to_owned());
                Handled::failed(format!("cancelled: {reason:?}"))
            }
        }
    }

    fn read_clipboard(&mut self) -> Handled {
        match self.caps.os.run_os_action(&OsAction::ReadClipboard) {
            Ok(Some(text)) if !text.trim().is_empty() => {
                self.say("Your clipboard contains the following text:");
                self.say(text.trim());
                Handled::ok()
            }
            Ok(_) => {
                self.say("Your clipboard is empty.");
                Handled::ok()
            }
            Err(e) => {
                self.say("I had trouble reading your clipboard.");
                Handled::failed(e)
            }
        }
    }

    fn remember(&mut self, utterance: &str) -> Handled {
        let wake_word = self.session.persona().wake_word();
        let Some(fact) = memory::fact_from_utterance(utterance, wake_word) else {
            self.say("What would you like me to remember?");
            return Handled::failed("empty fact");
        };
        match self.facts.append(&fact) {
            Ok(()) => {
                self.say("Okay, I'll remember that.");
                self.session.set_facts(self.facts.load());
                Handled::ok()
            }
            Err(e) => {
                warn!("failed to store fact: {e}");
                self.say("Sorry, I had trouble remembering that.");
                Handled::failed(e)
            }
        }
    }

    fn take_note(&mut self) -> Handled {
        self.say("What should I write down, sir?");
        let note = self.listen();
        if is_no_speech(&note) {
            self.say("I didn't catch that. Note cancelled.");
            return Handled::failed("no speech");
        }
        match self.notebook.add(&note) {
            Ok(()) => {
                self.say("Note saved.");
                Handled::ok()
            }
            Err(e) => {
                warn!("failed to save note: {e}");
                self.say("Sorry, I couldn't save that note.");
                Handled::failed(e)
            }
        }
    }

    fn read_notes(&mut self) -> Handled {
        self.say("Reading your notes...");
        match self.notebook.read() {
            Ok(Some(text)) if !text.trim().is_empty() => {
                self.say(text.trim());
                Handled::ok()
            }
            Ok(Some(_)) => {
                self.say("Your note file is empty.");
                Handled::ok()
            }
            Ok(None) => {
                self.say("I couldn't find any notes.");
                Handled::ok()
            }
            Err(e) => {
                self.say("I couldn't find any notes.");
                Handled::failed(e)
            }
        }
    }

    fn find_file(&mut self) -> Handled {
        self.say("What is the name of the file you are looking for?");
        self.ui.status("Listening for filename...");
        let heard = self.listen();
        if is_no_speech(&heard) {
            self.say("I didn't catch that. Cancelling.");
            return Handled::failed("no file name");
        }
        let file_name = notes::spoken_file_name(&heard);

        self.say("Which folder should I search? For example, Documents, Downloads, or Desktop.");
        self.ui
            .status(format!("File: {file_name}. Listening for folder..."));
        let folder = self.listen();
        if is_no_speech(&folder) {
            self.say("I didn't catch that. Cancelling.");
            return Handled::failed("no folder");
        }
        let folder = folder.trim().to_owned();
        let Some(home) = self.home_dir.clone() else {
            self.say("Sorry, I couldn't find your home folder.");
            return Handled::failed("no home directory");
        };
        let root = notes::search_root(&home, &folder);
        if !root.is_dir() {
            self.say(&format!("Sorry, I couldn't find a folder named {folder}."));
            return Handled::failed("folder not found");
        }

        self.say(&format!(
            "Okay, searching your {folder} folder for {file_name}. This may take a moment."
        ));
        self.ui.status(format!("Searching for {file_name}..."));
        let Some(found) = notes::find_file(&root, &file_name) else {
            self.say(&format!(
                "Sorry, I searched your {folder} folder but could not find {file_name}."
            ));
            self.ui.status("File not found.");
            return Handled::ok();
        };

        self.say("I found the file!");
        self.ui.status(format!("Found: {}", found.display()));
        self.say("Would you like me to open it?");
        let confirm = self.listen();
        if !notes::is_confirmation(&confirm) {
            self.say("Okay, I will not open it.");
            return Handled::ok();
        }
        match self.caps.os.run_os_action(&OsAction::OpenPath(found)) {
            Ok(_) => {
                self.say("Opening the file.");
                Handled::ok()
            }
            Err(e) => {
                self.say("Sorry, I found the file but I am unable to open it.");
                Handled::failed(e)
            }
        }
    }

    fn mail(&mut self, request: &MailRequest, status: &str) -> Handled {
        self.ui.status(status);
        match self.caps.integrations.mail(request) {
            Ok(text) => {
                self.say(&text);
                Handled::ok()
            }
            Err(e) => {
                warn!(?request, "mail request failed: {e}");
                self.say("Sorry, I couldn't check your email right now.");
                Handled::failed(e)
            }
        }
    }

    fn play_music(&mut self) -> Handled {
        self.say("Starting your music, sir.");
        let Some(path) = self.config.integrations.music_path.clone() else {
            self.say("I couldn't play that music file.");
            return Handled::failed("no music file configured");
        };
        match self.caps.os.run_os_action(&OsAction::OpenPath(path)) {
            Ok(_) => Handled::ok(),
            Err(e) => {
                self.say("I couldn't play that music file.");
                Handled::failed(e)
            }
        }
    }

    fn weather_report(&mut self, city: &str) -> Handled {
        self.say(&format!("Getting the weather for {city}..."));
        match self.caps.integrations.weather(city) {
            Ok(conditions) => self.narrate(&format!("{WEATHER_REPORT_PROMPT}{conditions}")),
            Err(e) => {
                warn!(city, "weather lookup failed: {e}");
                self.say("Sorry, I had trouble connecting to the weather service.");
                Handled::failed(e)
            }
        }
    }

    fn news(&mut self) -> Handled {
        match self.caps.integrations.headlines() {
            Ok(titles) if titles.is_empty() => {
                self.say("I couldn't find any top headlines right now.");
                Handled::failed("no headlines")
            }
            Ok(titles) => {
                let joined: Vec<String> = titles.iter().map(|t| format!("- {t}")).collect();
                let request = format!(
                    "You are an AI assistant. Here are the top news headlines: \
                     'Here are the top headlines:\n{}'. Please read the top 3 headlines \
                     to the user in a natural and engaging way.",
                    joined.join("\n")
                );
                self.narrate(&request)
            }
            Err(e) => {
                warn!("news lookup failed: {e}");
                self.say("I had trouble connecting to the news service. Please check the API key.");
                Handled::failed(e)
            }
        }
    }

    /// One-shot generation spoken with persona styling.
    fn narrate(&mut self, request: &str) -> Handled {
        self.ui.status("Generating...");
        let messages = [
            ChatMessage::system(self.session.system_prompt()),
            ChatMessage::user(format!("User's request: {request}")),
        ];
        match self
            .caps
            .completion
            .complete(&self.config.llm.generate_model, &messages)
        {
            Ok(text) => {
                let styled = personality::style_reply(&text, self.session.persona());
                if styled.is_empty() {
                    self.say(GENERATE_APOLOGY);
                    return Handled::failed("empty generation");
                }
                self.say(&styled);
                Handled::ok()
            }
            Err(e) => {
                warn!("generation failed: {e}");
                self.say(GENERATE_APOLOGY);
                Handled::failed(e)
            }
        }
    }

    fn simple_action(&mut self, action: OsAction, before: &str, failure: &str) -> Handled {
        self.say(before);
        match self.caps.os.run_os_action(&action) {
            Ok(_) => Handled::ok(),
            Err(e) => {
                warn!(?action, "os action failed: {e}");
                self.say(failure);
                Handled::failed(e)
            }
        }
    }

    fn brightness(&mut self, action: OsAction) -> Handled {
        match self.caps.os.run_os_action(&action) {
            Ok(Some(level)) => {
                self.say(&format!("Brightness set to {level} percent"));
                Handled::ok()
            }
            Ok(None) => {
                self.say("Sorry, I am unable to get brightness data.");
                Handled::failed("no brightness level")
            }
            Err(e) => {
                self.say("Sorry, I am unable to control brightness on this device.");
                Handled::failed(e)
            }
        }
    }

    fn confirm_power(
        &mut self,
        action: OsAction,
        question: &str,
        proceeding: &str,
        cancelled: &str,
    ) -> Handled {
        self.say(question);
        let reply = self.listen();
        if !notes::is_confirmation(&reply) {
            self.say(cancelled);
            return Handled::ok();
        }
        self.say(proceeding);
        match self.caps.os.run_os_action(&action) {
            Ok(_) => Handled::ok(),
            Err(e) => {
                warn!(?action, "power action failed: {e}");
                self.say("Sorry, I couldn't do that on this system.");
                Handled::failed(e)
            }
        }
    }

    fn self_improve(&mut self) -> Handled {
        if !self.episodes.exists() {
            self.say(self_improve::MSG_NO_HISTORY);
            return Handled::failed("no episode log");
        }
        let lines = match self.episodes.tail(self.config.self_improve.log_lines) {
            Ok(lines) => lines,
            Err(e) => {
                self.say(self_improve::MSG_READ_FAILED);
                return Handled::failed(e);
            }
        };

        let messages = [ChatMessage::user(self_improve::review_prompt(&lines))];
        let raw = match self
            .caps
            .completion
            .complete(&self.config.llm.improve_model, &messages)
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("self-improvement backend failed: {e}");
                self.say(self_improve::MSG_BACKEND_FAILED);
                return Handled::failed(e);
            }
        };

        let suggestions = match self_improve::parse_suggestions(&raw) {
            Ok(s) => s,
            Err(RecoveryError::Empty) => {
                self.say(self_improve::MSG_EMPTY);
                return Handled::failed("empty response");
            }
            Err(RecoveryError::InvalidJson) => {
                warn!(raw = %raw, "self-improvement response was not JSON");
                self.say(self_improve::MSG_INVALID);
                return Handled::failed("invalid json");
            }
        };

        for t in &suggestions.new_triggers {
            info!(trigger = %t.trigger, handler = %t.handler, reason = %t.reason, "advisory trigger suggestion");
        }
        if self.session.append_evolution(&suggestions.system_prompt_append) {
            info!("system prompt extended by self-improvement");
        }
        let record = self_improve::improvement_record(&suggestions);
        if !record.is_empty()
            && let Err(e) = append_text(&self.paths.improvements_file, &record)
        {
            warn!("failed to write improvements file: {e}");
        }
        self.say(self_improve::MSG_APPLIED);
        Handled::ok()
    }

    // ── chat fallback ────────────────────────────────────────────────

    fn chat(&mut self, utterance: &str) -> Handled {
        self.ui.status("Thinking...");
        let persona = self.session.persona();
        let mut forwarded = utterance.to_owned();

        if self.config.knowledge.enabled
            && let Some(topic) = knowledge::knowledge_topic(utterance, persona.wake_word())
        {
            self.ui.status(format!("Searching Wikipedia for {topic}..."));
            let sentences = self.config.knowledge.sentences.min(MAX_KNOWLEDGE_SENTENCES);
            match self.caps.knowledge.summary(&topic, sentences) {
                Ok(summary) if !summary.is_empty() => {
                    forwarded.push_str(&format!("\n\n[Context: {summary}]"));
                    self.say(&format!("I found this on Wikipedia about {topic}."));
                }
                Ok(_) => {}
                Err(e) => debug!(topic = %topic, "knowledge lookup skipped: {e}"),
            }
        }

        self.session.history_mut().append(Role::User, forwarded);
        let model = self.config.llm.chat_model(persona).to_owned();
        let result = self
            .caps
            .completion
            .complete(&model, self.session.history().messages());

        match result {
            Ok(reply) => {
                let styled = personality::style_reply(&reply, persona);
                self.say(&styled);
                self.session.history_mut().append(Role::Assistant, styled);
                Handled::ok()
            }
            Err(e) => {
                warn!(model = %model, "chat completion failed: {e}");
                self.session.history_mut().discard_pending_user_turn();
                self.say(CHAT_APOLOGY);
                Handled::failed(e)
            }
        }
    }
}

/// Query text for a Gmail search utterance.
fn mail_search_query(utterance: &str) -> String {
    let mut query = utterance.to_owned();
    for phrase in ["search gmail for", "gmail search for", "gmail me search", "gmail me dekh"] {
        query = query.replace(phrase, "");
    }
    query.trim().to_owned()
}

/// City named after "weather in".
fn weather_city(utterance: &str) -> Option<String> {
    let (_, city) = utterance.rsplit_once("weather in")?;
    let city = city.trim().trim_end_matches(['?', '.', '!']).trim();
    (!city.is_empty()).then(|| city.to_owned())
}

fn append_text(path: &std::path::Path, text: &str) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.write_all(text.as_bytes())
}
