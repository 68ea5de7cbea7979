//! Built-in intents and their matching order.
//!
//! [`INTENT_TABLE`] is evaluated top to bottom and the first predicate that
//! accepts the utterance wins. Several phrases overlap (`"play"` appears in
//! both `music_play` and `media_playpause`; `"exit"` and persona words can
//! appear inside chat questions), so the order is part of the behavior.

use crate::personality::Persona;

/// A lower-cased utterance together with the active wake word.
#[derive(Debug, Clone, Copy)]
pub struct Cue<'a> {
    pub text: &'a str,
    pub wake_word: &'a str,
}

impl<'a> Cue<'a> {
    #[must_use]
    pub fn new(text: &'a str, persona: Persona) -> Self {
        Self {
            text,
            wake_word: persona.wake_word(),
        }
    }

    fn has(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }

    fn any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.text.contains(n))
    }
}

/// Phrases that put the assistant to sleep (besides `"stop <wake word>"`).
pub const SLEEP_PHRASES: [&str; 2] = ["go to sleep", "stop listening"];

/// Whether an awake assistant should go to sleep.
#[must_use]
pub fn is_sleep_request(cue: Cue<'_>) -> bool {
    cue.any(&SLEEP_PHRASES) || cue.has(&format!("stop {}", cue.wake_word))
}

/// Whether a sleeping assistant should wake up.
#[must_use]
pub fn is_wake_request(cue: Cue<'_>) -> bool {
    cue.has("wake up") || cue.has(&format!("hey {}", cue.wake_word))
}

/// Built-in handlers, named as they appear in the episode log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinIntent {
    LearnCommand,
    ClipboardRead,
    MemoryRemember,
    NotesAdd,
    NotesRead,
    FileSearch,
    GmailSummary,
    GmailSearch,
    GmailImportant,
    GmailAttachments,
    MusicPlay,
    UserName,
    Time,
    WeatherBuiltin,
    AlarmSet,
    TimerSet,
    News,
    SystemStatus,
    VolumeUp,
    VolumeDown,
    MediaPlayPause,
    MediaNext,
    MediaPrev,
    BrightnessUp,
    BrightnessDown,
    Joke,
    Shutdown,
    Restart,
    Quit,
    PersonaJarvis,
    PersonaFriendly,
    ResetChat,
    SelfImprove,
}

impl BuiltinIntent {
    /// Handler name recorded in episodes.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::LearnCommand => "learn_command",
            Self::ClipboardRead => "clipboard_read",
            Self::MemoryRemember => "memory_remember",
            Self::NotesAdd => "notes_add",
            Self::NotesRead => "notes_read",
            Self::FileSearch => "file_search",
            Self::GmailSummary => "gmail_summary",
            Self::GmailSearch => "gmail_search",
            Self::GmailImportant => "gmail_important",
            Self::GmailAttachments => "gmail_attachments",
            Self::MusicPlay => "music_play",
            Self::UserName => "user_name",
            Self::Time => "time",
            Self::WeatherBuiltin => "weather_builtin",
            Self::AlarmSet => "alarm_set",
            Self::TimerSet => "timer_set",
            Self::News => "news",
            Self::SystemStatus => "system_status",
            Self::VolumeUp => "volume_up",
            Self::VolumeDown => "volume_down",
            Self::MediaPlayPause => "media_playpause",
            Self::MediaNext => "media_next",
            Self::MediaPrev => "media_prev",
            Self::BrightnessUp => "brightness_up",
            Self::BrightnessDown => "brightness_down",
            Self::Joke => "joke",
            Self::Shutdown => "shutdown",
            Self::Restart => "restart",
            Self::Quit => "quit",
            Self::PersonaJarvis => "persona_jarvis",
            Self::PersonaFriendly => "persona_friendly",
            Self::ResetChat => "reset_chat",
            Self::SelfImprove => "self_improve",
        }
    }
}

type Predicate = fn(Cue<'_>) -> bool;

/// Ordered `(intent, predicate)` pairs; first match wins.
pub const INTENT_TABLE: &[(BuiltinIntent, Predicate)] = &[
    (BuiltinIntent::LearnCommand, |c| {
        c.any(&["learn a new command", "new command"])
    }),
    (BuiltinIntent::ClipboardRead, |c| {
        c.any(&["read my clipboard", "what's on my clipboard"])
    }),
    (BuiltinIntent::MemoryRemember, |c| {
        c.has("remember this") || c.has(&format!("{} remember", c.wake_word))
    }),
    (BuiltinIntent::NotesAdd, |c| {
        c.any(&["take a note", "write this down", "make a note"])
    }),
    (BuiltinIntent::NotesRead, |c| {
        c.any(&["read my notes", "show my notes", "what are my notes"])
    }),
    (BuiltinIntent::FileSearch, |c| {
        c.any(&["find file", "search for file", "search file"])
    }),
    (BuiltinIntent::GmailSummary, |c| {
        c.any(&["gmail summary", "summary of my gmail", "gmail ka summary", "inbox summary"])
    }),
    (BuiltinIntent::GmailSearch, |c| {
        c.any(&["search gmail for", "gmail search for", "gmail me search", "gmail me dekh"])
    }),
    (BuiltinIntent::GmailImportant, |c| {
        c.any(&["important emails", "starred emails", "gmail important", "gmail starred"])
    }),
    (BuiltinIntent::GmailAttachments, |c| {
        c.any(&[
            "email attachments",
            "attachments in gmail",
            "koi attachment aya",
            "any new attachments",
        ])
    }),
    (BuiltinIntent::MusicPlay, |c| {
        c.any(&["play", "open", "start"]) && c.any(&["music", "song", "track"])
    }),
    (BuiltinIntent::UserName, |c| {
        (c.has("what is") && c.has("my name")) || c.has("who am i")
    }),
    (BuiltinIntent::Time, |c| {
        c.any(&["what is", "tell me"]) && c.has("the time")
    }),
    (BuiltinIntent::WeatherBuiltin, |c| c.has("weather in")),
    (BuiltinIntent::AlarmSet, |c| {
        c.any(&["wake me up at", "set an alarm for"])
    }),
    (BuiltinIntent::TimerSet, |c| c.has("set a timer for")),
    (BuiltinIntent::News, |c| c.any(&["latest news", "news headlines"])),
    (BuiltinIntent::SystemStatus, |c| {
        c.any(&["system status", "system stats", "cpu usage", "ram usage"])
    }),
    (BuiltinIntent::VolumeUp, |c| {
        c.any(&["increase volume", "increase the volume", "volume up"])
    }),
    (BuiltinIntent::VolumeDown, |c| {
        c.any(&[
            "decrease volume",
            "decrease the volume",
            "volume down",
            "lower volume",
        ])
    }),
    (BuiltinIntent::MediaPlayPause, |c| c.any(&["pause", "play"])),
    (BuiltinIntent::MediaNext, |c| c.any(&["next song", "next track"])),
    (BuiltinIntent::MediaPrev, |c| {
        c.any(&["previous song", "previous track"])
    }),
    (BuiltinIntent::BrightnessUp, |c| {
        c.any(&["increase brightness", "brightness up"])
    }),
    (BuiltinIntent::BrightnessDown, |c| {
        c.any(&["decrease brightness", "brightness down", "lower brightness"])
    }),
    (BuiltinIntent::Joke, |c| {
        c.any(&["tell me a joke", "say a joke", "make me laugh"])
    }),
    (BuiltinIntent::Shutdown, |c| {
        c.any(&["shutdown", "turn off", "power off"])
    }),
    (BuiltinIntent::Restart, |c| c.any(&["restart", "reboot"])),
    (BuiltinIntent::Quit, |c| {
        c.has("exit") || c.has(&format!("{} quit", c.wake_word))
    }),
    (BuiltinIntent::PersonaJarvis, |c| {
        c.has("jarvis")
            && (c.any(&["mode", "style", "switch", "change", "become", "mod"])
                || c.text.trim() == "jarvis")
    }),
    (BuiltinIntent::PersonaFriendly, |c| {
        c.any(&["friendly", "friend mode", "back to normal"]) || (c.has("normal") && c.has("mode"))
    }),
    (BuiltinIntent::ResetChat, |c| c.has("reset chat")),
    (BuiltinIntent::SelfImprove, |c| {
        c.any(&[
            "optimize yourself",
            "improve yourself",
            "update yourself",
            "upgrade yourself",
        ])
    }),
];

/// First built-in intent accepting `cue`.
#[must_use]
pub fn classify(cue: Cue<'_>) -> Option<BuiltinIntent> {
    INTENT_TABLE
        .iter()
        .find(|(_, accepts)| accepts(cue))
        .map(|(intent, _)| *intent)
}

/// Lines for the `joke` intent.
pub const JOKES: [&str; 3] = [
    "Why don't scientists trust atoms? Because they make up everything!",
    "What do you call fake spaghetti? An Impasta!",
    "Why did the scarecrow win an award? Because he was outstanding in his field!",
];
