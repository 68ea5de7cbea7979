//! Speech capture and synthesis seam.
//!
//! [`Voice`] is the black-box audio capability: `listen` blocks until a
//! transcript is available or the capture times out, `say` speaks. The crate
//! ships [`ConsoleVoice`], which reads typed lines instead of audio.

use crate::personality::Persona;
use crate::ui::UiSender;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

/// Transcript returned when nothing was captured.
pub const NO_SPEECH: &str = "none";

/// Speech capture and synthesis.
///
/// Implementations must never panic or propagate errors: capture failures
/// map to [`NO_SPEECH`] and synthesis failures are swallowed.
pub trait Voice: Send + Sync {
    /// Block until a lower-cased transcript is available, or [`NO_SPEECH`].
    fn listen(&self) -> String;

    /// Speak `text`.
    fn say(&self, text: &str);

    /// Select the synthesis voice for a persona.
    fn set_profile(&self, _persona: Persona) {}
}

/// Whether a transcript is the no-speech sentinel.
#[must_use]
pub fn is_no_speech(transcript: &str) -> bool {
    let t = transcript.trim();
    t.is_empty() || t == NO_SPEECH
}

/// Speaks through a [`Voice`] and mirrors every line to the UI as
/// `"<DisplayName>: <text>"`.
///
/// Cheap to clone; timers hold their own copy and speak independently of the
/// session loop.
#[derive(Clone)]
pub struct Speaker {
    voice: Arc<dyn Voice>,
    ui: UiSender,
    persona: Arc<AtomicU8>,
}

impl Speaker {
    pub fn new(voice: Arc<dyn Voice>, ui: UiSender, persona: Persona) -> Self {
        voice.set_profile(persona);
        Self {
            voice,
            ui,
            persona: Arc::new(AtomicU8::new(persona.as_u8())),
        }
    }

    pub fn say(&self, text: &str) {
        let name = self.persona().display_name();
        self.ui.status(format!("{name}: {text}"));
        self.voice.say(text);
    }

    /// Switch display name and synthesis profile.
    pub fn set_persona(&self, persona: Persona) {
        self.persona.store(persona.as_u8(), Ordering::Relaxed);
        self.voice.set_profile(persona);
    }

    #[must_use]
    pub fn persona(&self) -> Persona {
        Persona::from_u8(self.persona.load(Ordering::Relaxed))
    }

    #[must_use]
    pub fn voice(&self) -> &Arc<dyn Voice> {
        &self.voice
    }
}

/// Text-mode voice: utterances arrive as lines on a channel, speech is
/// printed to stdout.
pub struct ConsoleVoice {
    lines: Receiver<String>,
    timeout: Duration,
}

impl ConsoleVoice {
    #[must_use]
    pub fn new(lines: Receiver<String>, timeout: Duration) -> Self {
        Self { lines, timeout }
    }
}

impl Voice for ConsoleVoice {
    fn listen(&self) -> String {
        match self.lines.recv_timeout(self.timeout) {
            Ok(line) => {
                let line = line.trim().to_lowercase();
                if line.is_empty() {
                    NO_SPEECH.to_owned()
                } else {
                    line
                }
            }
            Err(RecvTimeoutError::Timeout) => NO_SPEECH.to_owned(),
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(self.timeout);
                NO_SPEECH.to_owned()
            }
        }
    }

    fn say(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "> {text}");
        let _ = out.flush();
    }
}
