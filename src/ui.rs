//! Surface shared with the UI thread.
//!
//! The session loop owns all conversation state. The UI talks to it through
//! exactly two paths:
//!
//! - **Inbound**: [`AssistantHandle`] sets the [`SleepToggle`] flag and queues
//!   persona requests. The loop consumes both once at the top of every
//!   iteration.
//! - **Outbound**: [`UiSender`] carries fire-and-forget [`UiMessage`]s that the
//!   UI drains with best-effort non-blocking reads.

use crate::personality::Persona;
use crossbeam_channel::{Receiver, Sender};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One outbound message for the UI.
///
/// The wire vocabulary is the sentinel strings `STATE:SLEEPING`,
/// `STATE:AWAKE`, `MODE:FRIENDLY`, `MODE:JARVIS`, `WAKEWORD:<name>` and
/// `QUIT`; anything else is free-form status text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiMessage {
    Status(String),
    Sleeping,
    Awake,
    Mode(Persona),
    WakeWord(String),
    Quit,
}

impl UiMessage {
    /// Parse a wire string; unknown strings become [`UiMessage::Status`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "STATE:SLEEPING" => Self::Sleeping,
            "STATE:AWAKE" => Self::Awake,
            "MODE:FRIENDLY" => Self::Mode(Persona::Friendly),
            "MODE:JARVIS" => Self::Mode(Persona::Jarvis),
            "QUIT" => Self::Quit,
            other => match other.strip_prefix("WAKEWORD:") {
                Some(name) => Self::WakeWord(name.to_owned()),
                None => Self::Status(other.to_owned()),
            },
        }
    }
}

impl fmt::Display for UiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(text) => f.write_str(text),
            Self::Sleeping => f.write_str("STATE:SLEEPING"),
            Self::Awake => f.write_str("STATE:AWAKE"),
            Self::Mode(Persona::Friendly) => f.write_str("MODE:FRIENDLY"),
            Self::Mode(Persona::Jarvis) => f.write_str("MODE:JARVIS"),
            Self::WakeWord(name) => write!(f, "WAKEWORD:{name}"),
            Self::Quit => f.write_str("QUIT"),
        }
    }
}

/// Create the outbound status channel.
#[must_use]
pub fn status_channel() -> (UiSender, UiReceiver) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (UiSender { tx }, UiReceiver { rx })
}

/// Producer half of the status channel. Sends never block or fail loudly.
#[derive(Debug, Clone)]
pub struct UiSender {
    tx: Sender<UiMessage>,
}

impl UiSender {
    /// Queue a message; a disconnected UI is ignored.
    pub fn send(&self, message: UiMessage) {
        let _ = self.tx.try_send(message);
    }

    /// Queue a free-form status line.
    pub fn status(&self, text: impl Into<String>) {
        self.send(UiMessage::Status(text.into()));
    }
}

/// Consumer half of the status channel.
#[derive(Debug)]
pub struct UiReceiver {
    rx: Receiver<UiMessage>,
}

impl UiReceiver {
    /// Wait up to `timeout` for the next message.
    #[must_use]
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<UiMessage> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Everything queued right now.
    #[must_use]
    pub fn drain(&self) -> Vec<UiMessage> {
        self.rx.try_iter().collect()
    }
}

/// Edge-triggered sleep request flag.
///
/// Setting the flag several times before the loop consumes it collapses to a
/// single toggle; it is not a counter.
#[derive(Debug, Default)]
pub struct SleepToggle {
    pending: AtomicBool,
}

impl SleepToggle {
    /// Request a sleep/wake flip.
    pub fn request(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Test-and-clear: `true` at most once per request burst.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}

/// Cloneable handle the UI thread uses to steer the session loop.
#[derive(Debug, Clone)]
pub struct AssistantHandle {
    sleep: Arc<SleepToggle>,
    persona_tx: Sender<Persona>,
}

impl AssistantHandle {
    /// Ask the loop to flip between awake and asleep.
    pub fn toggle_sleep(&self) {
        self.sleep.request();
    }

    /// Ask the loop to switch persona at its next iteration.
    pub fn set_persona(&self, persona: Persona) {
        let _ = self.persona_tx.try_send(persona);
    }
}

/// Loop-side half of [`AssistantHandle`].
#[derive(Debug)]
pub struct ControlInbox {
    sleep: Arc<SleepToggle>,
    persona_rx: Receiver<Persona>,
}

impl ControlInbox {
    /// Consume a pending sleep toggle.
    pub fn take_sleep_toggle(&self) -> bool {
        self.sleep.take()
    }

    /// Latest persona request since the last call, if any.
    pub fn take_persona_request(&self) -> Option<Persona> {
        self.persona_rx.try_iter().last()
    }
}

/// Create a connected handle/inbox pair.
#[must_use]
pub fn control_channel() -> (AssistantHandle, ControlInbox) {
    let sleep = Arc::new(SleepToggle::default());
    let (persona_tx, persona_rx) = crossbeam_channel::unbounded();
    (
        AssistantHandle {
            sleep: Arc::clone(&sleep),
            persona_tx,
        },
        ControlInbox { sleep, persona_rx },
    )
}
