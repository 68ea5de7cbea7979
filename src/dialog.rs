//! "Learn a new command" slot-filling dialog.
//!
//! ```text
//! AwaitTrigger --(utterance)--> AwaitActionType
//! AwaitActionType --"website"--> AwaitTarget(website) --> Completed
//! AwaitActionType --"application"--> AwaitTarget(app) --"done"--> AwaitProcessName --> Completed
//! AwaitActionType --other--> Cancelled
//! any state --"cancel" / no speech--> Cancelled
//! ```
//!
//! Every transition is one prompt followed by one listen. Nothing touches
//! the command store until the dialog reaches `Completed`, so a cancelled
//! attempt leaves no trace and the next attempt starts from scratch.

use crate::commands::{self, Command, CommandKind, CommandStore};
use crate::platform::{OsAction, OsActions};
use crate::ui::UiSender;
use crate::voice::{Speaker, is_no_speech};
use tracing::{info, warn};

/// Unrelated replies tolerated while waiting for "done".
pub const MAX_CLIPBOARD_WAITS: u8 = 3;

/// Why a dialog ended without a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    NoSpeech,
    UserCancelled,
    UnknownActionType,
    EmptyClipboard,
    ClipboardUnavailable,
    NotReady,
}

impl CancelReason {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::NoSpeech => "I didn't catch that. Cancelling.",
            Self::UserCancelled => "Cancelling.",
            Self::UnknownActionType => "I didn't recognize that action type. Cancelling.",
            Self::EmptyClipboard => "Your clipboard is empty. Cancelling.",
            Self::ClipboardUnavailable => "I had trouble reading your clipboard. Cancelling.",
            Self::NotReady => "I didn't hear you say 'done'. Cancelling.",
        }
    }
}

/// Dialog position, carrying the partially built command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogState {
    AwaitTrigger,
    AwaitActionType { trigger: String },
    AwaitTarget { trigger: String, kind: CommandKind },
    AwaitProcessName { trigger: String, target: String },
    Cancelled(CancelReason),
    Completed(Command),
}

/// One teach-a-command attempt.
#[derive(Debug, Clone)]
pub struct TeachDialog {
    state: DialogState,
    process_suffix: String,
    clipboard_waits: u8,
}

impl TeachDialog {
    #[must_use]
    pub fn new(process_suffix: impl Into<String>) -> Self {
        Self {
            state: DialogState::AwaitTrigger,
            process_suffix: process_suffix.into(),
            clipboard_waits: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> &DialogState {
        &self.state
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            DialogState::Cancelled(_) | DialogState::Completed(_)
        )
    }

    /// Question for the current state; `None` once finished.
    #[must_use]
    pub fn prompt(&self) -> Option<String> {
        let text = match &self.state {
            DialogState::AwaitTrigger => {
                "Okay, I'm ready to learn. What is the trigger phrase?".to_owned()
            }
            DialogState::AwaitActionType { trigger } => format!(
                "Got it. When you say '{trigger}', what kind of action should I perform? \
                 Say 'open website' or 'run application'."
            ),
            DialogState::AwaitTarget {
                kind: CommandKind::App,
                ..
            } if self.clipboard_waits > 0 => {
                "Say 'done' once the path is on your clipboard, or 'cancel' to stop.".to_owned()
            }
            DialogState::AwaitTarget {
                kind: CommandKind::App,
                ..
            } => "Please copy the full file path of the application to your clipboard now. \
                  Say 'done' when you are ready."
                .to_owned(),
            DialogState::AwaitTarget { .. } => {
                "What is the full URL? For example, netflix.com".to_owned()
            }
            DialogState::AwaitProcessName { .. } => {
                let example = format!("notepad{}", self.process_suffix);
                format!(
                    "Thank you. Now, what is the process name for this app? For example, '{example}'."
                )
            }
            DialogState::Cancelled(_) | DialogState::Completed(_) => return None,
        };
        Some(text)
    }

    /// UI status line shown while listening in the current state.
    #[must_use]
    pub fn status(&self) -> Option<String> {
        let text = match &self.state {
            DialogState::AwaitTrigger => "Listening for trigger...".to_owned(),
            DialogState::AwaitActionType { trigger } => {
                format!("Trigger: '{trigger}'. Listening for action type...")
            }
            DialogState::AwaitTarget {
                kind: CommandKind::App,
                ..
            } => "Waiting for clipboard...".to_owned(),
            DialogState::AwaitTarget { .. } => "Listening for URL...".to_owned(),
            DialogState::AwaitProcessName { target, .. } => {
                format!("Launch path: {target}. Listening for process name...")
            }
            DialogState::Cancelled(_) | DialogState::Completed(_) => return None,
        };
        Some(text)
    }

    /// Feed one heard utterance.
    ///
    /// `read_clipboard` is only called when the user confirms the app path
    /// is on the clipboard.
    pub fn advance<F>(&mut self, heard: &str, read_clipboard: F)
    where
        F: FnOnce() -> crate::Result<String>,
    {
        let heard = heard.trim();
        if is_no_speech(heard) {
            self.state = DialogState::Cancelled(CancelReason::NoSpeech);
            return;
        }
        if heard.split_whitespace().any(|w| w == "cancel") {
            self.state = DialogState::Cancelled(CancelReason::UserCancelled);
            return;
        }

        let state = std::mem::replace(&mut self.state, DialogState::AwaitTrigger);
        self.state = match state {
            DialogState::AwaitTrigger => DialogState::AwaitActionType {
                trigger: heard.to_owned(),
            },
            DialogState::AwaitActionType { trigger } => {
                if heard.contains("website") {
                    DialogState::AwaitTarget {
                        trigger,
                        kind: CommandKind::Website,
                    }
                } else if heard.contains("application")
                    || heard.split_whitespace().any(|w| w == "app")
                {
                    DialogState::AwaitTarget {
                        trigger,
                        kind: CommandKind::App,
                    }
                } else {
                    DialogState::Cancelled(CancelReason::UnknownActionType)
                }
            }
            DialogState::AwaitTarget { trigger, kind } if kind == CommandKind::App => {
                self.await_clipboard(trigger, heard, read_clipboard)
            }
            DialogState::AwaitTarget { trigger, kind } => DialogState::Completed(Command {
                trigger,
                kind,
                target: commands::normalize_website_target(heard),
                process_name: None,
            }),
            DialogState::AwaitProcessName { trigger, target } => {
                DialogState::Completed(Command {
                    trigger,
                    kind: CommandKind::App,
                    target,
                    process_name: Some(commands::normalize_process_name(
                        heard,
                        &self.process_suffix,
                    )),
                })
            }
            finished @ (DialogState::Cancelled(_) | DialogState::Completed(_)) => finished,
        };
    }

    fn await_clipboard<F>(&mut self, trigger: String, heard: &str, read_clipboard: F) -> DialogState
    where
        F: FnOnce() -> crate::Result<String>,
    {
        if !(heard.contains("done") || heard.contains("ready")) {
            self.clipboard_waits += 1;
            if self.clipboard_waits > MAX_CLIPBOARD_WAITS {
                return DialogState::Cancelled(CancelReason::NotReady);
            }
            return DialogState::AwaitTarget {
                trigger,
                kind: CommandKind::App,
            };
        }
        match read_clipboard() {
            Ok(text) if text.trim().is_empty() => {
                DialogState::Cancelled(CancelReason::EmptyClipboard)
            }
            Ok(text) => DialogState::AwaitProcessName {
                trigger,
                target: text.trim().to_owned(),
            },
            Err(e) => {
                warn!("clipboard read failed: {e}");
                DialogState::Cancelled(CancelReason::ClipboardUnavailable)
            }
        }
    }
}

/// How a dialog run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    Saved(Command),
    Cancelled(CancelReason),
}

/// Drive a fresh dialog to completion over the speaker's voice.
///
/// On completion the command is appended to `store` and persisted.
pub fn run_teach_dialog(
    speaker: &Speaker,
    ui: &UiSender,
    os: &dyn OsActions,
    store: &mut CommandStore,
    process_suffix: &str,
) -> DialogOutcome {
    let mut dialog = TeachDialog::new(process_suffix);
    while !dialog.is_finished() {
        if let Some(prompt) = dialog.prompt() {
            speaker.say(&prompt);
        }
        if let Some(status) = dialog.status() {
            ui.status(status);
        }
        let heard = speaker.voice().listen();
        dialog.advance(&heard, || {
            os.run_os_action(&OsAction::ReadClipboard)
                .map(Option::unwrap_or_default)
        });
    }

    match dialog.state {
        DialogState::Completed(command) => {
            let trigger = command.trigger.clone();
            match store.append(command.clone()) {
                Ok(()) => speaker.say(&format!(
                    "Command saved. When you say '{trigger}', I will perform the action."
                )),
                Err(e) => {
                    warn!("failed to persist taught command: {e}");
                    speaker.say("I learned that command, but I couldn't save it to disk.");
                }
            }
            info!(trigger = %trigger, "custom command learned");
            DialogOutcome::Saved(command)
        }
        DialogState::Cancelled(reason) => {
            speaker.say(reason.message());
            info!(?reason, "teach dialog cancelled");
            DialogOutcome::Cancelled(reason)
        }
        _ => DialogOutcome::Cancelled(CancelReason::UserCancelled),
    }
}
