//! Arjun: a voice desktop assistant with a conversational command router.
//!
//! One synchronous session loop listens, routes each utterance and speaks the
//! reply:
//! Voice → sleep/wake gate → router → (custom command | built-in intent | chat) → Voice
//!
//! # Architecture
//!
//! - **Router**: [`router::Assistant`] owns all conversation state and
//!   dispatches utterances through custom commands, the ordered built-in
//!   intent table and finally LLM chat.
//! - **Persistence**: facts, custom commands, notes and the episode log live
//!   under one data root ([`app_dirs::StoragePaths`]).
//! - **Capabilities**: completion, OS actions, knowledge lookup, integrations
//!   and reminders sit behind traits so the loop can be driven by doubles.
//! - **UI surface**: [`ui`] carries outbound state messages and the two
//!   inbound controls (sleep toggle, persona request).
//! - **Self-improvement**: [`self_improve`] turns an LLM review of recent
//!   episodes into a validated system-prompt append.

pub mod app_dirs;
pub mod commands;
pub mod config;
pub mod dataset;
pub mod dialog;
pub mod episodes;
pub mod error;
pub mod history;
pub mod integrations;
pub mod intents;
pub mod knowledge;
pub mod llm;
pub mod memory;
pub mod notes;
pub mod personality;
pub mod platform;
pub mod reminders;
pub mod router;
pub mod self_improve;
pub mod session;
pub mod ui;
pub mod voice;

pub use config::ArjunConfig;
pub use error::{ArjunError, Result};
pub use personality::Persona;
pub use router::{Assistant, Capabilities, Flow, GateState, Route};
pub use ui::{AssistantHandle, UiMessage};
