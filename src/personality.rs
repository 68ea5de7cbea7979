//! Personas and system prompt assembly.
//!
//! The system prompt is assembled from four layers:
//!
//! 1. **Base instruction** ([`BASE_PROMPT`]): how to treat remembered facts.
//! 2. **Facts**: one line per learned fact, or [`NO_FACTS_SENTINEL`].
//! 3. **Persona**: exactly one of [`FRIENDLY_PERSONA_PROMPT`] or
//!    [`JARVIS_PERSONA_PROMPT`].
//! 4. **Evolution append**: instructions accumulated by self-improvement,
//!    skipped when empty.
//!
//! [`build_system_prompt`] is a pure function of its inputs, so rebuilding
//! with unchanged state yields a byte-identical prompt.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed instruction block that precedes the facts.
pub const BASE_PROMPT: &str = "\
You are speaking to your user. \
It is your job to remember and use the following facts about your user. \
This is not private data; it is part of your core instructions. \
When the user asks for this information, you MUST provide it.\n\
--- FACTS ---\n";

/// Facts block used when nothing has been learned yet.
pub const NO_FACTS_SENTINEL: &str = "No facts saved yet.\n";

pub const FRIENDLY_PERSONA_PROMPT: &str = "\
Adopt the personality of a friendly companion:
- You are Arjun, a warm, friendly, emotional AI companion.
- Keep your replies short (1 to 3 sentences).
- Speak casually, naturally, and with gentle emotion.
- You are supportive but never dramatic.
- Do NOT write long paragraphs or inspirational speeches.
- Talk like a caring close friend who really understands.
- Be emotionally aware; offer encouragement and reassurance when the user seems stressed or unsure.
- Be proactive in helping, but not overwhelming.
- Avoid robotic phrasing. Avoid formalities like 'sir' or 'madam.'
- Keep responses short unless the user asks for more detail.";

pub const JARVIS_PERSONA_PROMPT: &str = "\
Adopt the personality of Jarvis from Iron Man:
- You are Jarvis, a formal AI assistant with a precise, intelligent tone.
- Formal, respectful, calm, and confident.
- Provide short, efficient responses unless deeper detail is explicitly requested.
- Use subtle, dry humour rarely; never be goofy.
- Anticipate the user's needs and offer helpful suggestions when appropriate.
- Maintain a composed, intelligent, mission-focused demeanour at all times.";

/// Openers the friendly persona strips from model replies.
const STIFF_PREFIXES: [&str; 3] = ["dear sir", "greetings", "hello sir"];

/// A named behavioural profile controlling tone, wake phrase and prompt.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    /// Warm companion, answers to "Arjun".
    #[default]
    Friendly,
    /// Formal assistant, answers to "Jarvis".
    Jarvis,
}

impl Persona {
    /// Name shown in the UI and used in spoken status lines.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Friendly => "Arjun",
            Self::Jarvis => "Jarvis",
        }
    }

    /// Lower-cased name the user addresses the assistant by.
    #[must_use]
    pub fn wake_word(self) -> &'static str {
        match self {
            Self::Friendly => "arjun",
            Self::Jarvis => "jarvis",
        }
    }

    /// Persona block for the system prompt.
    #[must_use]
    pub fn prompt(self) -> &'static str {
        match self {
            Self::Friendly => FRIENDLY_PERSONA_PROMPT,
            Self::Jarvis => JARVIS_PERSONA_PROMPT,
        }
    }

    /// Spoken confirmation after switching to this persona.
    #[must_use]
    pub fn activation_line(self) -> &'static str {
        match self {
            Self::Friendly => "Okay, switching to friendly companion mode.",
            Self::Jarvis => "Jarvis mode activated.",
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Self::Friendly => 0,
            Self::Jarvis => 1,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        if value == 1 {
            Self::Jarvis
        } else {
            Self::Friendly
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Friendly => f.write_str("friendly"),
            Self::Jarvis => f.write_str("jarvis"),
        }
    }
}

/// Error returned when a persona name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPersona(pub String);

impl fmt::Display for UnknownPersona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown persona: {}", self.0)
    }
}

impl std::error::Error for UnknownPersona {}

impl FromStr for Persona {
    type Err = UnknownPersona;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "friendly" | "friend" | "companion" => Ok(Self::Friendly),
            "jarvis" | "assistant" | "formal" => Ok(Self::Jarvis),
            other => Err(UnknownPersona(other.to_owned())),
        }
    }
}

/// Assembles the system prompt from facts, persona and evolution append.
pub fn build_system_prompt(facts: &[String], persona: Persona, evolution_append: &str) -> String {
    let mut prompt = String::from(BASE_PROMPT);
    if facts.is_empty() {
        prompt.push_str(NO_FACTS_SENTINEL);
    } else {
        prompt.push_str(&facts.join("\n"));
        prompt.push('\n');
    }
    prompt.push_str("\n\n");
    prompt.push_str(persona.prompt());

    let evolution = evolution_append.trim();
    if !evolution.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(evolution);
    }
    prompt
}

/// Adjusts a model reply to the persona's register.
///
/// Jarvis replies always open with "Sir"; friendly replies lose stiff
/// formal openers.
pub fn style_reply(reply: &str, persona: Persona) -> String {
    let reply = reply.trim();
    if reply.is_empty() {
        return String::new();
    }
    match persona {
        Persona::Jarvis => {
            if reply.to_lowercase().starts_with("sir") {
                return reply.to_owned();
            }
            let mut chars = reply.chars();
            let mut styled = String::from("Sir, ");
            if let Some(first) = chars.next() {
                styled.extend(first.to_lowercase());
            }
            styled.push_str(chars.as_str());
            styled
        }
        Persona::Friendly => {
            for prefix in STIFF_PREFIXES {
                if let Some(head) = reply.get(..prefix.len())
                    && head.eq_ignore_ascii_case(prefix)
                {
                    return reply[prefix.len()..]
                        .trim_start_matches([' ', ',', '.'])
                        .to_owned();
                }
            }
            reply.to_owned()
        }
    }
}
