//! Configuration types for the assistant.

use crate::error::{ArjunError, Result};
use crate::personality::Persona;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default cap on chat history entries (system message included).
pub const MAX_HISTORY_LIMIT: usize = 20;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArjunConfig {
    /// Where persisted state lives.
    pub storage: StorageConfig,
    /// Session loop behaviour.
    pub conversation: ConversationConfig,
    /// Completion backend settings.
    pub llm: LlmConfig,
    /// Knowledge lookup used to augment factual questions.
    pub knowledge: KnowledgeConfig,
    /// Weather / news / media integrations.
    pub integrations: IntegrationsConfig,
    /// Custom command normalization.
    pub commands: CommandsConfig,
    /// Self-improvement flow.
    pub self_improve: SelfImproveConfig,
}

/// Storage root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for facts, commands, notes, episodes and logs.
    pub root_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: crate::app_dirs::data_dir(),
        }
    }
}

/// Session loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Maximum chat history entries, system message included.
    pub history_limit: usize,
    /// Seconds `listen()` waits before returning the no-speech sentinel.
    pub listen_timeout_s: u64,
    /// Persona active at startup.
    pub default_persona: Persona,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_limit: MAX_HISTORY_LIMIT,
            listen_timeout_s: 5,
            default_persona: Persona::Friendly,
        }
    }
}

/// Completion backend configuration (any OpenAI-compatible server).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the server (`/v1` suffix optional).
    pub api_url: String,
    /// Bearer token; empty for local servers.
    pub api_key: String,
    /// Chat model used in friendly mode.
    pub friendly_model: String,
    /// Chat model used in jarvis mode.
    pub jarvis_model: String,
    /// Model used for one-shot narration (weather, news).
    pub generate_model: String,
    /// Model used by the self-improvement review.
    pub improve_model: String,
    /// Request timeout in seconds.
    pub timeout_s: u64,
    /// Sampling temperature.
    pub temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:11434".to_owned(),
            api_key: String::new(),
            friendly_model: "arjun-custom".to_owned(),
            jarvis_model: "gemma:2b".to_owned(),
            generate_model: "gemma:2b".to_owned(),
            improve_model: "llama3:8b".to_owned(),
            timeout_s: 120,
            temperature: 0.7,
        }
    }
}

impl LlmConfig {
    /// Chat model for the given persona.
    #[must_use]
    pub fn chat_model(&self, persona: Persona) -> &str {
        match persona {
            Persona::Friendly => &self.friendly_model,
            Persona::Jarvis => &self.jarvis_model,
        }
    }
}

/// Knowledge lookup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Whether factual questions are augmented with lookup context.
    pub enabled: bool,
    /// Wikipedia REST base URL.
    pub api_url: String,
    /// Maximum sentences of context appended to the question.
    pub sentences: usize,
    /// Request timeout in seconds.
    pub timeout_s: u64,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "https://en.wikipedia.org".to_owned(),
            sentences: 2,
            timeout_s: 10,
        }
    }
}

/// Integration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    /// wttr.in-compatible weather endpoint.
    pub weather_url: String,
    /// NewsAPI key; news is unavailable when empty.
    pub news_api_key: String,
    /// NewsAPI country code for top headlines.
    pub news_country: String,
    /// Track played by the music intent.
    pub music_path: Option<PathBuf>,
    /// Request timeout in seconds.
    pub timeout_s: u64,
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            weather_url: "https://wttr.in".to_owned(),
            news_api_key: String::new(),
            news_country: "in".to_owned(),
            music_path: None,
            timeout_s: 10,
        }
    }
}

/// Custom command configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Executable suffix appended to taught process names lacking it.
    ///
    /// Empty disables the normalization.
    pub process_suffix: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            process_suffix: ".exe".to_owned(),
        }
    }
}

/// Self-improvement configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfImproveConfig {
    /// Number of trailing episode-log lines reviewed.
    pub log_lines: usize,
}

impl Default for SelfImproveConfig {
    fn default() -> Self {
        Self { log_lines: 50 }
    }
}

impl ArjunConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ArjunError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ArjunError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load `path` if it exists, otherwise return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error only when the file exists but cannot be parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}
