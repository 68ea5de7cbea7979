//! Error types for the assistant.

/// Top-level error type for the assistant.
#[derive(Debug, thiserror::Error)]
pub enum ArjunError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Persisted store (commands, facts, notes, episodes) error.
    #[error("store error: {0}")]
    Store(String),

    /// Completion backend error.
    #[error("LLM error: {0}")]
    Llm(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Knowledge lookup error.
    #[error("lookup error: {0}")]
    Lookup(String),

    /// OS-level action error (launch, kill, volume, power, clipboard).
    #[error("OS action error: {0}")]
    Os(String),

    /// Mail / weather / news integration error.
    #[error("integration error: {0}")]
    Integration(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ArjunError>;
