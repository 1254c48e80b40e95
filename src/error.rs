//! Error types for Orchestra Search.

use uuid::Uuid;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl Error {
    /// Text shown to the user when a turn fails.
    ///
    /// Model and parse failures leave the session untouched, so the wording
    /// invites another attempt.
    pub fn user_message(&self) -> String {
        match self {
            Self::Llm(_) => {
                "Sorry, I couldn't reach the assistant. Your information is safe, please submit again."
                    .to_string()
            }
            Self::Parse(_) => {
                "Sorry, I couldn't understand the assistant's reply. Please submit your message again."
                    .to_string()
            }
            Self::Session(SessionError::AlreadyComplete) => {
                "Your job search preferences are already complete.".to_string()
            }
            Self::Session(SessionError::NotFound(_)) => {
                "This session has ended. Start a new one to continue.".to_string()
            }
            Self::Config(e) => format!("Configuration problem: {e}"),
            Self::Schema(e) => format!("Schema problem: {e}"),
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Structured-output decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no structured block found in model output")]
    NoStructuredBlock,

    #[error("structured block is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("field {0} is missing from model output")]
    MissingField(String),

    #[error("field {field} should be a {expected}")]
    WrongType { field: String, expected: String },
}

/// Invalid schema definitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("field {0} is declared more than once")]
    DuplicateField(String),

    #[error("schema must declare exactly one response field, found {0}")]
    ResponseFieldCount(usize),

    #[error("response field {0} must be a string field")]
    ResponseNotText(String),
}

/// Session lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Session {0} not found")]
    NotFound(Uuid),

    #[error("Preference collection is already complete")]
    AlreadyComplete,
}
