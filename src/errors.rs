// Error taxonomy and user-friendly error messages
//
// Typed errors let callers (HTTP layer, CLI) tell validation problems apart
// from generation failures. The helpers at the bottom turn startup failures
// into actionable messages.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Fatal startup errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required credential {0} is not set")]
    MissingCredential(&'static str),

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Caller input rejected before any collaborator is called
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("emotional_level must be between 1 and 5, got {0}")]
    EmotionalLevelOutOfRange(i64),

    #[error("user_id must not be empty")]
    EmptyUserId,
}

/// Failure of the language-model collaborator
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation timed out after {}s", .after.as_secs_f32())]
    Timeout { after: Duration },

    #[error("generation failed: {0:#}")]
    Provider(#[source] anyhow::Error),
}

impl GenerationError {
    /// Short label used for metrics and logs
    pub fn reason(&self) -> &'static str {
        match self {
            GenerationError::Timeout { .. } => "timeout",
            GenerationError::Provider(_) => "provider",
        }
    }
}

/// Turn-level errors surfaced by the chat service
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The turn was aborted and the session left untouched.
    /// `messages` still carries the crisis banner if one fired for this turn.
    #[error("{source}")]
    Generation {
        #[source]
        source: GenerationError,
        messages: Vec<String>,
    },

    #[error("no conversation history for user '{0}'")]
    HistoryNotFound(String),

    #[error("failed to save conversation history: {0:#}")]
    Storage(#[source] anyhow::Error),
}

/// Format a missing API key error with helpful suggestions
pub fn api_key_missing_error() -> String {
    "GOOGLE_API_KEY is not configured; MISOUL cannot start without it\n\n\
    Try:\n\
    1. Export it for this shell:\n\
       export GOOGLE_API_KEY=\"AI...\"\n\n\
    2. Or add it to ~/.misoul/config.toml:\n\
       google_api_key = \"AI...\"\n\n\
    3. Get a key at https://aistudio.google.com/app/apikey"
        .to_string()
}

/// Format a config parse error with helpful suggestions
pub fn config_parse_error(error: &str) -> String {
    format!(
        "Failed to parse config file\n\n\
        Error: {}\n\n\
        Try:\n\
        1. Check config file syntax:\n\
           cat ~/.misoul/config.toml\n\n\
        2. Common mistakes:\n\
           • Missing quotes around strings\n\
           • Unclosed brackets []\n\
           • Section names other than [generation] and [server]",
        error
    )
}
