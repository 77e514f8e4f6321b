use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {0}")]
    Load(String),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Failure to produce a complete content bundle for one language.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Content source misconfigured: {0}")]
    Config(String),
    #[error("Failed to read content file '{path}': {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to fetch content from '{url}': {source}")]
    HttpFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Content request to '{url}' returned status {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("Failed to parse content: {0}")]
    Parse(String),
}

/// Operations that are not valid in the current round phase.
/// These are reported and ignored, never treated as faults.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidOperation {
    #[error("No content is loaded")]
    ContentNotLoaded,
    #[error("No category is selected")]
    NoCategorySelected,
    #[error("No question is awaiting a reveal")]
    NothingToReveal,
    #[error("Wildcard mode is not active")]
    NotInWildcardMode,
    #[error("Pool is exhausted; change mode, category, difficulty or language")]
    DrawingDisabled,
    #[error("No category has questions at difficulty '{0}'")]
    NoEligibleCategory(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session actor is not running")]
    ActorUnavailable,
    #[error("Session actor dropped the response")]
    ResponseDropped,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
