use thiserror::Error;

/// Main error type for Egograph
#[derive(Error, Debug)]
pub enum EgographError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested graph output format is not supported
    #[error("Configuration error: unsupported graph format '{0}'")]
    UnsupportedFormat(String),

    /// Suggestion source gave up (retry budget exhausted or call timed out)
    #[error("Suggestion fetch error: {0}")]
    SourceFetch(String),

    /// Build aborted by the caller's cancellation signal
    #[error("Build cancelled")]
    Cancelled,

    /// Outbound notification failed
    #[error("Notification error: {0}")]
    Notification(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EgographError {
    /// True for the configuration-class errors (bad config values, unsupported format).
    pub fn is_configuration(&self) -> bool {
        matches!(self, EgographError::Config(_) | EgographError::UnsupportedFormat(_))
    }
}

/// Convenient Result type using EgographError
pub type Result<T> = std::result::Result<T, EgographError>;
