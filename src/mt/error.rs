/// Error types for the Machine Translation module
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MtError {
    /// Provider misconfiguration (missing key, rejected credentials)
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Transport-level failure talking to the provider
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Locale code rejected before a request was made
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),
    /// Provider answered, but not with a usable translation
    #[error("Translation error: {0}")]
    TranslationError(String),
    /// General error with context
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for MtError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MtError::NetworkError(format!("request timed out: {}", err))
        } else if err.is_decode() {
            MtError::TranslationError(format!("malformed response: {}", err))
        } else {
            MtError::NetworkError(err.to_string())
        }
    }
}

/// Result type for MT operations
pub type MtResult<T> = Result<T, MtError>;
