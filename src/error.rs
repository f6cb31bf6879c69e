use thiserror::Error;

use crate::api::ApiType;

#[derive(Debug, Error)]
pub enum TourError {
    #[error("API key not configured for {0}")]
    NoApiKey(ApiType),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    ApiError {
        code: String,
        message: String,
        hint: Option<String>,
    },

    #[error("API returned an empty response")]
    EmptyResponse,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimit,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("{0}")]
    Other(String),
}

/// Coarse failure categories shared by every upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Timeouts, connection failures, 5xx and 429 responses
    Transport,
    /// Empty bodies, HTML pages, JSON that does not parse
    Malformed,
    /// Business error codes embedded in a successful response
    Upstream,
    /// A name or title that could not be resolved
    Lookup,
    /// Configuration, filesystem and serialization problems on our side
    Local,
}

impl ErrorKind {
    /// Prefix used when the CLI reports an error of this kind
    pub fn label(&self) -> &'static str {
        match self {
            Self::Transport => "Network error",
            Self::Malformed => "Unexpected response",
            Self::Upstream => "API error",
            Self::Lookup => "Lookup failed",
            Self::Local => "Error",
        }
    }
}

impl TourError {
    /// Create an API error with an optional hint
    pub fn api_error(code: impl Into<String>, message: impl Into<String>, hint: Option<String>) -> Self {
        Self::ApiError {
            code: code.into(),
            message: message.into(),
            hint,
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::RateLimit | Self::ServerError(_) => ErrorKind::Transport,
            Self::EmptyResponse | Self::Parse(_) | Self::Serialization(_) => ErrorKind::Malformed,
            Self::ApiError { .. } => ErrorKind::Upstream,
            Self::NotFound(_) | Self::InvalidInput(_) => ErrorKind::Lookup,
            Self::NoApiKey(_) | Self::Config(_) | Self::Io(_) | Self::Csv(_) | Self::Other(_) => {
                ErrorKind::Local
            }
        }
    }

    /// Get user-friendly hint for the error
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NoApiKey(api) => Some(format!(
                "Get a key from {} and run: tourlens config set {} YOUR_KEY",
                api.signup_url(),
                api.config_key()
            )),
            Self::ApiError { hint, .. } => hint.clone(),
            Self::Network(_) => Some("Check your internet connection and try again.".to_string()),
            Self::RateLimit => Some("You've made too many requests. Please wait a moment.".to_string()),
            Self::EmptyResponse => {
                Some("This might indicate an invalid API key or server issue. Try again later.".to_string())
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TourError>;
