//! Unified error type for imagen-studio.

use thiserror::Error;

/// Errors that can occur while configuring or calling the image service.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// The service response could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// No API key configured.
    #[error("{env_var} is not defined in the environment variables. Please configure it.")]
    MissingApiKey {
        /// The environment variable name.
        env_var: String,
    },

    /// A failure served from a replay cassette.
    #[error("{0}")]
    Replayed(String),

    /// A failure that carries no detail.
    #[error("Unknown error")]
    Unknown,
}

impl ImageError {
    /// Human-readable failure detail, suitable for showing to the user.
    ///
    /// Returns `None` when the error carries nothing worth showing.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        let detail = match self {
            Self::Api { message, .. } => message.clone(),
            Self::Network(e) => e.to_string(),
            Self::Io(e) => e.to_string(),
            Self::Config(msg) | Self::Decode(msg) | Self::Replayed(msg) => msg.clone(),
            Self::MissingApiKey { .. } => self.to_string(),
            Self::Unknown => return None,
        };
        let trimmed = detail.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}
