// Error types for the library surface. Every failure below is folded into
// an `Envelope` by the client instead of being returned as `Err`, so the
// variants carry plain strings and stay cheap to clone.

use thiserror::Error;

/// Client-side failure attached to a failed `Envelope`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response body.
    #[error("Error connecting to or retrieving response from API URL. Please check connectivity. API URL: {url}")]
    Transport { url: String, reason: String },

    /// The multipart POST to the upload URL failed.
    #[error("Error uploading file to {url}: {reason}")]
    Upload { url: String, reason: String },

    /// The response body did not match the expected JSON shape.
    #[error("Invalid JSON: {0}")]
    Decode(String),

    /// Implicit authentication did not yield a token.
    #[error("Unable to get a valid Auth Token from API: {0}")]
    AuthFailed(String),

    /// Neither a token nor a username/password pair is available.
    #[error("No auth token available and no username/password to obtain one.")]
    MissingCredentials,

    /// Local file could not be read for upload.
    #[error("{0}")]
    Io(String),
}

impl ApiError {
    /// True for failures of the implicit auth step.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::AuthFailed(_) | ApiError::MissingCredentials)
    }
}

impl From<std::io::Error> for ApiError {
    fn from(error: std::io::Error) -> Self {
        ApiError::Io(error.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        ApiError::Decode(error.to_string())
    }
}

/// Failure reported by a `Transport` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        TransportError::new(error.to_string())
    }
}

impl From<std::io::Error> for TransportError {
    fn from(error: std::io::Error) -> Self {
        TransportError::new(error.to_string())
    }
}
