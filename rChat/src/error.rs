//! Error types.

use thiserror::Error;

/// The main error type for rChat operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network-related error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The chat backend answered with `status: false` or an error code.
    #[error("Chat API error [{code}]: {message}")]
    Api { code: String, message: String },

    /// Failed to parse response data.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Operation requires a logged-in session but none is present.
    #[error("Authentication required")]
    AuthRequired,

    /// The current user could not be resolved from the session.
    #[error("Current user identity unavailable: {0}")]
    IdentityUnavailable(String),

    /// A required field was missing in the response.
    #[error("Missing field: {0}")]
    MissingField(String),

    /// Invalid argument passed to an API method.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Session store error.
    #[error("Session store error: {0}")]
    SessionStore(String),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Create a chat API error.
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Api {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create a missing field error.
    pub fn missing(field: impl Into<String>) -> Self {
        Error::MissingField(field.into())
    }

    /// Create an invalid argument error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Check if this error is potentially retryable.
    ///
    /// Collaborator failures are recoverable by re-invoking the operation;
    /// input errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Api { code, .. } => code.starts_with('5') || code == "api",
            _ => false,
        }
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        match self {
            Error::AuthRequired | Error::IdentityUnavailable(_) => true,
            Error::Api { code, .. } => code == "401" || code == "403",
            _ => false,
        }
    }
}

/// Result type alias for rChat operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::api("api", "Token inválido");
        assert_eq!(format!("{}", e), "Chat API error [api]: Token inválido");
    }

    #[test]
    fn test_retryable() {
        assert!(Error::api("503", "unavailable").is_retryable());
        assert!(Error::api("api", "status false").is_retryable());
        assert!(!Error::api("404", "not found").is_retryable());
        assert!(!Error::invalid("empty id").is_retryable());
    }

    #[test]
    fn test_auth_error() {
        assert!(Error::AuthRequired.is_auth_error());
        assert!(Error::IdentityUnavailable("no user".into()).is_auth_error());
        assert!(Error::api("401", "expired").is_auth_error());
        assert!(!Error::api("500", "boom").is_auth_error());
    }
}
