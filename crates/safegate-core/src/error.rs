//! Error types for SafeGate

/// Result type alias using SafeGate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for SafeGate operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The inference backend answered with a non-success HTTP status
    #[error("backend returned HTTP {status}: {message}")]
    BackendStatus {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// A backend request exceeded its deadline
    #[error("backend request timed out")]
    Timeout,

    /// Connection-level failures (refused, reset, DNS)
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a body we could not decode
    #[error("decode error: {0}")]
    Decode(String),

    /// Streaming body failures
    #[error("stream error: {0}")]
    Stream(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new backend status error
    pub fn backend_status(status: u16, message: impl Into<String>) -> Self {
        Self::BackendStatus {
            status,
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a new decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status reported by the backend, if this is a status error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BackendStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the backend reported a missing model or a failure on its side
    /// (400, 404 or any 5xx). Such failures are worth one pull-and-retry.
    pub fn is_model_or_server_failure(&self) -> bool {
        matches!(self.status(), Some(400 | 404 | 500..=599))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(Error::backend_status(400, "bad request").is_model_or_server_failure());
        assert!(Error::backend_status(404, "model not found").is_model_or_server_failure());
        assert!(Error::backend_status(500, "boom").is_model_or_server_failure());
        assert!(Error::backend_status(503, "busy").is_model_or_server_failure());

        assert!(!Error::backend_status(401, "unauthorized").is_model_or_server_failure());
        assert!(!Error::backend_status(429, "slow down").is_model_or_server_failure());
        assert!(!Error::Timeout.is_model_or_server_failure());
        assert!(!Error::transport("connection refused").is_model_or_server_failure());
    }

    #[test]
    fn test_display() {
        let err = Error::backend_status(404, "model 'phi' not found");
        assert_eq!(err.to_string(), "backend returned HTTP 404: model 'phi' not found");
        assert_eq!(Error::Timeout.to_string(), "backend request timed out");
        assert_eq!(
            Error::config("Failed to build HTTP client").to_string(),
            "configuration error: Failed to build HTTP client"
        );
        assert_eq!(
            Error::stream("connection reset").to_string(),
            "stream error: connection reset"
        );
        assert_eq!(Error::stream("connection reset").status(), None);
    }
}
