use thiserror::Error;

/// Error types for the share-node client
#[derive(Error, Debug)]
pub enum ClientError {
    /// No response from the service (connect failure, timeout, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-success status
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// The target of the operation no longer exists
    #[error("Not found: {0}")]
    NotFound(String),

    /// An upload is already in progress
    #[error("Upload already in progress: {filename}")]
    SessionBusy { filename: String },

    /// Rejected locally before any network call
    #[error("File too large: {size} bytes exceeds maximum {max_size} bytes")]
    FileTooLarge { size: u64, max_size: u64 },

    /// A success response whose body could not be decoded
    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => ClientError::NotFound(message),
            _ => ClientError::Service { status, message },
        }
    }

    /// True when the service was never reached.
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    /// `NotFound` is displayed exactly like any other service failure.
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            ClientError::Service { .. } | ClientError::NotFound(_) | ClientError::Decode(_)
        )
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, ClientError::SessionBusy { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return ClientError::from_status(status.as_u16(), err.to_string());
        }
        if err.is_decode() {
            return ClientError::Decode(err.to_string());
        }
        if err.is_builder() {
            return ClientError::Config(err.to_string());
        }
        ClientError::Network(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::Config(format!("invalid URL: {}", err))
    }
}

/// Convenience Result type with ClientError
pub type Result<T> = std::result::Result<T, ClientError>;
