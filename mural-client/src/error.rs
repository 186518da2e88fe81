use thiserror::Error;

/// Failures of a single request to a node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },
    #[error("could not reach {url}: {reason}")]
    Connection { url: String, reason: String },
    #[error("{url} answered HTTP {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("malformed response from {url}: {reason}")]
    Decode { url: String, reason: String },
    /// A well-formed `"status": "error"` reply.
    #[error("{0}")]
    Rejected(String),
    #[error("HTTP client setup failed: {0}")]
    Setup(String),
}

impl ApiError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout { .. })
    }
}

/// Failures of a client operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("you need to log in first")]
    NotLoggedIn,
    #[error("you have no session on port {0}")]
    NoSession(u16),
    #[error("port {0} is not one of the configured nodes")]
    UnknownNode(u16),
    #[error("message content is empty")]
    EmptyMessage,
    #[error("node answered without a session token")]
    MissingToken,
}
