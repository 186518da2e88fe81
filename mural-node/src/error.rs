use std::net::SocketAddr;

use thiserror::Error;

/// Failures of the node runtime and of calls to peer nodes.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("peer {0} did not answer in time")]
    Timeout(SocketAddr),
    #[error("peer refused the request: {0}")]
    Rejected(String),
    #[error("request `{action}` has invalid fields: {reason}")]
    InvalidFields { action: String, reason: String },
    #[error("no complete request within {0:?}")]
    ReadTimeout(std::time::Duration),
    #[error("request of {0} bytes exceeds the limit")]
    TooLarge(usize),
    #[error("invalid account configuration: {0}")]
    Account(#[from] AuthError),
}

/// Failures when registering accounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("username `{0}` is not allowed")]
    InvalidUsername(String),
    #[error("user `{0}` already exists")]
    AlreadyExists(String),
}
