use crate::error::ApiError;
use crate::status::NodeReport;

use super::types::MessagesResponse;

/// Results produced by the background loops for the event loop.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// One full status sweep; replaces the previous snapshot.
    StatusSwept(Vec<NodeReport>),
    /// Auto-refresh read of the current session's node.
    MessagesRefreshed {
        port: u16,
        result: Result<MessagesResponse, ApiError>,
    },
}
