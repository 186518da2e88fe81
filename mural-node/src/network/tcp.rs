use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use serde_json::error::Category;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time;

use crate::error::NodeError;
use crate::node::Node;
use crate::protocol::{Reply, Request};

/// Requests larger than this are refused.
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;
/// A connection must deliver its whole request within this window.
pub const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Accepts request connections until `shutdown` flips.
pub async fn serve_tcp(listener: TcpListener, node: Arc<Node>, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, remote)) => {
                        let node = Arc::clone(&node);
                        tokio::spawn(async move {
                            if let Err(err) = handle_connection(stream, node).await {
                                log::debug!("Connection from {remote} failed: {err}");
                            }
                        });
                    }
                    Err(err) => log::warn!("[{}] Accept failed: {err}", node.id()),
                }
            }
            _ = shutdown.changed() => break,
        }
    }
    log::info!("[{}] TCP listener stopped", node.id());
}

async fn handle_connection(mut stream: TcpStream, node: Arc<Node>) -> Result<(), NodeError> {
    let reply = match read_request_within(&mut stream, REQUEST_READ_TIMEOUT).await {
        Ok(request) => node.handle(request).await,
        Err(NodeError::ReadTimeout(window)) => {
            log::debug!("[{}] Dropping connection idle for {window:?}", node.id());
            return Ok(());
        }
        Err(NodeError::InvalidFields { action, reason }) => {
            log::debug!("[{}] Bad `{action}` request: {reason}", node.id());
            Reply::error("Invalid request fields")
        }
        Err(NodeError::Json(err)) => {
            log::debug!("[{}] Unreadable request: {err}", node.id());
            Reply::error("Invalid action")
        }
        Err(NodeError::TooLarge(size)) => {
            log::warn!("[{}] Refused request of {size} bytes", node.id());
            Reply::error("Request too large")
        }
        Err(err) => return Err(err),
    };

    stream.write_all(&serde_json::to_vec(&reply)?).await?;
    stream.shutdown().await?;
    Ok(())
}

/// [`read_request`] bounded by `window`.
pub async fn read_request_within<R: AsyncRead + Unpin>(
    reader: &mut R,
    window: Duration,
) -> Result<Request, NodeError> {
    time::timeout(window, read_request(reader))
        .await
        .map_err(|_| NodeError::ReadTimeout(window))?
}

/// Reads until a complete JSON request has arrived or the peer half-closes.
/// Callers that keep their write side open are served as soon as the request
/// parses.
pub async fn read_request<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Request, NodeError> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let read = reader.read(&mut chunk).await?;
        if read == 0 {
            return decode(&buffer);
        }
        buffer.extend_from_slice(&chunk[..read]);
        if buffer.len() > MAX_REQUEST_BYTES {
            return Err(NodeError::TooLarge(buffer.len()));
        }

        match decode(&buffer) {
            Ok(request) => return Ok(request),
            Err(NodeError::Json(err)) if err.classify() == Category::Eof => continue,
            Err(err) => return Err(err),
        }
    }
}

/// Parses a request. A known `action` with a bad field is told apart from an
/// unknown or missing action.
fn decode(buffer: &[u8]) -> Result<Request, NodeError> {
    serde_json::from_slice(buffer).map_err(|err| {
        if err.classify() != Category::Data {
            return err.into();
        }
        let action = serde_json::from_slice::<Value>(buffer)
            .ok()
            .and_then(|value| value.get("action")?.as_str().map(str::to_string))
            .filter(|action| Request::ACTIONS.contains(&action.as_str()));
        match action {
            Some(action) => NodeError::InvalidFields {
                action,
                reason: err.to_string(),
            },
            None => err.into(),
        }
    })
}
