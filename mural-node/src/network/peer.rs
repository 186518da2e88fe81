use std::net::SocketAddr;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::NodeError;
use crate::protocol::{Message, MessagesReply, NodeStatus, ReplyProbe, ReplyStatus, Request, SyncReply};

/// Replies larger than this are treated as a misbehaving peer.
pub const MAX_REPLY_BYTES: usize = 8 * 1024 * 1024;

/// Talks to other nodes over their TCP request port.
#[derive(Debug, Clone)]
pub struct PeerClient {
    timeout: Duration,
}

impl PeerClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        addr: SocketAddr,
        request: &Request,
    ) -> Result<T, NodeError> {
        let bytes = match timeout(self.timeout, exchange(addr, request)).await {
            Ok(result) => result?,
            Err(_) => return Err(NodeError::Timeout(addr)),
        };
        decode_reply(&bytes)
    }

    pub async fn status(&self, addr: SocketAddr) -> Result<NodeStatus, NodeError> {
        self.call(addr, &Request::CheckStatus).await
    }

    pub async fn sync(&self, addr: SocketAddr, messages: Vec<Message>) -> Result<SyncReply, NodeError> {
        self.call(addr, &Request::Sync { messages }).await
    }

    /// The peer's whole wall, private messages included.
    pub async fn sync_all(&self, addr: SocketAddr) -> Result<Vec<Message>, NodeError> {
        let reply: MessagesReply = self.call(addr, &Request::SyncAll).await?;
        Ok(reply.messages)
    }
}

/// Sends one request and reads the reply until the peer closes the stream.
pub async fn exchange(addr: SocketAddr, request: &Request) -> Result<Vec<u8>, NodeError> {
    let mut stream = TcpStream::connect(addr).await?;
    let payload = serde_json::to_vec(request)?;
    stream.write_all(&payload).await?;
    stream.shutdown().await?;

    let mut reply = Vec::new();
    (&mut stream)
        .take(MAX_REPLY_BYTES as u64 + 1)
        .read_to_end(&mut reply)
        .await?;
    if reply.len() > MAX_REPLY_BYTES {
        return Err(NodeError::TooLarge(reply.len()));
    }
    Ok(reply)
}

/// Decodes a reply body, turning `"status": "error"` into `NodeError::Rejected`.
pub fn decode_reply<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, NodeError> {
    let probe: ReplyProbe = serde_json::from_slice(bytes)?;
    if probe.status == ReplyStatus::Error {
        return Err(NodeError::Rejected(
            probe.message.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_becomes_rejection() {
        let err = decode_reply::<NodeStatus>(br#"{"status":"error","message":"Node unavailable"}"#)
            .unwrap_err();
        assert!(matches!(err, NodeError::Rejected(ref m) if m == "Node unavailable"));
    }

    #[test]
    fn success_envelope_decodes_body() {
        let raw = br#"{"status":"success","node_id":"Node2","port":8002,"active":true,"user":"user1","simulate_offline":false}"#;
        let status: NodeStatus = decode_reply(raw).unwrap();
        assert!(status.is_available());
        assert_eq!(status.user.as_deref(), Some("user1"));
    }

    #[tokio::test]
    async fn unreachable_peer_is_an_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = PeerClient::new(Duration::from_millis(500));
        assert!(client.status(addr).await.is_err());
    }
}
