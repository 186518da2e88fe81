use std::time::Duration;

use reqwest::RequestBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::common::types::{
    AckResponse, LoginResponse, MessageType, MessagesResponse, NodeEndpoint, NodeStatus,
    PostResponse, ToggleResponse,
};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// JSON-over-HTTP access to the nodes' `/api/*` endpoints. Every request is
/// bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct NodeApi {
    http: reqwest::Client,
    timeout: Duration,
}

impl NodeApi {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::Setup(err.to_string()))?;
        Ok(Self { http, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn login(
        &self,
        node: &NodeEndpoint,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, ApiError> {
        let url = node.url("/api/login");
        let request = self
            .http
            .post(&url)
            .json(&json!({ "username": username, "password": password }));
        self.send(url, request).await
    }

    pub async fn logout(&self, node: &NodeEndpoint, token: &str) -> Result<AckResponse, ApiError> {
        let url = node.url("/api/logout");
        let request = self.http.post(&url).json(&json!({ "token": token }));
        self.send(url, request).await
    }

    pub async fn post(
        &self,
        node: &NodeEndpoint,
        token: &str,
        content: &str,
        message_type: MessageType,
    ) -> Result<PostResponse, ApiError> {
        let url = node.url("/api/post");
        let request = self.http.post(&url).json(&json!({
            "token": token,
            "content": content,
            "message_type": message_type.as_str(),
        }));
        self.send(url, request).await
    }

    /// Reads a node's wall; private messages are only returned with a valid
    /// token.
    pub async fn messages(
        &self,
        node: &NodeEndpoint,
        token: Option<&str>,
    ) -> Result<MessagesResponse, ApiError> {
        let url = node.url("/api/messages");
        let mut request = self.http.get(&url);
        if let Some(token) = token {
            request = request.header(reqwest::header::AUTHORIZATION, token);
        }
        self.send(url, request).await
    }

    pub async fn status(&self, node: &NodeEndpoint) -> Result<NodeStatus, ApiError> {
        let url = node.url("/api/status");
        let request = self.http.get(&url);
        self.send(url, request).await
    }

    pub async fn toggle_offline(
        &self,
        node: &NodeEndpoint,
        token: &str,
    ) -> Result<ToggleResponse, ApiError> {
        let url = node.url("/api/toggle_offline");
        let request = self.http.post(&url).json(&json!({ "token": token }));
        self.send(url, request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        url: String,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        log::debug!("Request {url}");
        let response = request
            .send()
            .await
            .map_err(|err| self.classify(&url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| self.classify(&url, err))?;
        decode_envelope(&url, &body)
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout {
                url: url.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else if err.is_decode() {
            ApiError::Decode {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else {
            ApiError::Connection {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

/// Decodes a reply, turning `"status": "error"` into `ApiError::Rejected`.
pub fn decode_envelope<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<T, ApiError> {
    let decode_error = |err: serde_json::Error| ApiError::Decode {
        url: url.to_string(),
        reason: err.to_string(),
    };

    let envelope: Envelope = serde_json::from_slice(body).map_err(decode_error)?;
    if envelope.status.as_deref() == Some("error") {
        return Err(ApiError::Rejected(
            envelope
                .message
                .unwrap_or_else(|| "Unknown error".to_string()),
        ));
    }
    serde_json::from_slice(body).map_err(decode_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn error_envelope_is_rejected_with_server_message() {
        let err = decode_envelope::<LoginResponse>(
            "u",
            br#"{"status":"error","message":"Invalid credentials"}"#,
        )
        .unwrap_err();
        assert_eq!(err, ApiError::Rejected("Invalid credentials".into()));
    }

    #[test]
    fn non_json_body_is_a_decode_error() {
        let err = decode_envelope::<NodeStatus>("u", b"<html>").unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[test]
    fn status_without_envelope_field_still_decodes() {
        let status: NodeStatus = decode_envelope(
            "u",
            br#"{"active":true,"simulate_offline":false,"user":"admin","node_id":"Node1"}"#,
        )
        .unwrap();
        assert!(status.active);
        assert_eq!(status.user.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn silent_node_times_out_distinctly() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        // Accepts and reads but never answers.
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut sink = Vec::new();
                    let _ = socket.read_to_end(&mut sink).await;
                });
            }
        });

        let api = NodeApi::new(Duration::from_millis(300)).unwrap();
        let node = NodeEndpoint::with_http_port("127.0.0.1", 1, port);
        let err = api.status(&node).await.unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {err:?}");
    }

    #[tokio::test]
    async fn closed_port_is_a_connection_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let api = NodeApi::new(Duration::from_secs(2)).unwrap();
        let node = NodeEndpoint::with_http_port("127.0.0.1", 1, port);
        let err = api.status(&node).await.unwrap_err();
        assert!(matches!(err, ApiError::Connection { .. }), "got {err:?}");
        assert!(!err.is_timeout());
    }
}
