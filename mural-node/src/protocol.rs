//! Wire types shared by the TCP request server, the peer client and the
//! HTTP surface.
//!
//! Every reply carries `status: "success" | "error"`; application errors are
//! never expressed with transport-level status codes.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Visibility class of a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Public,
    Private,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Public => "public",
            MessageType::Private => "private",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "public" => Some(MessageType::Public),
            "private" => Some(MessageType::Private),
            _ => None,
        }
    }
}

/// One entry on a node's wall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub author: String,
    pub content: String,
    /// Seconds since the Unix epoch, with microsecond precision.
    pub timestamp: f64,
    #[serde(default)]
    pub message_type: MessageType,
}

impl Message {
    pub fn new(author: &str, content: &str, message_type: MessageType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            author: author.to_string(),
            content: content.to_string(),
            timestamp: Utc::now().timestamp_micros() as f64 / 1_000_000.0,
            message_type,
        }
    }

    pub fn is_public(&self) -> bool {
        self.message_type == MessageType::Public
    }
}

/// A request to a node, tagged by `action`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    Login {
        #[serde(default)]
        username: String,
        #[serde(default)]
        password: String,
    },
    Logout {
        #[serde(default)]
        token: Option<String>,
    },
    PostMessage {
        #[serde(default)]
        token: Option<String>,
        #[serde(default)]
        content: String,
        #[serde(default, alias = "visibility")]
        message_type: MessageType,
    },
    GetMessages {
        #[serde(default)]
        token: Option<String>,
        #[serde(default)]
        public_only: bool,
    },
    CheckStatus,
    Sync {
        #[serde(default)]
        messages: Vec<Message>,
    },
    SyncAll,
    ToggleOffline {
        #[serde(default)]
        token: Option<String>,
    },
}

impl Request {
    pub const ACTIONS: [&'static str; 8] = [
        "login",
        "logout",
        "post_message",
        "get_messages",
        "check_status",
        "sync",
        "sync_all",
        "toggle_offline",
    ];

    pub fn action(&self) -> &'static str {
        match self {
            Request::Login { .. } => "login",
            Request::Logout { .. } => "logout",
            Request::PostMessage { .. } => "post_message",
            Request::GetMessages { .. } => "get_messages",
            Request::CheckStatus => "check_status",
            Request::Sync { .. } => "sync",
            Request::SyncAll => "sync_all",
            Request::ToggleOffline { .. } => "toggle_offline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Success,
    Error,
}

/// Minimal view of any reply, used to tell failures apart before decoding
/// the full body.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplyProbe {
    pub status: ReplyStatus,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReply {
    pub status: ReplyStatus,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginReply {
    pub status: ReplyStatus,
    pub token: String,
    pub username: String,
    pub node_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckReply {
    pub status: ReplyStatus,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostReply {
    pub status: ReplyStatus,
    pub message: String,
    pub delivery_report: DeliveryReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesReply {
    pub status: ReplyStatus,
    pub messages: Vec<Message>,
    pub authenticated: bool,
    pub node_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub status: ReplyStatus,
    pub node_id: String,
    pub port: u16,
    pub active: bool,
    pub user: Option<String>,
    pub simulate_offline: bool,
}

impl NodeStatus {
    /// A peer accepts replicated messages only while it is active and not
    /// simulating a failure.
    pub fn is_available(&self) -> bool {
        self.active && !self.simulate_offline
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReply {
    pub status: ReplyStatus,
    pub received: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleReply {
    pub status: ReplyStatus,
    pub simulate_offline: bool,
    pub message: String,
}

/// Any reply a node can produce.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Error(ErrorReply),
    Login(LoginReply),
    Ack(AckReply),
    Posted(PostReply),
    Messages(MessagesReply),
    Status(NodeStatus),
    Synced(SyncReply),
    Toggled(ToggleReply),
}

impl Reply {
    pub fn error(message: impl Into<String>) -> Self {
        Reply::Error(ErrorReply {
            status: ReplyStatus::Error,
            message: message.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Reply::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_accepts_visibility_alias() {
        let raw = r#"{"action":"post_message","token":"t","content":"hi","visibility":"private"}"#;
        let request: Request = serde_json::from_str(raw).unwrap();
        match request {
            Request::PostMessage { message_type, .. } => {
                assert_eq!(message_type, MessageType::Private)
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn unit_action_parses_without_fields() {
        let request: Request = serde_json::from_str(r#"{"action":"check_status"}"#).unwrap();
        assert_eq!(request.action(), "check_status");
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(serde_json::from_str::<Request>(r#"{"action":"reboot"}"#).is_err());
    }

    #[test]
    fn status_serializes_missing_user_as_null() {
        let status = NodeStatus {
            status: ReplyStatus::Success,
            node_id: "Node1".into(),
            port: 8001,
            active: false,
            user: None,
            simulate_offline: false,
        };
        let value = serde_json::to_value(Reply::Status(status)).unwrap();
        assert_eq!(value["status"], "success");
        assert!(value["user"].is_null());
    }

    #[test]
    fn message_without_type_defaults_to_public() {
        let raw = r#"{"id":"1","author":"a","content":"c","timestamp":1.5}"#;
        let message: Message = serde_json::from_str(raw).unwrap();
        assert!(message.is_public());
    }
}
