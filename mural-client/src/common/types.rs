use serde::{Deserialize, Serialize};

/// Every node serves HTTP on its TCP port plus this offset.
pub const HTTP_PORT_OFFSET: u16 = 1000;

/// Where to reach one node. Nodes are named by their TCP port; requests go
/// to the paired HTTP port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeEndpoint {
    pub host: String,
    pub tcp_port: u16,
    pub http_port: u16,
}

impl NodeEndpoint {
    /// Uses the fixed port offset; `None` when the HTTP port would overflow.
    pub fn from_tcp_port(host: &str, tcp_port: u16) -> Option<Self> {
        let http_port = tcp_port.checked_add(HTTP_PORT_OFFSET)?;
        Some(Self::with_http_port(host, tcp_port, http_port))
    }

    pub fn with_http_port(host: &str, tcp_port: u16, http_port: u16) -> Self {
        Self {
            host: host.to_string(),
            tcp_port,
            http_port,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}:{}{}", self.host, self.http_port, path)
    }

    /// Name used until the node reports its own id.
    pub fn fallback_id(&self) -> String {
        match self.tcp_port.checked_sub(8000) {
            Some(n) if n > 0 && n < 1000 => format!("Node{n}"),
            _ => format!("Node:{}", self.tcp_port),
        }
    }
}

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
}

/// A message as returned by `GET /api/messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default = "unknown_author")]
    pub author: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub message_type: MessageType,
}

impl Message {
    /// Identity used to tell already displayed messages apart.
    pub fn key(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("{}|{}|{}", self.timestamp, self.author, self.content),
        }
    }
}

fn unknown_author() -> String {
    "Unknown".to_string()
}

/// `GET /api/status`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub simulate_offline: bool,
}

/// `POST /api/login`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST /api/logout`
#[derive(Debug, Clone, Deserialize)]
pub struct AckResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeliveryReport {
    pub message: String,
}

/// `POST /api/post`
#[derive(Debug, Clone, Deserialize)]
pub struct PostResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub delivery_report: Option<DeliveryReport>,
}

impl PostResponse {
    /// The delivery report when present, else the server's message.
    pub fn summary(&self) -> String {
        self.delivery_report
            .as_ref()
            .map(|report| report.message.clone())
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "Message sent".to_string())
    }
}

/// `GET /api/messages`
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub node_id: Option<String>,
}

/// `POST /api/toggle_offline`
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleResponse {
    #[serde(default)]
    pub simulate_offline: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

/// An authenticated session on one node, held in memory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub token: String,
    pub node_id: String,
    pub endpoint: NodeEndpoint,
}

impl Session {
    pub fn port(&self) -> u16 {
        self.endpoint.tcp_port
    }
}
