//! A single mural node: login state, failure simulation, the message wall
//! and the request router shared by the TCP and HTTP surfaces.

mod handlers;
mod replication;

pub use replication::delivery_report;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::auth::AuthManager;
use crate::config::UserAccount;
use crate::error::NodeError;
use crate::network::peer::PeerClient;
use crate::protocol::{NodeStatus, ReplyStatus, Reply, Request};
use crate::storage::{MuralDatabase, ensure_parent_dir};

/// Everything needed to build a node apart from its listening port.
#[derive(Debug, Clone)]
pub struct NodeSettings {
    pub id: String,
    /// TCP addresses of the other nodes.
    pub peers: Vec<SocketAddr>,
    pub users: Vec<UserAccount>,
    /// Persist the wall here; in-memory when `None`.
    pub db_path: Option<PathBuf>,
    pub peer_timeout: Duration,
}

impl NodeSettings {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            peers: Vec::new(),
            users: Vec::new(),
            db_path: None,
            peer_timeout: Duration::from_secs(2),
        }
    }

    pub fn with_peers(mut self, peers: Vec<SocketAddr>) -> Self {
        self.peers = peers;
        self
    }
}

struct NodeState {
    active: bool,
    current_user: Option<String>,
    simulate_offline: bool,
    auth: AuthManager,
}

pub struct Node {
    id: String,
    port: u16,
    peers: Vec<SocketAddr>,
    state: Mutex<NodeState>,
    wall: Mutex<MuralDatabase>,
    peer_client: PeerClient,
}

impl Node {
    pub fn new(settings: NodeSettings, port: u16) -> Result<Self, NodeError> {
        let mut auth = AuthManager::new();
        for account in &settings.users {
            auth.add_user(&account.username, &account.password)?;
        }

        let wall = match &settings.db_path {
            Some(path) => {
                ensure_parent_dir(path)?;
                MuralDatabase::with_path(path)?
            }
            None => MuralDatabase::in_memory()?,
        };

        Ok(Self {
            id: settings.id,
            port,
            peers: settings.peers,
            state: Mutex::new(NodeState {
                active: false,
                current_user: None,
                simulate_offline: false,
                auth,
            }),
            wall: Mutex::new(wall),
            peer_client: PeerClient::new(settings.peer_timeout),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn peers(&self) -> &[SocketAddr] {
        &self.peers
    }

    pub fn status(&self) -> NodeStatus {
        let state = self.state();
        NodeStatus {
            status: ReplyStatus::Success,
            node_id: self.id.clone(),
            port: self.port,
            active: state.active,
            user: state.current_user.clone(),
            simulate_offline: state.simulate_offline,
        }
    }

    /// Number of messages on the wall, private ones included.
    pub fn message_count(&self) -> usize {
        self.wall().count().unwrap_or_else(|err| {
            log::warn!("[{}] Failed to count messages: {err}", self.id);
            0
        })
    }

    pub async fn handle(&self, request: Request) -> Reply {
        log::debug!("[{}] Request: {}", self.id, request.action());
        match request {
            Request::Login { username, password } => self.login(username, password).await,
            Request::Logout { token } => self.logout(token),
            Request::PostMessage {
                token,
                content,
                message_type,
            } => self.post_message(token, content, message_type).await,
            Request::GetMessages { token, public_only } => self.get_messages(token, public_only),
            Request::CheckStatus => Reply::Status(self.status()),
            Request::Sync { messages } => self.sync(messages),
            Request::SyncAll => self.sync_all(),
            Request::ToggleOffline { token } => self.toggle_offline(token).await,
        }
    }

    fn is_available(&self) -> bool {
        let state = self.state();
        state.active && !state.simulate_offline
    }

    fn state(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wall(&self) -> MutexGuard<'_, MuralDatabase> {
        self.wall.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
