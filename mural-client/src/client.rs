use std::collections::BTreeMap;

use crate::common::{NodeEndpoint, Session};
use crate::config::ClientConfig;
use crate::error::{ApiError, ClientError};
use crate::network::NodeApi;

/// Open sessions keyed by node port, with one of them current.
#[derive(Debug, Default)]
pub struct SessionBook {
    sessions: BTreeMap<u16, Session>,
    current: Option<u16>,
}

impl SessionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `session` (replacing any on the same port) and makes it current.
    pub fn insert(&mut self, session: Session) {
        let port = session.port();
        self.sessions.insert(port, session);
        self.current = Some(port);
    }

    /// Removes the session on `port`. When it was current, the lowest
    /// remaining port becomes current.
    pub fn remove(&mut self, port: u16) -> Option<Session> {
        let removed = self.sessions.remove(&port)?;
        if self.current == Some(port) {
            self.current = self.sessions.keys().next().copied();
        }
        Some(removed)
    }

    pub fn switch(&mut self, port: u16) -> Result<&Session, ClientError> {
        let session = self
            .sessions
            .get(&port)
            .ok_or(ClientError::NoSession(port))?;
        self.current = Some(port);
        Ok(session)
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.and_then(|port| self.sessions.get(&port))
    }

    pub fn get(&self, port: u16) -> Option<&Session> {
        self.sessions.get(&port)
    }

    pub fn ports(&self) -> Vec<u16> {
        self.sessions.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Client-side view of the cluster: the API, the configured nodes and the
/// sessions held on them. Operations live in `auth`, `messaging` and
/// `status`.
pub struct MuralClient {
    pub(crate) api: NodeApi,
    pub(crate) nodes: Vec<NodeEndpoint>,
    pub(crate) sessions: SessionBook,
}

impl MuralClient {
    pub fn new(api: NodeApi, nodes: Vec<NodeEndpoint>) -> Self {
        Self {
            api,
            nodes,
            sessions: SessionBook::new(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let api = NodeApi::new(config.request_timeout())?;
        Ok(Self::new(api, config.endpoints()))
    }

    pub fn api(&self) -> &NodeApi {
        &self.api
    }

    pub fn nodes(&self) -> &[NodeEndpoint] {
        &self.nodes
    }

    pub fn sessions(&self) -> &SessionBook {
        &self.sessions
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.sessions.current()
    }

    /// The configured node listening on TCP `port`.
    pub fn node(&self, port: u16) -> Result<&NodeEndpoint, ClientError> {
        self.nodes
            .iter()
            .find(|node| node.tcp_port == port)
            .ok_or(ClientError::UnknownNode(port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(username: &str, port: u16) -> Session {
        Session {
            username: username.to_string(),
            token: format!("token-{port}"),
            node_id: format!("Node{}", port - 8000),
            endpoint: NodeEndpoint::from_tcp_port("localhost", port).unwrap(),
        }
    }

    #[test]
    fn newest_session_becomes_current() {
        let mut book = SessionBook::new();
        book.insert(session("admin", 8001));
        book.insert(session("user1", 8003));
        assert_eq!(book.current().map(Session::port), Some(8003));
        assert_eq!(book.ports(), vec![8001, 8003]);
    }

    #[test]
    fn removing_current_picks_remaining_session() {
        let mut book = SessionBook::new();
        book.insert(session("admin", 8002));
        book.insert(session("user1", 8001));
        book.remove(8001);
        assert_eq!(book.current().map(Session::port), Some(8002));
        book.remove(8002);
        assert!(book.current().is_none());
        assert!(book.is_empty());
    }

    #[test]
    fn switch_requires_existing_session() {
        let mut book = SessionBook::new();
        book.insert(session("admin", 8001));
        book.insert(session("user1", 8002));
        assert_eq!(book.switch(8001).map(|s| s.username.clone()), Ok("admin".to_string()));
        assert_eq!(book.current().map(Session::port), Some(8001));
        assert_eq!(book.switch(8003).err(), Some(ClientError::NoSession(8003)));
        assert_eq!(book.current().map(Session::port), Some(8001));
    }

    #[test]
    fn unknown_node_is_reported() {
        let api = NodeApi::new(std::time::Duration::from_secs(1)).unwrap();
        let client = MuralClient::new(api, ClientConfig::default().endpoints());
        assert!(client.node(8002).is_ok());
        assert_eq!(client.node(9999).err(), Some(ClientError::UnknownNode(9999)));
    }
}
