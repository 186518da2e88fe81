use std::fmt;

use futures::future::join_all;

use crate::client::{MuralClient, SessionBook};
use crate::common::{NodeEndpoint, NodeStatus};
use crate::error::ApiError;
use crate::network::NodeApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeHealth {
    Active,
    SimulatingFailure,
    Inactive,
    Disconnected,
}

impl NodeHealth {
    pub fn of(status: &NodeStatus) -> Self {
        match (status.active, status.simulate_offline) {
            (true, true) => NodeHealth::SimulatingFailure,
            (true, false) => NodeHealth::Active,
            (false, _) => NodeHealth::Inactive,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NodeHealth::Active => "Active",
            NodeHealth::SimulatingFailure => "Active (simulating failure)",
            NodeHealth::Inactive => "Inactive",
            NodeHealth::Disconnected => "Disconnected",
        }
    }
}

impl fmt::Display for NodeHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One node's outcome in a sweep.
#[derive(Debug, Clone)]
pub struct NodeReport {
    pub endpoint: NodeEndpoint,
    pub result: Result<NodeStatus, ApiError>,
}

impl NodeReport {
    pub fn port(&self) -> u16 {
        self.endpoint.tcp_port
    }

    pub fn health(&self) -> NodeHealth {
        match &self.result {
            Ok(status) => NodeHealth::of(status),
            Err(_) => NodeHealth::Disconnected,
        }
    }

    pub fn node_id(&self) -> String {
        self.result
            .as_ref()
            .ok()
            .and_then(|status| status.node_id.clone())
            .unwrap_or_else(|| self.endpoint.fallback_id())
    }

    pub fn user(&self) -> Option<&str> {
        self.result.as_ref().ok()?.user.as_deref()
    }
}

/// Requests every node's status concurrently. A failing node only affects
/// its own report.
pub async fn sweep(api: &NodeApi, nodes: &[NodeEndpoint]) -> Vec<NodeReport> {
    join_all(nodes.iter().map(|endpoint| async move {
        let result = api.status(endpoint).await;
        if let Err(err) = &result {
            log::debug!("Status of {} unavailable: {err}", endpoint.fallback_id());
        }
        NodeReport {
            endpoint: endpoint.clone(),
            result,
        }
    }))
    .await
}

impl MuralClient {
    pub async fn sweep(&self) -> Vec<NodeReport> {
        sweep(&self.api, &self.nodes).await
    }
}

/// What a status card shows for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCard {
    pub node_id: String,
    pub port: u16,
    pub health: NodeHealth,
    pub user: Option<String>,
    pub your_login: bool,
    pub current_session: bool,
    pub error: Option<String>,
}

pub fn cards(reports: &[NodeReport], sessions: &SessionBook) -> Vec<NodeCard> {
    let current = sessions.current().map(|session| session.port());
    reports
        .iter()
        .map(|report| NodeCard {
            node_id: report.node_id(),
            port: report.port(),
            health: report.health(),
            user: report.user().map(str::to_string),
            your_login: sessions.get(report.port()).is_some(),
            current_session: current == Some(report.port()),
            error: report.result.as_ref().err().map(ToString::to_string),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlineUser {
    pub username: String,
    pub node_id: String,
    pub port: u16,
    pub is_current_viewer: bool,
}

/// Users logged in on reachable, active nodes.
pub fn online_users(reports: &[NodeReport], sessions: &SessionBook) -> Vec<OnlineUser> {
    let viewer = sessions.current();
    reports
        .iter()
        .filter_map(|report| {
            let status = report.result.as_ref().ok()?;
            if !status.active {
                return None;
            }
            let username = status.user.clone()?;
            let is_current_viewer = viewer.is_some_and(|session| {
                session.port() == report.port() && session.username == username
            });
            Some(OnlineUser {
                username,
                node_id: report.node_id(),
                port: report.port(),
                is_current_viewer,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub active: usize,
    pub simulating_failure: usize,
    pub inactive: usize,
    pub disconnected: usize,
}

pub fn summary(reports: &[NodeReport]) -> Summary {
    reports
        .iter()
        .fold(Summary::default(), |mut summary, report| {
            match report.health() {
                NodeHealth::Active => summary.active += 1,
                NodeHealth::SimulatingFailure => summary.simulating_failure += 1,
                NodeHealth::Inactive => summary.inactive += 1,
                NodeHealth::Disconnected => summary.disconnected += 1,
            }
            summary
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthChange {
    pub node_id: String,
    pub port: u16,
    pub from: NodeHealth,
    pub to: NodeHealth,
}

/// Nodes whose health differs between two sweeps. Nodes missing from
/// `previous` are not reported.
pub fn transitions(previous: &[NodeReport], current: &[NodeReport]) -> Vec<HealthChange> {
    current
        .iter()
        .filter_map(|report| {
            let before = previous
                .iter()
                .find(|old| old.port() == report.port())?
                .health();
            let after = report.health();
            (before != after).then(|| HealthChange {
                node_id: report.node_id(),
                port: report.port(),
                from: before,
                to: after,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Session;

    fn endpoint(port: u16) -> NodeEndpoint {
        NodeEndpoint::from_tcp_port("localhost", port).unwrap()
    }

    fn up(port: u16, user: Option<&str>, simulate_offline: bool) -> NodeReport {
        NodeReport {
            endpoint: endpoint(port),
            result: Ok(NodeStatus {
                node_id: Some(format!("Node{}", port - 8000)),
                port: Some(port),
                active: user.is_some(),
                user: user.map(str::to_string),
                simulate_offline,
            }),
        }
    }

    fn down(port: u16) -> NodeReport {
        NodeReport {
            endpoint: endpoint(port),
            result: Err(ApiError::Connection {
                url: endpoint(port).url("/api/status"),
                reason: "connection refused".into(),
            }),
        }
    }

    fn sessions_with(username: &str, port: u16) -> SessionBook {
        let mut book = SessionBook::new();
        book.insert(Session {
            username: username.into(),
            token: "t".into(),
            node_id: format!("Node{}", port - 8000),
            endpoint: endpoint(port),
        });
        book
    }

    #[test]
    fn disconnected_node_keeps_other_cards() {
        let reports = vec![up(8001, Some("admin"), false), down(8002), up(8003, None, false)];
        let cards = cards(&reports, &sessions_with("admin", 8001));

        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0].health, NodeHealth::Active);
        assert!(cards[0].your_login && cards[0].current_session);
        assert_eq!(cards[1].health, NodeHealth::Disconnected);
        assert_eq!(cards[1].node_id, "Node2");
        assert!(cards[1].error.is_some());
        assert_eq!(cards[2].health, NodeHealth::Inactive);
        assert!(!cards[2].your_login);
    }

    #[test]
    fn roster_marks_the_current_viewer() {
        let reports = vec![
            up(8001, Some("admin"), false),
            up(8002, Some("user1"), true),
            down(8003),
        ];
        let users = online_users(&reports, &sessions_with("user1", 8002));
        assert_eq!(users.len(), 2);
        assert!(!users[0].is_current_viewer);
        assert_eq!(users[1].username, "user1");
        assert!(users[1].is_current_viewer);
    }

    #[test]
    fn summary_counts_each_health() {
        let reports = vec![
            up(8001, Some("admin"), false),
            up(8002, Some("user1"), true),
            down(8003),
        ];
        assert_eq!(
            summary(&reports),
            Summary {
                active: 1,
                simulating_failure: 1,
                inactive: 0,
                disconnected: 1,
            }
        );
    }

    #[test]
    fn only_changed_nodes_are_transitions() {
        let before = vec![up(8001, Some("admin"), false), up(8002, None, false)];
        let after = vec![up(8001, Some("admin"), true), up(8002, None, false), down(8003)];
        let changes = transitions(&before, &after);
        assert_eq!(
            changes,
            vec![HealthChange {
                node_id: "Node1".into(),
                port: 8001,
                from: NodeHealth::Active,
                to: NodeHealth::SimulatingFailure,
            }]
        );
    }
}
