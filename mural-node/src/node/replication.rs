use std::net::SocketAddr;

use futures::future::join_all;

use crate::error::NodeError;
use crate::protocol::{DeliveryReport, Message, NodeStatus};

use super::Node;

impl Node {
    /// Status of every peer, queried concurrently. Unreachable peers keep
    /// their error.
    pub(super) async fn peer_statuses(&self) -> Vec<(SocketAddr, Result<NodeStatus, NodeError>)> {
        join_all(
            self.peers
                .iter()
                .map(|addr| async move { (*addr, self.peer_client.status(*addr).await) }),
        )
        .await
    }

    pub(super) async fn peer_hosting(&self, username: &str) -> Option<NodeStatus> {
        self.peer_statuses()
            .await
            .into_iter()
            .filter_map(|(_, status)| status.ok())
            .find(|status| status.user.as_deref() == Some(username))
    }

    /// Pushes a freshly posted message to every available peer.
    pub(super) async fn replicate(&self, message: &Message) -> DeliveryReport {
        let available: Vec<(SocketAddr, NodeStatus)> = self
            .peer_statuses()
            .await
            .into_iter()
            .filter_map(|(addr, status)| match status {
                Ok(status) if status.is_available() => Some((addr, status)),
                Ok(_) => None,
                Err(err) => {
                    log::debug!("[{}] Peer {addr} unreachable: {err}", self.id);
                    None
                }
            })
            .collect();

        let deliveries = join_all(
            available
                .iter()
                .map(|(addr, _)| self.peer_client.sync(*addr, vec![message.clone()])),
        )
        .await;

        let delivered: Vec<&NodeStatus> = available
            .iter()
            .zip(deliveries)
            .filter_map(|((addr, status), result)| match result {
                Ok(_) => Some(status),
                Err(err) => {
                    log::warn!("[{}] Replication to {addr} failed: {err}", self.id);
                    None
                }
            })
            .collect();

        delivery_report(available.len(), &delivered)
    }

    /// Pulls the full wall of every available peer after a simulated failure
    /// ends. Returns how many messages were recovered.
    pub(super) async fn catch_up(&self) -> usize {
        log::info!("[{}] RECONNECTING: fetching missed messages", self.id);

        let available: Vec<SocketAddr> = self
            .peer_statuses()
            .await
            .into_iter()
            .filter_map(|(addr, status)| match status {
                Ok(status) if status.is_available() => Some(addr),
                Ok(_) => None,
                Err(err) => {
                    log::debug!("[{}] Peer {addr} unreachable: {err}", self.id);
                    None
                }
            })
            .collect();

        let walls = join_all(
            available
                .iter()
                .map(|addr| async move { (*addr, self.peer_client.sync_all(*addr).await) }),
        )
        .await;

        let mut recovered = 0;
        for (addr, wall) in walls {
            let messages = match wall {
                Ok(messages) => messages,
                Err(err) => {
                    log::debug!("[{}] Sync with {addr} failed: {err}", self.id);
                    continue;
                }
            };
            match self.wall().merge(&messages) {
                Ok(count) => recovered += count,
                Err(err) => log::warn!("[{}] Failed to merge messages from {addr}: {err}", self.id),
            }
        }

        if recovered > 0 {
            log::info!("[{}] RECOVERED: {recovered} messages", self.id);
        }
        recovered
    }
}

/// Summarises a replication round for the poster.
pub fn delivery_report(available_peers: usize, delivered: &[&NodeStatus]) -> DeliveryReport {
    let message = if available_peers == 0 {
        "Message stored, no other active node was found".to_string()
    } else if delivered.len() == available_peers {
        "Message delivered to every active node".to_string()
    } else if !delivered.is_empty() {
        let receivers: Vec<String> = delivered
            .iter()
            .map(|status| {
                format!(
                    "{}({})",
                    status.user.as_deref().unwrap_or("unknown"),
                    status.port
                )
            })
            .collect();
        format!("Message delivered to {}", receivers.join(", "))
    } else {
        "Message was not delivered to any active node".to_string()
    };

    DeliveryReport { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ReplyStatus;

    fn peer(user: &str, port: u16) -> NodeStatus {
        NodeStatus {
            status: ReplyStatus::Success,
            node_id: format!("Node{}", port - 8000),
            port,
            active: true,
            user: Some(user.to_string()),
            simulate_offline: false,
        }
    }

    #[test]
    fn report_without_peers() {
        assert!(delivery_report(0, &[]).message.contains("no other active node"));
    }

    #[test]
    fn report_when_everyone_received() {
        let a = peer("user1", 8002);
        let b = peer("user2", 8003);
        assert_eq!(
            delivery_report(2, &[&a, &b]).message,
            "Message delivered to every active node"
        );
    }

    #[test]
    fn report_lists_partial_receivers() {
        let a = peer("user1", 8002);
        assert_eq!(
            delivery_report(2, &[&a]).message,
            "Message delivered to user1(8002)"
        );
    }

    #[test]
    fn report_when_nobody_received() {
        assert_eq!(
            delivery_report(2, &[]).message,
            "Message was not delivered to any active node"
        );
    }
}
