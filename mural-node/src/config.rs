use std::fs;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/node.json";
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Each node serves HTTP on its TCP port plus this offset.
pub const HTTP_PORT_OFFSET: u16 = 1000;

/// HTTP port paired with a node's TCP port, if it fits in a `u16`.
pub fn http_port_for(tcp_port: u16) -> Option<u16> {
    tcp_port.checked_add(HTTP_PORT_OFFSET)
}

/// An account registered on top of the built-in ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,
    pub password: String,
}

/// One member of the default cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterMember {
    pub id: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_cluster")]
    pub cluster: Vec<ClusterMember>,
    #[serde(default)]
    pub users: Vec<UserAccount>,
    #[serde(default = "default_peer_timeout_ms")]
    pub peer_timeout_ms: u64,
}

impl NodeConfig {
    pub fn peer_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_timeout_ms)
    }

    /// TCP ports of every cluster member except `port`.
    pub fn peers_of(&self, port: u16) -> Vec<u16> {
        self.cluster
            .iter()
            .map(|member| member.port)
            .filter(|peer| *peer != port)
            .collect()
    }

    /// Resolves peer ports on the configured host, skipping unresolvable ones.
    pub fn peer_addrs(&self, ports: &[u16]) -> Vec<SocketAddr> {
        ports
            .iter()
            .filter_map(|port| match (self.host.as_str(), *port).to_socket_addrs() {
                Ok(mut addrs) => addrs.next(),
                Err(err) => {
                    log::warn!("Invalid peer {}:{port}: {err}", self.host);
                    None
                }
            })
            .collect()
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            cluster: default_cluster(),
            users: Vec::new(),
            peer_timeout_ms: default_peer_timeout_ms(),
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_cluster() -> Vec<ClusterMember> {
    (1..=3)
        .map(|n| ClusterMember {
            id: format!("Node{n}"),
            port: 8000 + n,
        })
        .collect()
}

fn default_peer_timeout_ms() -> u64 {
    2_000
}

pub fn load_config(path: &str) -> NodeConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<NodeConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                NodeConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            NodeConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cluster_has_three_nodes_with_offset_http_ports() {
        let config = NodeConfig::default();
        let ports: Vec<_> = config.cluster.iter().map(|m| m.port).collect();
        assert_eq!(ports, [8001, 8002, 8003]);
        let http: Vec<_> = ports.iter().filter_map(|p| http_port_for(*p)).collect();
        assert_eq!(http, [9001, 9002, 9003]);
        assert_eq!(config.peers_of(8002), [8001, 8003]);
        let addrs = config.peer_addrs(&config.peers_of(8001));
        assert_eq!(addrs.iter().map(|a| a.port()).collect::<Vec<_>>(), [8002, 8003]);
    }

    #[test]
    fn http_port_overflow_is_reported() {
        assert_eq!(http_port_for(u16::MAX), None);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.json");
        fs::write(
            &path,
            r#"{"users":[{"username":"carol","password":"pw"}]}"#,
        )
        .unwrap();

        let config = load_config(path.to_str().unwrap());
        assert_eq!(config.users.len(), 1);
        assert_eq!(config.cluster.len(), 3);
        assert_eq!(config.peer_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn missing_or_invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{not json").unwrap();

        assert_eq!(load_config(broken.to_str().unwrap()).host, DEFAULT_HOST);
        assert_eq!(load_config("/nonexistent/node.json").cluster.len(), 3);
    }
}
