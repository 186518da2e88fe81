use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::NodeEndpoint;

pub const DEFAULT_CONFIG_PATH: &str = "config/client.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP ports of the nodes; at most three are swept.
    #[serde(default = "default_node_ports")]
    pub node_ports: Vec<u16>,
    #[serde(default = "default_interval_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_interval_secs")]
    pub status_poll_secs: u64,
    #[serde(default = "default_interval_secs")]
    pub auto_refresh_secs: u64,
}

impl ClientConfig {
    /// Endpoints of the configured nodes, dropping ports whose HTTP port
    /// would not fit in a `u16`.
    pub fn endpoints(&self) -> Vec<NodeEndpoint> {
        self.node_ports
            .iter()
            .take(3)
            .filter_map(|port| {
                let endpoint = NodeEndpoint::from_tcp_port(&self.host, *port);
                if endpoint.is_none() {
                    log::warn!("Ignoring node port {port}: no HTTP port pairs with it");
                }
                endpoint
            })
            .collect()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_secs(self.status_poll_secs.max(1))
    }

    pub fn auto_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.auto_refresh_secs.max(1))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            node_ports: default_node_ports(),
            request_timeout_secs: default_interval_secs(),
            status_poll_secs: default_interval_secs(),
            auto_refresh_secs: default_interval_secs(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_node_ports() -> Vec<u16> {
    vec![8001, 8002, 8003]
}

fn default_interval_secs() -> u64 {
    5
}

pub fn load_config(path: &str) -> ClientConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<ClientConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                ClientConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            ClientConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_target_three_local_nodes() {
        let config = ClientConfig::default();
        let ports: Vec<(u16, u16)> = config
            .endpoints()
            .iter()
            .map(|endpoint| (endpoint.tcp_port, endpoint.http_port))
            .collect();
        assert_eq!(ports, vec![(8001, 9001), (8002, 9002), (8003, 9003)]);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"host":"10.0.0.7","node_ports":[7001,7002]}}"#).unwrap();

        let config = load_config(file.path().to_str().unwrap());
        assert_eq!(config.host, "10.0.0.7");
        assert_eq!(config.endpoints().len(), 2);
        assert_eq!(config.status_poll_secs, 5);
    }

    #[test]
    fn invalid_or_missing_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert_eq!(load_config(file.path().to_str().unwrap()).node_ports.len(), 3);
        assert_eq!(load_config("/nonexistent/client.json").host, "localhost");
    }

    #[test]
    fn only_three_nodes_are_swept() {
        let config = ClientConfig {
            node_ports: vec![8001, 8002, 8003, 8004, 65000],
            ..ClientConfig::default()
        };
        assert_eq!(config.endpoints().len(), 3);
    }
}
