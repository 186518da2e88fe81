use std::path::Path;

use futures::future::join_all;
use mural_node::config::NodeConfig;
use mural_node::{NodeError, NodeHandle, NodeSettings};

/// Settings of every cluster member, each peered with all the others.
pub fn member_settings(config: &NodeConfig, data_dir: Option<&Path>) -> Vec<(u16, NodeSettings)> {
    config
        .cluster
        .iter()
        .map(|member| {
            let peers = config.peer_addrs(&config.peers_of(member.port));
            let settings = NodeSettings {
                id: member.id.clone(),
                peers,
                users: config.users.clone(),
                db_path: data_dir.map(|dir| dir.join(format!("{}.db", member.id))),
                peer_timeout: config.peer_timeout(),
            };
            (member.port, settings)
        })
        .collect()
}

/// Launches every member. Members already started are stopped again when
/// one of them fails.
pub async fn start(
    config: &NodeConfig,
    data_dir: Option<&Path>,
) -> Result<Vec<NodeHandle>, NodeError> {
    let mut handles = Vec::new();
    for (port, settings) in member_settings(config, data_dir) {
        let id = settings.id.clone();
        match mural_node::launch(&config.host, port, settings).await {
            Ok(handle) => handles.push(handle),
            Err(err) => {
                log::error!("{id} could not start on port {port}: {err}");
                stop(handles).await;
                return Err(err);
            }
        }
    }
    log::info!("Cluster up: {} nodes on {}", handles.len(), config.host);
    Ok(handles)
}

pub async fn stop(handles: Vec<NodeHandle>) {
    join_all(handles.into_iter().map(NodeHandle::shutdown)).await;
}
