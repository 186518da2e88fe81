//! Backend node of the distributed mural.
//!
//! A node keeps its own accounts, login state and message wall. It answers
//! JSON requests on its TCP port and the same operations under `/api/*` on
//! its HTTP port (TCP port + 1000), replicates posted messages to its peers
//! and can simulate a failure without shutting down.

pub mod auth;
pub mod config;
pub mod error;
pub mod network;
pub mod node;
pub mod protocol;
pub mod storage;

pub use error::NodeError;
pub use network::{NodeHandle, NodeServer};
pub use node::{Node, NodeSettings};

/// Binds `tcp_port` and its paired HTTP port on `host` and starts serving.
pub async fn launch(
    host: &str,
    tcp_port: u16,
    settings: NodeSettings,
) -> Result<NodeHandle, NodeError> {
    let http_port = config::http_port_for(tcp_port).ok_or_else(|| {
        NodeError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("no HTTP port pairs with tcp port {tcp_port}"),
        ))
    })?;
    let server = NodeServer::bind(host, tcp_port, http_port).await?;
    server.serve(settings)
}
