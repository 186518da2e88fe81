pub mod http;
pub mod peer;
pub mod tcp;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::NodeError;
use crate::node::{Node, NodeSettings};

/// Bound but not yet serving listeners of one node. Binding first lets a
/// cluster learn every member's address before any node starts.
pub struct NodeServer {
    tcp: TcpListener,
    http: TcpListener,
}

impl NodeServer {
    pub async fn bind(host: &str, tcp_port: u16, http_port: u16) -> Result<Self, NodeError> {
        let tcp = TcpListener::bind((host, tcp_port)).await?;
        let http = TcpListener::bind((host, http_port)).await?;
        Ok(Self { tcp, http })
    }

    pub fn tcp_addr(&self) -> Result<SocketAddr, NodeError> {
        Ok(self.tcp.local_addr()?)
    }

    pub fn http_addr(&self) -> Result<SocketAddr, NodeError> {
        Ok(self.http.local_addr()?)
    }

    pub fn serve(self, settings: NodeSettings) -> Result<NodeHandle, NodeError> {
        let tcp_addr = self.tcp_addr()?;
        let http_addr = self.http_addr()?;
        let node = Arc::new(Node::new(settings, tcp_addr.port())?);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let tcp_task = tokio::spawn(tcp::serve_tcp(
            self.tcp,
            Arc::clone(&node),
            shutdown_rx.clone(),
        ));

        let router = http::router(Arc::clone(&node));
        let http_node = Arc::clone(&node);
        let mut http_shutdown = shutdown_rx;
        let http_task = tokio::spawn(async move {
            let served = axum::serve(self.http, router)
                .with_graceful_shutdown(async move {
                    let _ = http_shutdown.changed().await;
                })
                .await;
            if let Err(err) = served {
                log::error!("[{}] HTTP server terminated: {err}", http_node.id());
            }
        });

        log::info!(
            "[{}] Serving requests on tcp {tcp_addr}, http://{http_addr}",
            node.id()
        );

        Ok(NodeHandle {
            node,
            tcp_addr,
            http_addr,
            shutdown_tx,
            tasks: vec![tcp_task, http_task],
        })
    }
}

/// A running node.
pub struct NodeHandle {
    node: Arc<Node>,
    tcp_addr: SocketAddr,
    http_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl NodeHandle {
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    pub fn tcp_addr(&self) -> SocketAddr {
        self.tcp_addr
    }

    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    /// Stops both listeners and waits for them to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for task in self.tasks {
            if let Err(err) = task.await {
                log::warn!("[{}] Listener task failed: {err}", self.node.id());
            }
        }
        log::info!("[{}] Stopped", self.node.id());
    }
}
