use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::common::{ClientEvent, NodeEndpoint, Session};
use crate::network::NodeApi;
use crate::status;

/// Sweeps every node on a fixed period for the lifetime of the process.
/// The first sweep runs immediately.
pub fn spawn_status_poller(
    api: NodeApi,
    nodes: Vec<NodeEndpoint>,
    every: Duration,
    events: mpsc::Sender<ClientEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let reports = status::sweep(&api, &nodes).await;
            if events.send(ClientEvent::StatusSwept(reports)).await.is_err() {
                log::debug!("Status poller stopped: event loop is gone");
                break;
            }
        }
    })
}

/// Periodic re-read of the current session's node, plus a status sweep.
/// At most one loop runs; starting again replaces it.
pub struct AutoRefresh {
    every: Duration,
    task: Option<JoinHandle<()>>,
}

impl AutoRefresh {
    pub fn new(every: Duration) -> Self {
        Self { every, task: None }
    }

    pub fn start(
        &mut self,
        api: NodeApi,
        session: &Session,
        nodes: Vec<NodeEndpoint>,
        events: mpsc::Sender<ClientEvent>,
    ) {
        self.stop();

        let endpoint = session.endpoint.clone();
        let token = session.token.clone();
        let every = self.every;
        log::debug!("Auto-refresh of {} every {every:?}", session.node_id);

        self.task = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let result = api.messages(&endpoint, Some(&token)).await;
                let refreshed = ClientEvent::MessagesRefreshed {
                    port: endpoint.tcp_port,
                    result,
                };
                if events.send(refreshed).await.is_err() {
                    break;
                }
                let reports = status::sweep(&api, &nodes).await;
                if events.send(ClientEvent::StatusSwept(reports)).await.is_err() {
                    break;
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::NodeHealth;

    fn closed_endpoint() -> NodeEndpoint {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        NodeEndpoint::with_http_port("127.0.0.1", 8001, port)
    }

    #[tokio::test]
    async fn poller_reports_unreachable_nodes_as_disconnected() {
        let (tx, mut rx) = mpsc::channel(4);
        let api = NodeApi::new(Duration::from_secs(1)).unwrap();
        let poller = spawn_status_poller(api, vec![closed_endpoint()], Duration::from_secs(60), tx);

        let event = time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            ClientEvent::StatusSwept(reports) => {
                assert_eq!(reports.len(), 1);
                assert_eq!(reports[0].health(), NodeHealth::Disconnected);
            }
            other => panic!("unexpected event {other:?}"),
        }
        poller.abort();
    }

    #[tokio::test]
    async fn refresh_loop_reports_for_its_session_and_stops() {
        let (tx, mut rx) = mpsc::channel(4);
        let api = NodeApi::new(Duration::from_secs(1)).unwrap();
        let session = Session {
            username: "admin".into(),
            token: "t".into(),
            node_id: "Node1".into(),
            endpoint: closed_endpoint(),
        };

        let mut refresh = AutoRefresh::new(Duration::from_millis(50));
        refresh.start(api, &session, Vec::new(), tx);
        assert!(refresh.is_running());

        let event = time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            ClientEvent::MessagesRefreshed { port, result } => {
                assert_eq!(port, 8001);
                assert!(result.is_err());
            }
            other => panic!("unexpected event {other:?}"),
        }

        refresh.stop();
        assert!(!refresh.is_running());
    }
}
