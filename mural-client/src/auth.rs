use futures::future::join_all;

use crate::client::MuralClient;
use crate::common::types::AckResponse;
use crate::common::Session;
use crate::error::{ApiError, ClientError};

/// Result of closing one session. The session is gone locally whatever the
/// node answered.
#[derive(Debug, Clone)]
pub struct LogoutOutcome {
    pub session: Session,
    pub server: Result<AckResponse, ApiError>,
}

impl LogoutOutcome {
    pub fn describe(&self) -> String {
        match &self.server {
            Ok(_) => format!(
                "Logged out {} from {}",
                self.session.username, self.session.node_id
            ),
            Err(err) => format!(
                "Logged out {} locally; {} did not confirm: {err}",
                self.session.username, self.session.node_id
            ),
        }
    }
}

impl MuralClient {
    /// Logs in on the node at `port`. The session book is only touched when
    /// the node issues a token.
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
        port: u16,
    ) -> Result<Session, ClientError> {
        let endpoint = self.node(port)?.clone();
        let response = self.api.login(&endpoint, username, password).await?;

        let token = response
            .token
            .filter(|token| !token.is_empty())
            .ok_or(ClientError::MissingToken)?;
        let session = Session {
            username: username.to_string(),
            token,
            node_id: response
                .node_id
                .unwrap_or_else(|| endpoint.fallback_id()),
            endpoint,
        };

        log::info!("Logged in as {} on {}", session.username, session.node_id);
        self.sessions.insert(session.clone());
        Ok(session)
    }

    /// Closes the session on `port`, or the current one.
    pub async fn logout(&mut self, port: Option<u16>) -> Result<LogoutOutcome, ClientError> {
        let port = match port {
            Some(port) => port,
            None => self
                .sessions
                .current()
                .map(Session::port)
                .ok_or(ClientError::NotLoggedIn)?,
        };
        let session = self
            .sessions
            .remove(port)
            .ok_or(ClientError::NoSession(port))?;

        let server = self.api.logout(&session.endpoint, &session.token).await;
        if let Err(err) = &server {
            log::warn!("Logout on {} failed: {err}", session.node_id);
        }
        Ok(LogoutOutcome { session, server })
    }

    /// Closes every session, contacting the nodes concurrently.
    pub async fn logout_all(&mut self) -> Vec<LogoutOutcome> {
        let sessions: Vec<Session> = self
            .sessions
            .ports()
            .into_iter()
            .filter_map(|port| self.sessions.remove(port))
            .collect();

        let api = &self.api;
        join_all(sessions.into_iter().map(|session| async move {
            let server = api.logout(&session.endpoint, &session.token).await;
            LogoutOutcome { session, server }
        }))
        .await
    }

    pub fn switch(&mut self, port: u16) -> Result<Session, ClientError> {
        self.sessions.switch(port).cloned()
    }
}
