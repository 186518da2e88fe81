use crate::client::MuralClient;
use crate::common::types::{MessagesResponse, PostResponse, ToggleResponse};
use crate::common::{MessageType, Session};
use crate::error::ClientError;

impl MuralClient {
    fn require_session(&self) -> Result<&Session, ClientError> {
        self.sessions.current().ok_or(ClientError::NotLoggedIn)
    }

    /// Posts through the current session's node. The reply carries the
    /// node's delivery report.
    pub async fn send(
        &self,
        content: &str,
        message_type: MessageType,
    ) -> Result<PostResponse, ClientError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ClientError::EmptyMessage);
        }
        let session = self.require_session()?;
        let response = self
            .api
            .post(&session.endpoint, &session.token, content, message_type)
            .await?;
        log::debug!("Posted {} message via {}", message_type.as_str(), session.node_id);
        Ok(response)
    }

    /// Reads the current session's node with its token.
    pub async fn refresh(&self) -> Result<MessagesResponse, ClientError> {
        let session = self.require_session()?;
        Ok(self
            .api
            .messages(&session.endpoint, Some(&session.token))
            .await?)
    }

    /// Reads `port`, authenticated when a session is open there. Without a
    /// port, behaves like [`MuralClient::refresh`].
    pub async fn read(&self, port: Option<u16>) -> Result<MessagesResponse, ClientError> {
        let Some(port) = port else {
            return self.refresh().await;
        };
        let endpoint = self.node(port)?;
        let token = self.sessions.get(port).map(|session| session.token.as_str());
        Ok(self.api.messages(endpoint, token).await?)
    }

    /// Visitor read: never sends a token, so only public messages come back.
    pub async fn read_public(&self, port: u16) -> Result<MessagesResponse, ClientError> {
        let endpoint = self.node(port)?;
        Ok(self.api.messages(endpoint, None).await?)
    }

    /// Flips the failure simulation of the current session's node.
    pub async fn toggle_offline(&self) -> Result<ToggleResponse, ClientError> {
        let session = self.require_session()?;
        Ok(self
            .api
            .toggle_offline(&session.endpoint, &session.token)
            .await?)
    }
}
