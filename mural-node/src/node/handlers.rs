use crate::protocol::{
    AckReply, LoginReply, Message, MessageType, MessagesReply, PostReply, Reply, ReplyStatus,
    SyncReply, ToggleReply,
};

use super::Node;

impl Node {
    pub(super) async fn login(&self, username: String, password: String) -> Reply {
        log::info!("[{}] LOGIN: {username}", self.id);

        let already_here = self.state().current_user.as_deref() == Some(username.as_str());
        if already_here {
            return Reply::error(format!("User {username} is already logged in on this node"));
        }

        if let Some(peer) = self.peer_hosting(&username).await {
            log::info!(
                "[{}] LOGIN REFUSED: {username} already on {}",
                self.id,
                peer.node_id
            );
            return Reply::error(format!(
                "User {username} is already connected to another node"
            ));
        }

        let token = {
            let mut state = self.state();
            let Some(token) = state.auth.login(&username, &password) else {
                return Reply::error("Invalid credentials");
            };
            state.active = true;
            state.current_user = Some(username.clone());
            token
        };

        log::info!("[{}] LOGIN OK: {username}", self.id);
        Reply::Login(LoginReply {
            status: ReplyStatus::Success,
            token,
            message: format!("Welcome, {username}"),
            username,
            node_id: self.id.clone(),
        })
    }

    pub(super) fn logout(&self, token: Option<String>) -> Reply {
        let mut state = self.state();
        let Some(username) = token.as_deref().and_then(|t| state.auth.logout(t)) else {
            return Reply::error("Invalid token");
        };

        if state.current_user.as_deref() == Some(username.as_str()) {
            state.current_user = None;
        }
        state.active = state.current_user.is_some();

        log::info!("[{}] LOGOUT: {username}", self.id);
        Reply::Ack(AckReply {
            status: ReplyStatus::Success,
            message: "Logout OK".to_string(),
        })
    }

    pub(super) async fn post_message(
        &self,
        token: Option<String>,
        content: String,
        message_type: MessageType,
    ) -> Reply {
        if content.trim().is_empty() {
            return Reply::error("Message content is empty");
        }

        let message = {
            let state = self.state();
            if !state.active {
                return Reply::error("Node inactive");
            }
            if state.simulate_offline {
                return Reply::error("Send failed, the node lost its connection");
            }
            let Some(author) = token.as_deref().and_then(|t| state.auth.username(t)) else {
                return Reply::error("Invalid token");
            };
            Message::new(author, &content, message_type)
        };

        let stored = self.wall().insert(&message);
        if let Err(err) = stored {
            log::error!("[{}] Failed to store message: {err}", self.id);
            return Reply::error("Failed to store message");
        }
        log::info!(
            "[{}] MESSAGE ({}): [{}] {}",
            self.id,
            message.message_type.as_str(),
            message.author,
            message.content
        );

        let delivery_report = self.replicate(&message).await;
        Reply::Posted(PostReply {
            status: ReplyStatus::Success,
            message: "Message sent".to_string(),
            delivery_report,
        })
    }

    pub(super) fn get_messages(&self, token: Option<String>, public_only: bool) -> Reply {
        let authenticated = token
            .as_deref()
            .is_some_and(|t| self.state().auth.is_authenticated(t));

        let messages = {
            let wall = self.wall();
            if authenticated && !public_only {
                wall.all()
            } else {
                wall.public()
            }
        };

        match messages {
            Ok(messages) => Reply::Messages(MessagesReply {
                status: ReplyStatus::Success,
                messages,
                authenticated,
                node_id: self.id.clone(),
            }),
            Err(err) => {
                log::error!("[{}] Failed to read messages: {err}", self.id);
                Reply::error("Failed to read messages")
            }
        }
    }

    pub(super) fn sync(&self, messages: Vec<Message>) -> Reply {
        if !self.is_available() {
            return Reply::error("Node unavailable");
        }

        let merged = self.wall().merge(&messages);
        match merged {
            Ok(received) => {
                if received > 0 {
                    log::info!("[{}] SYNC: {received} messages received", self.id);
                }
                Reply::Synced(SyncReply {
                    status: ReplyStatus::Success,
                    received,
                })
            }
            Err(err) => {
                log::error!("[{}] Failed to merge messages: {err}", self.id);
                Reply::error("Failed to store messages")
            }
        }
    }

    pub(super) fn sync_all(&self) -> Reply {
        if !self.is_available() {
            return Reply::error("Node unavailable");
        }

        let messages = self.wall().all();
        match messages {
            Ok(messages) => {
                log::info!("[{}] SYNC_ALL: sending {} messages", self.id, messages.len());
                Reply::Messages(MessagesReply {
                    status: ReplyStatus::Success,
                    messages,
                    authenticated: true,
                    node_id: self.id.clone(),
                })
            }
            Err(err) => {
                log::error!("[{}] Failed to read messages: {err}", self.id);
                Reply::error("Failed to read messages")
            }
        }
    }

    pub(super) async fn toggle_offline(&self, token: Option<String>) -> Reply {
        let simulate_offline = {
            let mut state = self.state();
            let authorized = token
                .as_deref()
                .is_some_and(|t| state.auth.is_authenticated(t));
            if !authorized {
                return Reply::error("Invalid token");
            }
            state.simulate_offline = !state.simulate_offline;
            state.simulate_offline
        };

        if simulate_offline {
            log::warn!("[{}] SIMULATION: failure enabled", self.id);
        } else {
            log::info!("[{}] SIMULATION: failure disabled", self.id);
            self.catch_up().await;
        }

        Reply::Toggled(ToggleReply {
            status: ReplyStatus::Success,
            simulate_offline,
            message: if simulate_offline {
                "Failure simulation enabled".to_string()
            } else {
                "Failure simulation disabled".to_string()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::node::{Node, NodeSettings};
    use crate::protocol::{MessageType, Reply, Request};

    fn lone_node() -> Node {
        Node::new(NodeSettings::new("Node1"), 8001).unwrap()
    }

    async fn login(node: &Node, user: &str, password: &str) -> String {
        match node
            .handle(Request::Login {
                username: user.into(),
                password: password.into(),
            })
            .await
        {
            Reply::Login(reply) => reply.token,
            other => panic!("login failed: {other:?}"),
        }
    }

    async fn post(node: &Node, token: &str, content: &str, message_type: MessageType) -> Reply {
        node.handle(Request::PostMessage {
            token: Some(token.into()),
            content: content.into(),
            message_type,
        })
        .await
    }

    #[tokio::test]
    async fn login_activates_node_and_rejects_second_login_of_same_user() {
        let node = lone_node();
        login(&node, "admin", "admin123").await;

        let status = node.status();
        assert!(status.active);
        assert_eq!(status.user.as_deref(), Some("admin"));

        let again = node
            .handle(Request::Login {
                username: "admin".into(),
                password: "admin123".into(),
            })
            .await;
        assert!(!again.is_success());
    }

    #[tokio::test]
    async fn bad_credentials_leave_node_inactive() {
        let node = lone_node();
        let reply = node
            .handle(Request::Login {
                username: "admin".into(),
                password: "wrong".into(),
            })
            .await;
        assert!(!reply.is_success());
        assert!(!node.status().active);
    }

    #[tokio::test]
    async fn logout_deactivates_and_invalidates_token() {
        let node = lone_node();
        let token = login(&node, "user1", "password1").await;

        let reply = node.handle(Request::Logout { token: Some(token.clone()) }).await;
        assert!(reply.is_success());
        assert!(!node.status().active);
        assert_eq!(node.status().user, None);

        let again = node.handle(Request::Logout { token: Some(token) }).await;
        assert!(!again.is_success());
    }

    #[tokio::test]
    async fn logout_of_earlier_user_keeps_current_user_active() {
        let node = lone_node();
        let first = login(&node, "user1", "password1").await;
        login(&node, "user2", "password2").await;

        let reply = node.handle(Request::Logout { token: Some(first) }).await;
        assert!(reply.is_success());
        assert!(node.status().active);
        assert_eq!(node.status().user.as_deref(), Some("user2"));
    }

    #[tokio::test]
    async fn posting_requires_active_node_and_valid_token() {
        let node = lone_node();
        let rejected = post(&node, "nope", "hello", MessageType::Public).await;
        assert!(!rejected.is_success());

        let token = login(&node, "admin", "admin123").await;
        assert!(!post(&node, "forged", "hello", MessageType::Public).await.is_success());
        assert!(!post(&node, &token, "   ", MessageType::Public).await.is_success());

        match post(&node, &token, "hello", MessageType::Public).await {
            Reply::Posted(reply) => assert!(reply.delivery_report.message.contains("no other active node")),
            other => panic!("unexpected reply {other:?}"),
        }
        assert_eq!(node.message_count(), 1);
    }

    #[tokio::test]
    async fn visitors_only_see_public_messages() {
        let node = lone_node();
        let token = login(&node, "admin", "admin123").await;
        post(&node, &token, "for everyone", MessageType::Public).await;
        post(&node, &token, "secret", MessageType::Private).await;

        let visitor = node
            .handle(Request::GetMessages {
                token: None,
                public_only: false,
            })
            .await;
        match visitor {
            Reply::Messages(reply) => {
                assert!(!reply.authenticated);
                assert_eq!(reply.messages.len(), 1);
                assert_eq!(reply.messages[0].content, "for everyone");
            }
            other => panic!("unexpected reply {other:?}"),
        }

        let member = node
            .handle(Request::GetMessages {
                token: Some(token.clone()),
                public_only: false,
            })
            .await;
        match member {
            Reply::Messages(reply) => {
                assert!(reply.authenticated);
                assert_eq!(reply.messages.len(), 2);
            }
            other => panic!("unexpected reply {other:?}"),
        }

        let forced_public = node
            .handle(Request::GetMessages {
                token: Some(token),
                public_only: true,
            })
            .await;
        match forced_public {
            Reply::Messages(reply) => assert_eq!(reply.messages.len(), 1),
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[tokio::test]
    async fn simulated_failure_blocks_posts_and_sync() {
        let node = lone_node();
        let token = login(&node, "admin", "admin123").await;

        let toggled = node
            .handle(Request::ToggleOffline {
                token: Some(token.clone()),
            })
            .await;
        assert!(matches!(toggled, Reply::Toggled(ref t) if t.simulate_offline));
        assert!(node.status().simulate_offline);

        assert!(!post(&node, &token, "lost", MessageType::Public).await.is_success());
        assert!(!node.handle(Request::Sync { messages: vec![] }).await.is_success());
        assert!(!node.handle(Request::SyncAll).await.is_success());

        let restored = node.handle(Request::ToggleOffline { token: Some(token) }).await;
        assert!(matches!(restored, Reply::Toggled(ref t) if !t.simulate_offline));
    }

    #[tokio::test]
    async fn toggle_requires_token() {
        let node = lone_node();
        let reply = node.handle(Request::ToggleOffline { token: None }).await;
        assert!(!reply.is_success());
        assert!(!node.status().simulate_offline);
    }

    #[tokio::test]
    async fn sync_merges_without_duplicates() {
        let node = lone_node();
        login(&node, "admin", "admin123").await;
        let message = crate::protocol::Message::new("user2", "from a peer", MessageType::Private);

        for expected in [1, 0] {
            match node
                .handle(Request::Sync {
                    messages: vec![message.clone()],
                })
                .await
            {
                Reply::Synced(reply) => assert_eq!(reply.received, expected),
                other => panic!("unexpected reply {other:?}"),
            }
        }

        match node.handle(Request::SyncAll).await {
            Reply::Messages(reply) => assert_eq!(reply.messages, vec![message]),
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[tokio::test]
    async fn configured_accounts_can_log_in() {
        let mut settings = NodeSettings::new("Node1");
        settings.users.push(crate::config::UserAccount {
            username: "carol".into(),
            password: "pw".into(),
        });
        let node = Node::new(settings, 8001).unwrap();
        login(&node, "carol", "pw").await;
        assert_eq!(node.status().user.as_deref(), Some("carol"));
    }
}
