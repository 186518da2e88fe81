use std::time::Duration;

use tokio::sync::mpsc;

use crate::client::MuralClient;
use crate::common::{ClientCommand, ClientEvent, CommandError, MessageType};
use crate::error::ClientError;
use crate::status;

use super::components::{console, status_panel, wall};
use super::state::{NoticeKind, ViewState};
use super::timers::AutoRefresh;

/// Owns the client and everything the terminal shows. Commands and
/// background events both go through here, one at a time.
pub struct TerminalApp {
    client: MuralClient,
    state: ViewState,
    refresh: AutoRefresh,
    event_sender: mpsc::Sender<ClientEvent>,
}

impl TerminalApp {
    pub fn new(
        client: MuralClient,
        refresh_every: Duration,
        event_sender: mpsc::Sender<ClientEvent>,
    ) -> Self {
        Self {
            client,
            state: ViewState::new(),
            refresh: AutoRefresh::new(refresh_every),
            event_sender,
        }
    }

    pub fn client(&self) -> &MuralClient {
        &self.client
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn prompt(&self) -> String {
        console::prompt(self.client.sessions())
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_running()
    }

    /// Runs one command and returns what to print.
    pub async fn execute(&mut self, command: ClientCommand) -> String {
        match command {
            ClientCommand::Login {
                username,
                password,
                port,
            } => self.login(&username, &password, port).await,
            ClientCommand::Logout { port } => match self.client.logout(port).await {
                Ok(outcome) => {
                    let kind = if outcome.server.is_ok() {
                        NoticeKind::Success
                    } else {
                        NoticeKind::Info
                    };
                    let text = outcome.describe();
                    self.follow_current_session();
                    self.notice(kind, text)
                }
                Err(err) => self.error(err),
            },
            ClientCommand::LogoutAll => {
                let outcomes = self.client.logout_all().await;
                self.follow_current_session();
                if outcomes.is_empty() {
                    return self.notice(NoticeKind::Info, "No open sessions");
                }
                outcomes
                    .iter()
                    .map(|outcome| self.notice(NoticeKind::Info, outcome.describe()))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            ClientCommand::Switch { port: None } => {
                status_panel::render_sessions(self.client.sessions())
            }
            ClientCommand::Switch { port: Some(port) } => match self.client.switch(port) {
                Ok(session) => {
                    self.follow_current_session();
                    self.notice(
                        NoticeKind::Success,
                        format!("Current session: {} @ {}", session.username, session.node_id),
                    )
                }
                Err(err) => self.error(err),
            },
            ClientCommand::Post {
                content,
                message_type,
            } => self.post(&content, message_type).await,
            ClientCommand::Read { port } => {
                let watched = port.is_none()
                    || port == self.client.current_session().map(|session| session.port());
                match self.client.read(port).await {
                    Ok(response) => {
                        if watched {
                            self.state.mark_seen(&response.messages);
                        }
                        let heading = format!(
                            "{} ({})",
                            response.node_id.as_deref().unwrap_or("Messages"),
                            if response.authenticated {
                                "authenticated"
                            } else {
                                "public only"
                            }
                        );
                        wall::render(&heading, &response.messages)
                    }
                    Err(err) => self.error(err),
                }
            }
            ClientCommand::ReadPublic { port } => match self.client.read_public(port).await {
                Ok(response) => {
                    let heading = format!(
                        "{} (visitor)",
                        response.node_id.as_deref().unwrap_or("Messages")
                    );
                    wall::render(&heading, &response.messages)
                }
                Err(err) => self.error(err),
            },
            ClientCommand::Status => {
                let reports = self.client.sweep().await;
                self.state.apply_sweep(reports);
                let cards = status::cards(&self.state.reports, self.client.sessions());
                let summary = status::summary(&self.state.reports);
                format!(
                    "{}\n{}",
                    status_panel::render_cards(&cards),
                    status_panel::render_summary(&summary, self.client.sessions())
                )
            }
            ClientCommand::Users => {
                let reports = self.client.sweep().await;
                self.state.apply_sweep(reports);
                let users = status::online_users(&self.state.reports, self.client.sessions());
                status_panel::render_roster(&users)
            }
            ClientCommand::Simulate => match self.client.toggle_offline().await {
                Ok(response) => self.notice(
                    NoticeKind::Success,
                    response
                        .message
                        .unwrap_or_else(|| "Failure simulation toggled".to_string()),
                ),
                Err(err) => self.error(err),
            },
            ClientCommand::Help => console::help().to_string(),
            ClientCommand::Quit => {
                let outcomes = self.client.logout_all().await;
                self.refresh.stop();
                let mut lines: Vec<String> =
                    outcomes.iter().map(|outcome| outcome.describe()).collect();
                lines.push("Goodbye".to_string());
                lines.join("\n")
            }
        }
    }

    /// Applies a background event. Returns text only when something changed
    /// for the user.
    pub fn handle_event(&mut self, event: ClientEvent) -> Option<String> {
        match event {
            ClientEvent::StatusSwept(reports) => {
                let changes = self.state.apply_sweep(reports);
                if changes.is_empty() {
                    return None;
                }
                let lines: Vec<String> = changes
                    .iter()
                    .map(|change| {
                        let kind = match change.to {
                            status::NodeHealth::Active => NoticeKind::Success,
                            status::NodeHealth::Disconnected => NoticeKind::Error,
                            _ => NoticeKind::Info,
                        };
                        self.notice(kind, status_panel::render_change(change))
                    })
                    .collect();
                Some(lines.join("\n"))
            }
            ClientEvent::MessagesRefreshed { port, result } => {
                let current = self.client.current_session().map(|session| session.port());
                if current != Some(port) {
                    log::trace!("Dropping refresh of {port}: no longer current");
                    return None;
                }
                match result {
                    Ok(response) => {
                        self.state.refresh_succeeded();
                        let fresh = self.state.unseen(&response.messages);
                        if fresh.is_empty() {
                            return None;
                        }
                        let lines: Vec<String> = fresh.iter().map(wall::format_message).collect();
                        Some(lines.join("\n"))
                    }
                    Err(err) => {
                        if !self.state.refresh_failed(&err) {
                            return None;
                        }
                        Some(self.notice(NoticeKind::Error, format!("Auto-refresh failed: {err}")))
                    }
                }
            }
        }
    }

    async fn login(&mut self, username: &str, password: &str, port: u16) -> String {
        let session = match self.client.login(username, password, port).await {
            Ok(session) => session,
            Err(err) => return self.error(err),
        };
        self.follow_current_session();

        let mut out = self.notice(
            NoticeKind::Success,
            format!("Logged in as {} on {}", session.username, session.node_id),
        );
        match self.client.refresh().await {
            Ok(response) => {
                self.state.mark_seen(&response.messages);
                out.push('\n');
                out.push_str(&wall::render(&session.node_id, &response.messages));
            }
            Err(err) => {
                out.push('\n');
                out.push_str(&self.error(err));
            }
        }
        out
    }

    async fn post(&mut self, content: &str, message_type: MessageType) -> String {
        match self.client.send(content, message_type).await {
            Ok(response) => self.notice(NoticeKind::Success, response.summary()),
            Err(err) => self.error(err),
        }
    }

    /// Restarts or stops auto-refresh after the current session changed.
    fn follow_current_session(&mut self) {
        self.state.forget_seen();
        match self.client.current_session() {
            Some(session) => self.refresh.start(
                self.client.api().clone(),
                session,
                self.client.nodes().to_vec(),
                self.event_sender.clone(),
            ),
            None => self.refresh.stop(),
        }
    }

    /// Reports a line that did not parse as a command.
    pub fn reject(&mut self, err: &CommandError) -> String {
        self.notice(NoticeKind::Error, err.to_string())
    }

    fn notice(&mut self, kind: NoticeKind, text: impl Into<String>) -> String {
        console::notice(&self.state.push_notice(kind, text))
    }

    fn error(&mut self, err: ClientError) -> String {
        log::debug!("Command failed: {err}");
        self.notice(NoticeKind::Error, err.to_string())
    }
}
