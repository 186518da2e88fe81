use crate::client::SessionBook;
use crate::status::{HealthChange, NodeCard, NodeHealth, OnlineUser, Summary};

fn icon(health: NodeHealth) -> &'static str {
    match health {
        NodeHealth::Active => "[+]",
        NodeHealth::SimulatingFailure => "[!]",
        NodeHealth::Inactive => "[-]",
        NodeHealth::Disconnected => "[x]",
    }
}

pub fn render_cards(cards: &[NodeCard]) -> String {
    cards
        .iter()
        .map(|card| {
            let user = card.user.as_deref().unwrap_or("none");
            let mut markers = String::new();
            if card.your_login {
                markers.push_str(" (your login)");
            }
            if card.current_session {
                markers.push_str(" <- current session");
            }
            let mut text = format!(
                "{} {} (:{}) - {}\n    User: {user}{markers}",
                icon(card.health),
                card.node_id,
                card.port,
                card.health
            );
            if let Some(error) = &card.error {
                text.push_str(&format!("\n    Error: {error}"));
            }
            text
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_summary(summary: &Summary, sessions: &SessionBook) -> String {
    let mut out = format!(
        "Summary: {} active, {} simulating failure, {} inactive, {} disconnected\nYour sessions: {}",
        summary.active,
        summary.simulating_failure,
        summary.inactive,
        summary.disconnected,
        sessions.len()
    );
    if let Some(current) = sessions.current() {
        out.push_str(&format!(
            "\nCurrent session: {} @ {}",
            current.username, current.node_id
        ));
    }
    out
}

pub fn render_roster(users: &[OnlineUser]) -> String {
    if users.is_empty() {
        return "No users online".to_string();
    }
    let lines: Vec<String> = users
        .iter()
        .map(|user| {
            let you = if user.is_current_viewer { " (you)" } else { "" };
            format!("* {}{you} @ {} (:{})", user.username, user.node_id, user.port)
        })
        .collect();
    format!("Online users ({}):\n{}", users.len(), lines.join("\n"))
}

/// Lists open sessions for `switch` without a port.
pub fn render_sessions(sessions: &SessionBook) -> String {
    if sessions.is_empty() {
        return "No open sessions".to_string();
    }
    let current = sessions.current().map(|session| session.port());
    sessions
        .iter()
        .map(|session| {
            let marker = if current == Some(session.port()) {
                " <- current"
            } else {
                ""
            };
            format!(
                "{} @ {} (port {}){marker}",
                session.username,
                session.node_id,
                session.port()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_change(change: &HealthChange) -> String {
    format!(
        "{} (:{}) is now {} (was {})",
        change.node_id, change.port, change.to, change.from
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_card_shows_error() {
        let card = NodeCard {
            node_id: "Node2".into(),
            port: 8002,
            health: NodeHealth::Disconnected,
            user: None,
            your_login: false,
            current_session: false,
            error: Some("could not reach".into()),
        };
        let text = render_cards(&[card]);
        assert!(text.starts_with("[x] Node2 (:8002) - Disconnected"));
        assert!(text.contains("User: none"));
        assert!(text.contains("Error: could not reach"));
    }

    #[test]
    fn roster_marks_viewer() {
        let users = vec![OnlineUser {
            username: "admin".into(),
            node_id: "Node1".into(),
            port: 8001,
            is_current_viewer: true,
        }];
        assert!(render_roster(&users).contains("* admin (you) @ Node1 (:8001)"));
        assert_eq!(render_roster(&[]), "No users online");
    }
}
