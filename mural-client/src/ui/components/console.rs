use crate::client::SessionBook;
use crate::ui::state::{Notice, NoticeKind};

pub fn prompt(sessions: &SessionBook) -> String {
    match sessions.current() {
        Some(session) => format!("[{}@{}]> ", session.username, session.node_id),
        None => "[visitor]> ".to_string(),
    }
}

pub fn notice(notice: &Notice) -> String {
    let tag = match notice.kind {
        NoticeKind::Success => "ok",
        NoticeKind::Info => "info",
        NoticeKind::Error => "error",
    };
    format!("{} [{tag}] {}", notice.timestamp.format("%H:%M:%S"), notice.text)
}

pub fn help() -> &'static str {
    "Commands:
  login <user> <password> <port>   log in on a node
  logout [port]                    close a session (default: current)
  logoutall                        close every session
  switch [port]                    change the current session, or list them
  post <text>                      post a public message
  postpv <text>                    post a private message
  read [port]                      read a node (default: current session)
  readpub <port>                   read a node's public messages as a visitor
  status                           show every node's status
  users                            show who is online
  simulate                         toggle failure simulation on the current node
  help                             show this help
  quit | exit                      log out everywhere and leave"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{NodeEndpoint, Session};

    #[test]
    fn prompt_shows_current_session_or_visitor() {
        let mut sessions = SessionBook::new();
        assert_eq!(prompt(&sessions), "[visitor]> ");
        sessions.insert(Session {
            username: "admin".into(),
            token: "t".into(),
            node_id: "Node1".into(),
            endpoint: NodeEndpoint::from_tcp_port("localhost", 8001).unwrap(),
        });
        assert_eq!(prompt(&sessions), "[admin@Node1]> ");
    }

    #[test]
    fn help_lists_every_command() {
        for command in ["login", "logoutall", "switch", "postpv", "readpub", "simulate", "quit"] {
            assert!(help().contains(command), "{command}");
        }
    }
}
