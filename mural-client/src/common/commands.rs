use thiserror::Error;

use super::types::MessageType;

/// Commands typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Login {
        username: String,
        password: String,
        port: u16,
    },
    /// Without a port, logs out of the current session.
    Logout { port: Option<u16> },
    LogoutAll,
    /// Without a port, lists the open sessions.
    Switch { port: Option<u16> },
    Post {
        content: String,
        message_type: MessageType,
    },
    /// Without a port, reads the current session's node.
    Read { port: Option<u16> },
    /// Visitor read: never sends a token.
    ReadPublic { port: u16 },
    Status,
    Users,
    Simulate,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command: {0}. Type 'help' for the list of commands")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("port must be a number, got `{0}`")]
    InvalidPort(String),
}

impl ClientCommand {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let command = match name.to_lowercase().as_str() {
            "login" => match args.as_slice() {
                [username, password, port] => ClientCommand::Login {
                    username: username.to_string(),
                    password: password.to_string(),
                    port: parse_port(port)?,
                },
                _ => return Err(CommandError::Usage("login <user> <password> <port>")),
            },
            "logout" => ClientCommand::Logout {
                port: optional_port(&args)?,
            },
            "logoutall" => ClientCommand::LogoutAll,
            "switch" => ClientCommand::Switch {
                port: optional_port(&args)?,
            },
            "post" | "postpv" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage("post <message> | postpv <message>"));
                }
                ClientCommand::Post {
                    content: rest.to_string(),
                    message_type: if name.eq_ignore_ascii_case("postpv") {
                        MessageType::Private
                    } else {
                        MessageType::Public
                    },
                }
            }
            "read" => ClientCommand::Read {
                port: optional_port(&args)?,
            },
            "readpub" => match args.as_slice() {
                [port] => ClientCommand::ReadPublic {
                    port: parse_port(port)?,
                },
                _ => return Err(CommandError::Usage("readpub <port>")),
            },
            "status" => ClientCommand::Status,
            "users" => ClientCommand::Users,
            "simulate" => ClientCommand::Simulate,
            "help" => ClientCommand::Help,
            "quit" | "exit" => ClientCommand::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }
}

fn parse_port(raw: &str) -> Result<u16, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::InvalidPort(raw.to_string()))
}

fn optional_port(args: &[&str]) -> Result<Option<u16>, CommandError> {
    args.first().map(|raw| parse_port(raw)).transpose()
}
