pub mod commands;
pub mod events;
pub mod types;

pub use commands::{ClientCommand, CommandError};
pub use events::ClientEvent;
pub use types::{Message, MessageType, NodeEndpoint, NodeStatus, Session};
