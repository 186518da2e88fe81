use chrono::{DateTime, Local};

use crate::common::{Message, MessageType};

pub const EMPTY_WALL: &str = "No messages";

/// Renders a wall under `heading`, or the placeholder when it is empty.
pub fn render(heading: &str, messages: &[Message]) -> String {
    let mut out = format!("== {heading} ==\n");
    if messages.is_empty() {
        out.push_str(EMPTY_WALL);
        return out;
    }
    let lines: Vec<String> = messages.iter().map(format_message).collect();
    out.push_str(&lines.join("\n"));
    out
}

pub fn format_message(message: &Message) -> String {
    let visibility = match message.message_type {
        MessageType::Public => "",
        MessageType::Private => " [private]",
    };
    format!(
        "[{}] {}{}: {}",
        format_timestamp(message.timestamp),
        message.author,
        visibility,
        message.content
    )
}

fn format_timestamp(seconds: f64) -> String {
    DateTime::from_timestamp_micros((seconds * 1_000_000.0) as i64)
        .map(|utc| utc.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_wall_shows_placeholder() {
        let rendered = render("Node1", &[]);
        assert!(rendered.ends_with("No messages"));
    }

    #[test]
    fn private_messages_are_tagged() {
        let message = Message {
            id: Some("1".into()),
            author: "admin".into(),
            content: "secret".into(),
            timestamp: 1_700_000_000.25,
            message_type: MessageType::Private,
        };
        let line = format_message(&message);
        assert!(line.ends_with("admin [private]: secret"), "{line}");
        assert!(!render("Node1", &[message]).contains(EMPTY_WALL));
    }

    #[test]
    fn unrepresentable_timestamp_does_not_panic() {
        assert_eq!(format_timestamp(f64::MAX), "--:--:--");
    }
}
