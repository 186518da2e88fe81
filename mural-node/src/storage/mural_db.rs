use rusqlite::{Connection, OptionalExtension, Result as SqlResult, Row, params};
use std::path::Path;

use crate::protocol::{Message, MessageType};

/// A node's message wall: de-duplicated by id, ordered by timestamp.
pub struct MuralDatabase {
    conn: Connection,
}

impl MuralDatabase {
    /// Wall that lives only as long as the node process
    pub fn in_memory() -> SqlResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wall persisted at a custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> SqlResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    fn from_connection(conn: Connection) -> SqlResult<Self> {
        let wall = Self { conn };
        wall.init_schema()?;
        Ok(wall)
    }

    fn init_schema(&self) -> SqlResult<()> {
        let conn = &self.conn;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                author TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp REAL NOT NULL,
                message_type TEXT NOT NULL DEFAULT 'public'
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_messages_timestamp ON messages(timestamp)",
            [],
        )?;

        Ok(())
    }

    /// Stores a message unless one with the same id is already on the wall.
    /// Returns whether the message was new.
    pub fn insert(&self, message: &Message) -> SqlResult<bool> {
        let conn = &self.conn;
        let changed = conn.execute(
            "INSERT OR IGNORE INTO messages (id, author, content, timestamp, message_type)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                message.id,
                message.author,
                message.content,
                message.timestamp,
                message.message_type.as_str()
            ],
        )?;
        Ok(changed > 0)
    }

    /// Merges a batch, returning how many messages were new.
    pub fn merge(&self, messages: &[Message]) -> SqlResult<usize> {
        let mut added = 0;
        for message in messages {
            if self.insert(message)? {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Every message, private ones included.
    pub fn all(&self) -> SqlResult<Vec<Message>> {
        self.query(
            "SELECT id, author, content, timestamp, message_type
             FROM messages
             ORDER BY timestamp ASC, id ASC",
        )
    }

    /// Messages visible to visitors.
    pub fn public(&self) -> SqlResult<Vec<Message>> {
        self.query(
            "SELECT id, author, content, timestamp, message_type
             FROM messages
             WHERE message_type = 'public'
             ORDER BY timestamp ASC, id ASC",
        )
    }

    pub fn get(&self, id: &str) -> SqlResult<Option<Message>> {
        let conn = &self.conn;
        conn.query_row(
            "SELECT id, author, content, timestamp, message_type FROM messages WHERE id = ?1",
            params![id],
            message_from_row,
        )
        .optional()
    }

    pub fn count(&self) -> SqlResult<usize> {
        let conn = &self.conn;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn query(&self, sql: &str) -> SqlResult<Vec<Message>> {
        let conn = &self.conn;
        let mut stmt = conn.prepare(sql)?;
        let messages = stmt
            .query_map([], message_from_row)?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(messages)
    }
}

fn message_from_row(row: &Row<'_>) -> SqlResult<Message> {
    let kind: String = row.get(4)?;
    Ok(Message {
        id: row.get(0)?,
        author: row.get(1)?,
        content: row.get(2)?,
        timestamp: row.get(3)?,
        message_type: MessageType::parse(&kind).unwrap_or_default(),
    })
}
