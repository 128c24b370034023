use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use duochat_shared::{ChatId, MessageId, UserId};

use crate::database::{format_ts, parse_ts, Database};
use crate::error::{Result, StoreError};
use crate::models::{Message, MessageKind, NewMessage};
use crate::query::{Direction, MessageQuery};

impl Database {
    /// Append a message to an existing chat, stamped with `now`.
    pub fn insert_message(
        &self,
        chat_id: &ChatId,
        message: &NewMessage,
        now: DateTime<Utc>,
    ) -> Result<Message> {
        let chat_exists: Option<String> = self
            .conn()
            .query_row(
                "SELECT id FROM chats WHERE id = ?1",
                params![chat_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if chat_exists.is_none() {
            return Err(StoreError::NotFound);
        }

        let id = MessageId::new(Uuid::new_v4().to_string());
        let kind = message.kind();

        self.conn().execute(
            "INSERT INTO messages (id, chat_id, text, image_url, sender_id, kind, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id.as_str(),
                chat_id.as_str(),
                message.text,
                message.image_url,
                message.sender_id.as_str(),
                kind.as_str(),
                format_ts(now),
            ],
        )?;

        Ok(Message {
            id,
            chat_id: chat_id.clone(),
            text: message.text.clone(),
            image_url: message.image_url.clone(),
            sender_id: message.sender_id.clone(),
            kind,
            created_at: Some(now),
        })
    }

    // ties on created_at fall back to insertion order
    pub fn query_messages(&self, query: &MessageQuery) -> Result<Vec<Message>> {
        let order = match query.direction {
            Direction::Ascending => "created_at ASC, rowid ASC",
            Direction::Descending => "created_at DESC, rowid DESC",
        };
        let limit = query.limit.map(i64::from).unwrap_or(-1);

        let mut stmt = self.conn().prepare(&format!(
            "SELECT id, chat_id, text, image_url, sender_id, kind, created_at
             FROM messages
             WHERE chat_id = ?1
             ORDER BY {order}
             LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![query.chat_id.as_str(), limit], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    pub fn get_message(&self, chat_id: &ChatId, id: &MessageId) -> Result<Message> {
        self.conn()
            .query_row(
                "SELECT id, chat_id, text, image_url, sender_id, kind, created_at
                 FROM messages WHERE chat_id = ?1 AND id = ?2",
                params![chat_id.as_str(), id.as_str()],
                row_to_message,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Returns `true` if a row was deleted.
    pub fn delete_message(&self, chat_id: &ChatId, id: &MessageId) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM messages WHERE chat_id = ?1 AND id = ?2",
            params![chat_id.as_str(), id.as_str()],
        )?;
        Ok(affected > 0)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id: String = row.get(0)?;
    let chat_id: String = row.get(1)?;
    let text: String = row.get(2)?;
    let image_url: Option<String> = row.get(3)?;
    let sender_id: String = row.get(4)?;
    let kind_str: String = row.get(5)?;
    let created_at = parse_ts(6, row.get(6)?)?;

    let kind = MessageKind::parse(&kind_str)
        .unwrap_or_else(|| MessageKind::for_image(image_url.as_deref()));

    Ok(Message {
        id: MessageId::new(id),
        chat_id: ChatId::new(chat_id),
        text,
        image_url,
        sender_id: UserId::new(sender_id),
        kind,
        created_at,
    })
}
