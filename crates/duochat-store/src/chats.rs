//! CRUD operations for [`Chat`] records.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use duochat_shared::{ChatId, UserId};

use crate::database::{format_ts, parse_ts, Database, DIRECTORY_INDEX};
use crate::error::{Result, StoreError};
use crate::models::{Chat, ChatPatch, NewChat};
use crate::query::{ChatFilter, ChatQuery, Direction};

const CHAT_COLUMNS: &str = "c.id, c.participants, c.last_message, c.updated_at, c.created_at, c.unread_for";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new chat and its membership rows.
    pub fn insert_chat(&self, chat: &NewChat, now: DateTime<Utc>) -> Result<Chat> {
        let id = ChatId::new(Uuid::new_v4().to_string());
        let ts = format_ts(now);

        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO chats (id, participants, last_message, updated_at, created_at, unread_for)
             VALUES (?1, ?2, ?3, ?4, ?5, '[]')",
            params![
                id.as_str(),
                serde_json::to_string(&chat.participants)?,
                chat.last_message,
                ts,
                ts,
            ],
        )?;
        for member in &chat.participants {
            tx.execute(
                "INSERT OR IGNORE INTO chat_members (chat_id, user_id) VALUES (?1, ?2)",
                params![id.as_str(), member.as_str()],
            )?;
        }
        tx.commit()?;

        Ok(Chat {
            id,
            participants: chat.participants.clone(),
            last_message: chat.last_message.clone(),
            updated_at: Some(now),
            created_at: Some(now),
            unread_for: Vec::new(),
            other_user: None,
        })
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn find_chat(&self, id: &ChatId) -> Result<Option<Chat>> {
        let row = self
            .conn()
            .query_row(
                &format!("SELECT {CHAT_COLUMNS} FROM chats c WHERE c.id = ?1"),
                params![id.as_str()],
                row_to_raw_chat,
            )
            .optional()?;
        row.map(RawChat::decode).transpose()
    }

    /// Run a chat query.
    ///
    /// An ordered member query fails with [`StoreError::FailedPrecondition`]
    /// while the directory index is missing. Unordered results come back in
    /// id order, which carries no meaning.
    pub fn query_chats(&self, query: &ChatQuery) -> Result<Vec<Chat>> {
        let order = match query.order_by_updated {
            Some(Direction::Descending) => "c.updated_at DESC, c.id ASC",
            Some(Direction::Ascending) => "c.updated_at ASC, c.id ASC",
            None => "c.id ASC",
        };

        let (sql, arg) = match &query.filter {
            ChatFilter::Member(user) => {
                if query.is_ordered() && !self.index_exists(DIRECTORY_INDEX)? {
                    return Err(StoreError::FailedPrecondition(format!(
                        "query requires index {DIRECTORY_INDEX}"
                    )));
                }
                (
                    format!(
                        "SELECT {CHAT_COLUMNS} FROM chats c
                         JOIN chat_members m ON m.chat_id = c.id
                         WHERE m.user_id = ?1
                         ORDER BY {order}"
                    ),
                    user.as_str().to_string(),
                )
            }
            ChatFilter::Participants(participants) => (
                format!(
                    "SELECT {CHAT_COLUMNS} FROM chats c
                     WHERE c.participants = ?1
                     ORDER BY {order}"
                ),
                serde_json::to_string(participants)?,
            ),
        };

        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![arg], row_to_raw_chat)?;

        let mut chats = Vec::new();
        for row in rows {
            chats.push(row?.decode()?);
        }
        Ok(chats)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply a partial update. Fails with [`StoreError::NotFound`] when the
    /// chat does not exist.
    pub fn update_chat(&self, id: &ChatId, patch: &ChatPatch, now: DateTime<Utc>) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;

        let exists: Option<String> = tx
            .query_row(
                "SELECT id FROM chats WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StoreError::NotFound);
        }

        if let Some(ref text) = patch.last_message {
            tx.execute(
                "UPDATE chats SET last_message = ?1 WHERE id = ?2",
                params![text, id.as_str()],
            )?;
        }
        if let Some(at) = patch.updated_at {
            tx.execute(
                "UPDATE chats SET updated_at = ?1 WHERE id = ?2",
                params![format_ts(at.resolve(now)), id.as_str()],
            )?;
        }
        if let Some(ref unread) = patch.unread_for {
            tx.execute(
                "UPDATE chats SET unread_for = ?1 WHERE id = ?2",
                params![serde_json::to_string(unread)?, id.as_str()],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Row as read from SQLite, before the JSON columns are decoded.
struct RawChat {
    id: String,
    participants: String,
    last_message: String,
    updated_at: Option<DateTime<Utc>>,
    created_at: Option<DateTime<Utc>>,
    unread_for: String,
}

impl RawChat {
    fn decode(self) -> Result<Chat> {
        let participants: Vec<UserId> = serde_json::from_str(&self.participants)?;
        let unread_for: Vec<UserId> = serde_json::from_str(&self.unread_for)?;
        Ok(Chat {
            id: ChatId::new(self.id),
            participants,
            last_message: self.last_message,
            updated_at: self.updated_at,
            created_at: self.created_at,
            unread_for,
            other_user: None,
        })
    }
}

fn row_to_raw_chat(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawChat> {
    Ok(RawChat {
        id: row.get(0)?,
        participants: row.get(1)?,
        last_message: row.get(2)?,
        updated_at: parse_ts(3, row.get(3)?)?,
        created_at: parse_ts(4, row.get(4)?)?,
        unread_for: row.get(5)?,
    })
}
