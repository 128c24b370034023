//! v001 -- Initial schema creation.
//!
//! Creates `users`, `chats`, `chat_members` and `messages`. The directory
//! index is not part of the schema; it is built on
//! demand by `Database::create_directory_index`.

use rusqlite::Connection;

const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users (profiles owned by the auth subsystem)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    uid               TEXT PRIMARY KEY NOT NULL,
    username          TEXT,
    email             TEXT NOT NULL DEFAULT '',
    display_name      TEXT,
    profile_photo_url TEXT,
    created_at        TEXT                      -- RFC-3339, UTC
);

-- ----------------------------------------------------------------
-- Chats
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS chats (
    id           TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    participants TEXT NOT NULL,                 -- JSON array, sorted
    last_message TEXT NOT NULL DEFAULT '',
    updated_at   TEXT,
    created_at   TEXT,
    unread_for   TEXT NOT NULL DEFAULT '[]'     -- JSON array
);

CREATE INDEX IF NOT EXISTS idx_chats_participants ON chats(participants);

-- membership rows back the "participants contain" filter
CREATE TABLE IF NOT EXISTS chat_members (
    chat_id TEXT NOT NULL,
    user_id TEXT NOT NULL,

    PRIMARY KEY (chat_id, user_id),
    FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_chat_members_user ON chat_members(user_id);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id         TEXT PRIMARY KEY NOT NULL,       -- UUID v4
    chat_id    TEXT NOT NULL,
    text       TEXT NOT NULL DEFAULT '',
    image_url  TEXT,
    sender_id  TEXT NOT NULL,
    kind       TEXT NOT NULL,                   -- 'text' | 'image'
    created_at TEXT,

    FOREIGN KEY (chat_id) REFERENCES chats(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_messages_chat_created
    ON messages(chat_id, created_at);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
