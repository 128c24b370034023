//! CRUD operations for [`UserProfile`] records.

use rusqlite::{params, OptionalExtension};

use duochat_shared::UserId;

use crate::database::{format_ts, parse_ts, Database};
use crate::error::{Result, StoreError};
use crate::models::{ProfilePatch, UserProfile};

impl Database {
    /// Insert or replace a profile.
    pub fn upsert_user(&self, profile: &UserProfile) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO users (uid, username, email, display_name, profile_photo_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                profile.uid.as_str(),
                profile.username,
                profile.email,
                profile.display_name,
                profile.profile_photo_url,
                profile.created_at.map(format_ts),
            ],
        )?;
        Ok(())
    }

    pub fn find_user(&self, uid: &UserId) -> Result<Option<UserProfile>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT uid, username, email, display_name, profile_photo_url, created_at
                 FROM users WHERE uid = ?1",
                params![uid.as_str()],
                row_to_user,
            )
            .optional()?)
    }

    pub fn list_users(&self) -> Result<Vec<UserProfile>> {
        let mut stmt = self.conn().prepare(
            "SELECT uid, username, email, display_name, profile_photo_url, created_at
             FROM users
             ORDER BY uid ASC",
        )?;

        let rows = stmt.query_map([], row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    pub fn update_user(&self, uid: &UserId, patch: &ProfilePatch) -> Result<()> {
        let tx = self.conn().unchecked_transaction()?;
        let mut affected = 0;

        if let Some(ref username) = patch.username {
            affected += tx.execute(
                "UPDATE users SET username = ?1 WHERE uid = ?2",
                params![username, uid.as_str()],
            )?;
        }
        if let Some(ref url) = patch.profile_photo_url {
            affected += tx.execute(
                "UPDATE users SET profile_photo_url = ?1 WHERE uid = ?2",
                params![url, uid.as_str()],
            )?;
        }

        if affected == 0 && user_missing(&tx, uid)? {
            return Err(StoreError::NotFound);
        }
        tx.commit()?;
        Ok(())
    }
}

fn user_missing(conn: &rusqlite::Connection, uid: &UserId) -> Result<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT uid FROM users WHERE uid = ?1",
            params![uid.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_none())
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        uid: UserId::new(row.get::<_, String>(0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        display_name: row.get(3)?,
        profile_photo_url: row.get(4)?,
        created_at: parse_ts(5, row.get(5)?)?,
    })
}
