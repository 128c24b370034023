//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation. Timestamps are stored as
//! fixed-width RFC 3339 text (microseconds, `Z` suffix) so that SQL ordering
//! on the text column matches chronological ordering.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection};

use crate::error::{Result, StoreError};
use crate::migrations;

/// Name of the composite index the ordered directory query depends on.
pub const DIRECTORY_INDEX: &str = "idx_chats_updated_at";

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    /// Open a private in-memory database. Used by tests and throwaway sessions.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn
            .path()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }

    pub fn index_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Build the composite index needed by the ordered directory query.
    ///
    /// Until this has run, ordered member queries fail with
    /// [`StoreError::FailedPrecondition`].
    pub fn create_directory_index(&self) -> Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE INDEX IF NOT EXISTS {DIRECTORY_INDEX} ON chats(updated_at DESC);"
        ))?;
        tracing::info!(index = DIRECTORY_INDEX, "directory index ready");
        Ok(())
    }

    pub fn drop_directory_index(&self) -> Result<()> {
        self.conn
            .execute_batch(&format!("DROP INDEX IF EXISTS {DIRECTORY_INDEX};"))?;
        Ok(())
    }
}

/// Default database location inside the platform data directory:
/// - Linux:   `~/.local/share/duochat/duochat.db`
/// - macOS:   `~/Library/Application Support/com.duochat.duochat/duochat.db`
/// - Windows: `{FOLDERID_RoamingAppData}\duochat\duochat\data\duochat.db`
pub fn default_db_path() -> Result<PathBuf> {
    let project_dirs =
        ProjectDirs::from("com", "duochat", "duochat").ok_or(StoreError::NoDataDir)?;
    Ok(project_dirs.data_dir().join("duochat.db"))
}

pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(
    idx: usize,
    value: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        idx,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })
        })
        .transpose()
}
