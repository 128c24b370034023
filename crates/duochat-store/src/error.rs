use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (database directory, file store).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The addressed document does not exist.
    #[error("Record not found")]
    NotFound,

    /// The query needs an index that does not exist yet or is still building.
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A list-valued column could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Upload rejected because it carries no bytes.
    #[error("Empty file")]
    EmptyFile,

    /// Upload rejected because it exceeds the configured maximum.
    #[error("File too large: {size} bytes (max {max})")]
    FileTooLarge { size: usize, max: usize },

    /// A storage path tried to escape the file store's base directory.
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    /// The backing service failed in a way the store cannot classify.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether this is the "index missing or still building" condition.
    pub fn is_failed_precondition(&self) -> bool {
        matches!(self, StoreError::FailedPrecondition(_))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
