//! Client configuration loaded from environment variables.
//!
//! Every setting has a default, so a client starts with zero configuration
//! and keeps its data in the platform data directory.

use std::path::PathBuf;

use duochat_shared::constants::DEFAULT_MAX_UPLOAD_BYTES;

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// SQLite document database.
    /// Env: `DUOCHAT_DB_PATH`
    /// Default: `{data_dir}/duochat.db`
    pub db_path: PathBuf,

    /// Directory holding uploaded files.
    /// Env: `DUOCHAT_FILES_PATH`
    /// Default: `{data_dir}/files`
    pub files_path: PathBuf,

    /// Prefix of download URLs handed out by the file store.
    /// Env: `DUOCHAT_FILES_BASE_URL`
    /// Default: `file://{files_path}`
    pub files_base_url: String,

    /// Largest accepted upload in bytes.
    /// Env: `DUOCHAT_MAX_UPLOAD_BYTES`
    /// Default: 10 MiB
    pub max_upload_bytes: usize,

    /// Whether to build the directory index when opening the store. When
    /// off, the chat list runs in fallback mode until the index exists.
    /// Env: `DUOCHAT_DIRECTORY_INDEX` (true/false)
    /// Default: `true`
    pub directory_index: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let data_dir = duochat_store::default_db_path()
            .ok()
            .and_then(|path| path.parent().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("./duochat-data"));
        Self::in_dir(data_dir)
    }
}

impl ClientConfig {
    /// Defaults rooted at `data_dir`.
    pub fn in_dir(data_dir: PathBuf) -> Self {
        let files_path = data_dir.join("files");
        Self {
            db_path: data_dir.join("duochat.db"),
            files_base_url: format!("file://{}", files_path.display()),
            files_path,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            directory_index: true,
        }
    }

    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = var("DUOCHAT_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Some(path) = var("DUOCHAT_FILES_PATH") {
            config.files_path = PathBuf::from(path);
            config.files_base_url = format!("file://{}", config.files_path.display());
        }

        if let Some(url) = var("DUOCHAT_FILES_BASE_URL") {
            if !url.is_empty() {
                config.files_base_url = url;
            }
        }

        if let Some(val) = var("DUOCHAT_MAX_UPLOAD_BYTES") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.max_upload_bytes = n,
                _ => {
                    tracing::warn!(value = %val, "Invalid DUOCHAT_MAX_UPLOAD_BYTES, using default");
                }
            }
        }

        if let Some(val) = var("DUOCHAT_DIRECTORY_INDEX") {
            config.directory_index = val != "false" && val != "0";
        }

        // RUST_LOG is read by tracing-subscriber's EnvFilter directly.

        config
    }
}
