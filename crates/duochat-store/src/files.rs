//! On-disk [`FileStore`].
//!
//! Files live under a base directory at their storage path
//! (`chat-images/{chatId}/{timestamp}.{ext}` and so on). Download URLs are
//! `{base_url}/{path}`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use crate::document::FileStore;
use crate::error::{Result, StoreError};

/// Resolve a relative storage path under `base`, rejecting anything that
/// could land outside it.
fn ensure_within(base: &Path, path: &str) -> Result<PathBuf> {
    if path.is_empty() || path.contains('\\') {
        return Err(StoreError::InvalidPath(path.to_string()));
    }

    let mut resolved = base.to_path_buf();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(c) => resolved.push(c),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(StoreError::InvalidPath(path.to_string()));
            }
        }
    }
    if resolved == base {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(resolved)
}

#[derive(Debug, Clone)]
pub struct LocalFileStore {
    base_path: PathBuf,
    base_url: String,
    max_size: usize,
}

impl LocalFileStore {
    pub async fn new(base_path: PathBuf, base_url: impl Into<String>, max_size: usize) -> Result<Self> {
        fs::create_dir_all(&base_path).await?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        info!(path = %base_path.display(), url = %base_url, "file store initialized");

        Ok(Self {
            base_path,
            base_url,
            max_size,
        })
    }

    pub async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full = ensure_within(&self.base_path, path)?;
        if !fs::try_exists(&full).await? {
            return Err(StoreError::NotFound);
        }
        Ok(fs::read(&full).await?)
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn upload(&self, path: &str, data: &[u8]) -> Result<String> {
        if data.is_empty() {
            return Err(StoreError::EmptyFile);
        }
        if data.len() > self.max_size {
            return Err(StoreError::FileTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let full = ensure_within(&self.base_path, path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&full, data).await?;

        debug!(path, size = data.len(), "stored file");
        Ok(self.url_for(path))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full = ensure_within(&self.base_path, path)?;
        if !fs::try_exists(&full).await? {
            return Err(StoreError::NotFound);
        }
        fs::remove_file(&full).await?;

        debug!(path, "deleted file");
        Ok(())
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}
