//! Profile edits made by the signed-in user.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use duochat_shared::constants::MAX_PROFILE_PHOTO_BYTES;
use duochat_shared::paths::{is_image_file, profile_photo_path};
use duochat_shared::UserId;
use duochat_store::{DocumentStore, FileStore, ProfilePatch, ProfileSource, StoreError, UserProfile};

use crate::error::{ChatError, Result};

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
    profiles: Arc<dyn ProfileSource>,
    files: Arc<dyn FileStore>,
}

impl ProfileService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        profiles: Arc<dyn ProfileSource>,
        files: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            store,
            profiles,
            files,
        }
    }

    pub async fn get_profile(&self, user: &UserId) -> Result<UserProfile> {
        self.profiles
            .get_profile(user)
            .await?
            .ok_or(ChatError::UserNotFound)
    }

    /// Set the username, trimmed. Returns the stored value.
    pub async fn update_username(&self, user: &UserId, username: &str) -> Result<String> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ChatError::EmptyUsername);
        }

        let patch = ProfilePatch {
            username: Some(username.to_string()),
            ..ProfilePatch::default()
        };
        self.store.update_user(user, patch).await.map_err(not_found_as_user)?;

        info!(user = %user.short(), "username updated");
        Ok(username.to_string())
    }

    /// Upload a new profile photo and point the profile at it. Returns the
    /// photo URL.
    pub async fn update_profile_photo(
        &self,
        user: &UserId,
        file_name: &str,
        data: &[u8],
    ) -> Result<String> {
        if !is_image_file(file_name) {
            return Err(ChatError::NotAnImage(file_name.to_string()));
        }
        if data.len() > MAX_PROFILE_PHOTO_BYTES {
            return Err(ChatError::ImageTooLarge {
                size: data.len(),
                max: MAX_PROFILE_PHOTO_BYTES,
            });
        }

        let path = profile_photo_path(user, file_name, Utc::now());
        let url = self.files.upload(&path, data).await?;

        let patch = ProfilePatch {
            profile_photo_url: Some(url.clone()),
            ..ProfilePatch::default()
        };
        self.store.update_user(user, patch).await.map_err(not_found_as_user)?;

        info!(user = %user.short(), path = %path, "profile photo updated");
        Ok(url)
    }
}

fn not_found_as_user(e: StoreError) -> ChatError {
    match e {
        StoreError::NotFound => ChatError::UserNotFound,
        other => ChatError::Store(other),
    }
}
