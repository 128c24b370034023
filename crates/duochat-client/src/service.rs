//! Mutation operations on chats and messages.
//!
//! Every write goes to the document store; nothing here touches UI state.
//! Callers see the effect once the live subscriptions re-deliver.
//!
//! The two multi-step writes are not transactional. `send_message` appends
//! the message and then rewrites the chat summary; `delete_message` removes
//! the message and then recomputes the summary from whatever is newest. A
//! concurrent writer can leave `last_message` briefly stale until the next
//! send or delete.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use duochat_shared::constants::IMAGE_SENT_PREVIEW;
use duochat_shared::paths::{chat_image_path, chat_image_path_from_url, is_image_file};
use duochat_shared::{ChatId, UserId};
use duochat_store::{
    canonical_pair, Chat, ChatPatch, ChatQuery, DocumentStore, FileStore, Message, MessageQuery,
    NewChat, NewMessage, ServerTime, UserProfile,
};

use crate::error::{ChatError, Result};

/// Result of [`ChatService::create_or_reuse_chat`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRef {
    pub chat_id: ChatId,
    pub is_new: bool,
}

/// A message as composed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub text: String,
    pub image_url: Option<String>,
    pub sender_id: UserId,
}

impl MessageDraft {
    pub fn text(sender_id: impl Into<UserId>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image_url: None,
            sender_id: sender_id.into(),
        }
    }

    pub fn image(sender_id: impl Into<UserId>, image_url: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            image_url: Some(image_url.into()),
            sender_id: sender_id.into(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Normalise into the stored shape, or `None` when there is nothing to
    /// send. Whitespace-only text counts as no text.
    fn into_new_message(self) -> Option<NewMessage> {
        let text = self.text.trim().to_string();
        let image_url = self.image_url.filter(|url| !url.is_empty());
        if text.is_empty() && image_url.is_none() {
            return None;
        }
        Some(NewMessage {
            text,
            image_url,
            sender_id: self.sender_id,
        })
    }
}

/// An uploaded chat image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub url: String,
    pub path: String,
}

#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn DocumentStore>,
    files: Arc<dyn FileStore>,
}

impl ChatService {
    pub fn new(store: Arc<dyn DocumentStore>, files: Arc<dyn FileStore>) -> Self {
        Self { store, files }
    }

    /// Find the chat between `a` and `b`, creating it if there is none.
    ///
    /// Search-then-create: two concurrent first calls for the same pair can
    /// each miss the other's chat and create a duplicate.
    pub async fn create_or_reuse_chat(&self, a: &UserId, b: &UserId) -> Result<ChatRef> {
        if a == b {
            return Err(ChatError::SameParticipant);
        }

        let pair = canonical_pair(a, b);
        let existing = self.store.query_chats(&ChatQuery::participants(pair)).await?;
        if let Some(chat) = existing.into_iter().next() {
            debug!(chat = %chat.id, "reusing existing chat");
            return Ok(ChatRef {
                chat_id: chat.id,
                is_new: false,
            });
        }

        let chat = self.store.create_chat(NewChat::between(a, b)).await?;
        info!(chat = %chat.id, a = %a.short(), b = %b.short(), "created chat");
        Ok(ChatRef {
            chat_id: chat.id,
            is_new: true,
        })
    }

    pub async fn get_chat_details(&self, chat_id: &ChatId) -> Result<Chat> {
        self.store
            .get_chat(chat_id)
            .await?
            .ok_or(ChatError::ChatNotFound)
    }

    /// Append a message and update the chat summary: `last_message`,
    /// `updated_at`, and `unread_for` set to every participant but the
    /// sender. An empty draft is rejected without writing anything.
    pub async fn send_message(&self, chat_id: &ChatId, draft: MessageDraft) -> Result<Message> {
        let new = draft.into_new_message().ok_or(ChatError::EmptyMessage)?;
        let summary = if new.text.is_empty() {
            IMAGE_SENT_PREVIEW.to_string()
        } else {
            new.text.clone()
        };

        let message = self.store.add_message(chat_id, new).await?;

        let Some(chat) = self.store.get_chat(chat_id).await? else {
            warn!(chat = %chat_id, message = %message.id, "chat vanished after send, summary not updated");
            return Ok(message);
        };
        let recipients: Vec<UserId> = chat
            .participants
            .into_iter()
            .filter(|id| *id != message.sender_id)
            .collect();

        let patch = ChatPatch::default()
            .last_message(summary)
            .updated_at(ServerTime::Now)
            .unread_for(recipients);
        self.store.update_chat(chat_id, patch).await?;

        debug!(chat = %chat_id, message = %message.id, kind = message.kind.as_str(), "message sent");
        Ok(message)
    }

    /// Remove `user` from the chat's unread set. Missing chats and users who
    /// have nothing unread are left alone.
    pub async fn mark_chat_read(&self, chat_id: &ChatId, user: &UserId) -> Result<()> {
        let Some(chat) = self.store.get_chat(chat_id).await? else {
            debug!(chat = %chat_id, "mark read on missing chat");
            return Ok(());
        };
        if !chat.is_unread_for(user) {
            return Ok(());
        }

        let unread: Vec<UserId> = chat.unread_for.into_iter().filter(|id| id != user).collect();
        self.store
            .update_chat(chat_id, ChatPatch::default().unread_for(unread))
            .await?;
        Ok(())
    }

    /// Delete `message`, then its stored image if it had one, then recompute
    /// the chat summary from the newest remaining message.
    ///
    /// Image cleanup is best effort: a failure is logged and the delete still
    /// succeeds.
    pub async fn delete_message(&self, chat_id: &ChatId, message: &Message) -> Result<()> {
        self.store.delete_message(chat_id, &message.id).await?;

        if let Some(url) = message.image_url.as_deref() {
            self.remove_image(chat_id, url).await;
        }

        let latest = self.store.query_messages(&MessageQuery::latest(chat_id.clone())).await?;
        let patch = match latest.first() {
            None => ChatPatch::default()
                .last_message("")
                .updated_at(ServerTime::Now),
            Some(newest) => ChatPatch::default()
                .last_message(newest.summary_text())
                .updated_at(newest.created_at.map_or(ServerTime::Now, ServerTime::At)),
        };
        self.store.update_chat(chat_id, patch).await?;

        debug!(chat = %chat_id, message = %message.id, "message deleted");
        Ok(())
    }

    async fn remove_image(&self, chat_id: &ChatId, url: &str) {
        let Some(path) = chat_image_path_from_url(chat_id, url) else {
            warn!(chat = %chat_id, url, "image url does not map to a storage path, skipping cleanup");
            return;
        };
        if let Err(e) = self.files.delete(&path).await {
            warn!(chat = %chat_id, path = %path, error = %e, "failed to delete chat image");
        }
    }

    /// Case-insensitive substring search over usernames and emails, skipping
    /// `exclude`. Scans every profile.
    pub async fn search_users(&self, term: &str, exclude: &UserId) -> Result<Vec<UserProfile>> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let users = self.store.list_users().await?;
        Ok(users
            .into_iter()
            .filter(|user| user.uid != *exclude)
            .filter(|user| {
                user.username
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
                    || user.email.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// Store an image for `chat_id` under the chat image convention.
    pub async fn upload_chat_image(
        &self,
        chat_id: &ChatId,
        file_name: &str,
        data: &[u8],
    ) -> Result<UploadedImage> {
        if !is_image_file(file_name) {
            return Err(ChatError::NotAnImage(file_name.to_string()));
        }
        let path = chat_image_path(chat_id, file_name, Utc::now());
        let url = self.files.upload(&path, data).await?;
        debug!(chat = %chat_id, path = %path, size = data.len(), "chat image uploaded");
        Ok(UploadedImage { url, path })
    }

    /// Upload an image and send it as a message, with optional caption.
    pub async fn send_image(
        &self,
        chat_id: &ChatId,
        sender: &UserId,
        file_name: &str,
        data: &[u8],
        caption: &str,
    ) -> Result<Message> {
        let uploaded = self.upload_chat_image(chat_id, file_name, data).await?;
        let draft = MessageDraft::image(sender.clone(), uploaded.url).with_text(caption);
        self.send_message(chat_id, draft).await
    }
}
