//! Contracts for the backing services consumed by the chat core.
//!
//! The core never talks to a concrete backend. It holds `Arc<dyn ...>`
//! handles to these traits, so the SQLite backend in this crate and the
//! scripted stores used in tests are interchangeable.

use async_trait::async_trait;

use duochat_shared::{ChatId, MessageId, UserId};

use crate::error::Result;
use crate::models::{Chat, ChatPatch, Message, NewChat, NewMessage, ProfilePatch, UserProfile};
use crate::query::{ChatQuery, MessageQuery};
use crate::subscription::Subscription;

/// Document database holding users, chats and per-chat messages.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a chat; the store assigns its id and both timestamps.
    async fn create_chat(&self, chat: NewChat) -> Result<Chat>;

    async fn get_chat(&self, id: &ChatId) -> Result<Option<Chat>>;

    /// One-shot read of a chat query.
    async fn query_chats(&self, query: &ChatQuery) -> Result<Vec<Chat>>;

    /// Apply a partial update. Fails with `NotFound` if the chat is gone.
    async fn update_chat(&self, id: &ChatId, patch: ChatPatch) -> Result<()>;

    /// Append a message; the store assigns its id and `createdAt`.
    async fn add_message(&self, chat_id: &ChatId, message: NewMessage) -> Result<Message>;

    /// Remove a message. Removing a message that is already gone succeeds.
    async fn delete_message(&self, chat_id: &ChatId, id: &MessageId) -> Result<()>;

    async fn query_messages(&self, query: &MessageQuery) -> Result<Vec<Message>>;

    /// Every user profile. A full scan, only viable for small user bases.
    async fn list_users(&self) -> Result<Vec<UserProfile>>;

    async fn update_user(&self, id: &UserId, patch: ProfilePatch) -> Result<()>;

    /// Live chat query. Errors, including a missing index, arrive through the
    /// subscription rather than from this call.
    fn watch_chats(&self, query: ChatQuery) -> Subscription<Chat>;

    /// Live message query.
    fn watch_messages(&self, query: MessageQuery) -> Subscription<Message>;
}

/// Read access to user profiles.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn get_profile(&self, id: &UserId) -> Result<Option<UserProfile>>;
}

/// Blob storage for uploaded images.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store `data` at `path` and return its download URL.
    async fn upload(&self, path: &str, data: &[u8]) -> Result<String>;

    async fn delete(&self, path: &str) -> Result<()>;

    fn url_for(&self, path: &str) -> String;
}
