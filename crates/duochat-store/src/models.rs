//! Documents held by the store, plus the write-side shapes used to create and
//! patch them.
//!
//! Every read model derives `Serialize`/`Deserialize` with camelCase field
//! names so it can be handed to the UI layer as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use duochat_shared::constants::IMAGE_PREVIEW;
use duochat_shared::display::{self, NameParts};
use duochat_shared::{ChatId, MessageId, UserId};

// ---------------------------------------------------------------------------
// User profile
// ---------------------------------------------------------------------------

/// Profile record owned by the authentication subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: UserId,
    pub username: Option<String>,
    pub email: String,
    /// Name reported by the identity provider, if any.
    pub display_name: Option<String>,
    pub profile_photo_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn new(uid: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            username: None,
            email: email.into(),
            display_name: None,
            profile_photo_url: None,
            created_at: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Label shown for this user in lists and headers.
    pub fn label(&self) -> String {
        display::display_name(&NameParts {
            username: self.username.as_deref(),
            email: Some(&self.email),
            display_name: self.display_name.as_deref(),
            uid: Some(self.uid.as_str()),
        })
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// A two-party conversation with its denormalized summary fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,
    /// Always stored sorted, so `(a, b)` and `(b, a)` name the same chat.
    pub participants: Vec<UserId>,
    pub last_message: String,
    /// `None` while a server timestamp is pending.
    pub updated_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unread_for: Vec<UserId>,
    /// Counterpart profile attached by the directory sync. Never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_user: Option<UserProfile>,
}

impl Chat {
    /// The participant that is not `me`.
    pub fn counterpart(&self, me: &UserId) -> Option<&UserId> {
        self.participants.iter().find(|id| *id != me)
    }

    pub fn is_unread_for(&self, user: &UserId) -> bool {
        self.unread_for.contains(user)
    }
}

/// Canonical participant sequence for a pair of users.
pub fn canonical_pair(a: &UserId, b: &UserId) -> Vec<UserId> {
    let mut pair = vec![a.clone(), b.clone()];
    pair.sort();
    pair
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
}

impl MessageKind {
    pub fn for_image(image_url: Option<&str>) -> Self {
        if image_url.is_some() {
            MessageKind::Image
        } else {
            MessageKind::Text
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(MessageKind::Text),
            "image" => Some(MessageKind::Image),
            _ => None,
        }
    }
}

/// A single message, owned by exactly one chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub text: String,
    pub image_url: Option<String>,
    pub sender_id: UserId,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Ordering key. `None` while a server timestamp is pending.
    pub created_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Text written to the chat summary when this becomes the latest message
    /// again after a delete.
    pub fn summary_text(&self) -> &str {
        if self.text.is_empty() {
            IMAGE_PREVIEW
        } else {
            &self.text
        }
    }
}

// ---------------------------------------------------------------------------
// Write-side shapes
// ---------------------------------------------------------------------------

/// Timestamp value on a write. `Now` is the sentinel asking the store to
/// stamp the document with its own clock at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerTime {
    Now,
    At(DateTime<Utc>),
}

impl ServerTime {
    pub fn resolve(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            ServerTime::Now => now,
            ServerTime::At(ts) => ts,
        }
    }
}

/// A chat to create. Both timestamps are always server-assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChat {
    pub participants: Vec<UserId>,
    pub last_message: String,
}

impl NewChat {
    pub fn between(a: &UserId, b: &UserId) -> Self {
        Self {
            participants: canonical_pair(a, b),
            last_message: String::new(),
        }
    }
}

/// A message to append. `createdAt` is always server-assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub text: String,
    pub image_url: Option<String>,
    pub sender_id: UserId,
}

impl NewMessage {
    pub fn kind(&self) -> MessageKind {
        MessageKind::for_image(self.image_url.as_deref())
    }
}

/// Partial update of a chat's summary fields. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatPatch {
    pub last_message: Option<String>,
    pub updated_at: Option<ServerTime>,
    pub unread_for: Option<Vec<UserId>>,
}

impl ChatPatch {
    pub fn last_message(mut self, text: impl Into<String>) -> Self {
        self.last_message = Some(text.into());
        self
    }

    pub fn updated_at(mut self, at: ServerTime) -> Self {
        self.updated_at = Some(at);
        self
    }

    pub fn unread_for(mut self, users: Vec<UserId>) -> Self {
        self.unread_for = Some(users);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.last_message.is_none() && self.updated_at.is_none() && self.unread_for.is_none()
    }
}

/// Partial update of a user profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub username: Option<String>,
    pub profile_photo_url: Option<String>,
}
