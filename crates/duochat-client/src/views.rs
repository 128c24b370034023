//! Render-ready rows for the chat list and the message pane.

use chrono::{DateTime, Utc};
use serde::Serialize;

use duochat_shared::display::{self, group_flags};
use duochat_shared::{ChatId, MessageId, UserId};
use duochat_store::{Chat, Message, MessageKind};

/// Name shown for the other side of `chat`. Prefers the enriched profile and
/// falls back to the counterpart's id.
pub fn counterpart_label(chat: &Chat, me: &UserId) -> String {
    if let Some(other) = &chat.other_user {
        return other.label();
    }
    match chat.counterpart(me) {
        Some(id) => display::format_user_id(id.as_str()),
        None => display::format_user_id(""),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatListItem {
    pub id: ChatId,
    pub title: String,
    pub preview: String,
    pub time: String,
    pub unread: bool,
    pub photo_url: Option<String>,
}

impl ChatListItem {
    pub fn from_chat(chat: &Chat, me: &UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: chat.id.clone(),
            title: counterpart_label(chat, me),
            preview: display::preview(&chat.last_message),
            time: display::format_chat_time(chat.updated_at, now),
            unread: chat.is_unread_for(me),
            photo_url: chat
                .other_user
                .as_ref()
                .and_then(|u| u.profile_photo_url.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: MessageId,
    pub text: String,
    pub image_url: Option<String>,
    pub kind: MessageKind,
    pub is_mine: bool,
    pub time: String,
    /// Server timestamp still pending.
    pub pending: bool,
    /// Show the avatar on the first bubble of a run.
    pub first_in_group: bool,
    pub last_in_group: bool,
}

/// Build the message pane rows, keeping the delivered order.
pub fn message_views(messages: &[Message], me: &UserId, now: DateTime<Utc>) -> Vec<MessageView> {
    let senders: Vec<&str> = messages.iter().map(|m| m.sender_id.as_str()).collect();
    messages
        .iter()
        .zip(group_flags(&senders))
        .map(|(m, flags)| MessageView {
            id: m.id.clone(),
            text: m.text.clone(),
            image_url: m.image_url.clone(),
            kind: m.kind,
            is_mine: m.sender_id == *me,
            time: display::format_message_time(m.created_at, now),
            pending: m.created_at.is_none(),
            first_in_group: flags.first_in_group,
            last_in_group: flags.last_in_group,
        })
        .collect()
}
