//! Events pushed from a [`Session`](crate::Session) to the UI layer.
//!
//! Desktop and mobile layouts consume the same stream.

use serde::Serialize;
use tokio::sync::mpsc;

use duochat_shared::ChatId;
use duochat_store::{Chat, Message};

pub const EVENT_CHATS_UPDATED: &str = "chats-updated";
pub const EVENT_DIRECTORY_NOTICE: &str = "directory-notice";
pub const EVENT_MESSAGES_UPDATED: &str = "messages-updated";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SessionEvent {
    /// Full chat list, newest first.
    ChatsUpdated { chats: Vec<Chat> },
    /// Directory notice. `fatal` notices mean the list stopped updating.
    DirectoryNotice { message: String, fatal: bool },
    /// Full message list of the selected chat.
    #[serde(rename_all = "camelCase")]
    MessagesUpdated { chat_id: ChatId, messages: Vec<Message> },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::ChatsUpdated { .. } => EVENT_CHATS_UPDATED,
            SessionEvent::DirectoryNotice { .. } => EVENT_DIRECTORY_NOTICE,
            SessionEvent::MessagesUpdated { .. } => EVENT_MESSAGES_UPDATED,
        }
    }
}

pub fn emit_event(tx: &mpsc::UnboundedSender<SessionEvent>, event: SessionEvent) {
    let name = event.name();
    if tx.send(event).is_err() {
        tracing::warn!(event = name, "Session event receiver dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_with_their_name() {
        let event = SessionEvent::MessagesUpdated {
            chat_id: "c1".into(),
            messages: Vec::new(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], EVENT_MESSAGES_UPDATED);
        assert_eq!(json["chatId"], "c1");

        let notice = SessionEvent::DirectoryNotice {
            message: "x".into(),
            fatal: false,
        };
        assert_eq!(serde_json::to_value(&notice).unwrap()["type"], notice.name());
    }
}
