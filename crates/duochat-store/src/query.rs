//! Query descriptions understood by every [`DocumentStore`](crate::DocumentStore).

use duochat_shared::{ChatId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatFilter {
    /// Chats whose participant set contains the user.
    Member(UserId),
    /// Chats whose participant sequence equals this one exactly.
    Participants(Vec<UserId>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatQuery {
    pub filter: ChatFilter,
    /// Server-side ordering on `updatedAt`. Ordering a member query needs the
    /// composite directory index.
    pub order_by_updated: Option<Direction>,
}

impl ChatQuery {
    pub fn member(user: UserId) -> Self {
        Self {
            filter: ChatFilter::Member(user),
            order_by_updated: None,
        }
    }

    pub fn participants(participants: Vec<UserId>) -> Self {
        Self {
            filter: ChatFilter::Participants(participants),
            order_by_updated: None,
        }
    }

    pub fn newest_first(mut self) -> Self {
        self.order_by_updated = Some(Direction::Descending);
        self
    }

    pub fn is_ordered(&self) -> bool {
        self.order_by_updated.is_some()
    }
}

/// Messages of one chat ordered by `createdAt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuery {
    pub chat_id: ChatId,
    pub direction: Direction,
    pub limit: Option<u32>,
}

impl MessageQuery {
    /// Full history, oldest first.
    pub fn history(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            direction: Direction::Ascending,
            limit: None,
        }
    }

    /// The single most recent message.
    pub fn latest(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            direction: Direction::Descending,
            limit: Some(1),
        }
    }
}
