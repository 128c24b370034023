use thiserror::Error;

use duochat_store::StoreError;

/// Failure of a mutation or query operation. The `Display` text is the
/// human readable reason shown to the user.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Message must have text or an image")]
    EmptyMessage,

    #[error("Chat not found")]
    ChatNotFound,

    #[error("Cannot start a chat with yourself")]
    SameParticipant,

    #[error("User not found")]
    UserNotFound,

    #[error("Username cannot be empty")]
    EmptyUsername,

    #[error("Only image files are allowed: {0}")]
    NotAnImage(String),

    #[error("Image too large: {size} bytes (max {max})")]
    ImageTooLarge { size: usize, max: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ChatError>;
