//! Types and helpers shared by every duochat crate: identifiers, constants,
//! storage path conventions and the display helpers used by both the desktop
//! and the mobile layouts.

pub mod constants;
pub mod display;
pub mod paths;
pub mod types;

pub use types::{ChatId, MessageId, UserId};
