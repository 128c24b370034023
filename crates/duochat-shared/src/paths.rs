//! Storage path conventions for uploaded files.
//!
//! Profile photos live under `profile-photos/{userId}/{millis}.{ext}` and chat
//! images under `chat-images/{chatId}/{millis}.{ext}`, where `millis` is the
//! upload time in milliseconds since the Unix epoch.

use chrono::{DateTime, Utc};

use crate::constants::{CHAT_IMAGES_DIR, IMAGE_EXTENSIONS, PROFILE_PHOTOS_DIR};
use crate::types::{ChatId, UserId};

/// Extension of a file name: everything after the last `.`, or the whole
/// name when there is no dot.
pub fn file_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) => &file_name[idx + 1..],
        None => file_name,
    }
}

/// Whether the file name carries one of the accepted image extensions.
pub fn is_image_file(file_name: &str) -> bool {
    if !file_name.contains('.') {
        return false;
    }
    let ext = file_extension(file_name).to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

pub fn profile_photo_path(user_id: &UserId, file_name: &str, at: DateTime<Utc>) -> String {
    format!(
        "{PROFILE_PHOTOS_DIR}/{user_id}/{}.{}",
        at.timestamp_millis(),
        file_extension(file_name)
    )
}

pub fn chat_image_path(chat_id: &ChatId, file_name: &str, at: DateTime<Utc>) -> String {
    format!(
        "{CHAT_IMAGES_DIR}/{chat_id}/{}.{}",
        at.timestamp_millis(),
        file_extension(file_name)
    )
}

/// Recover the storage path of a chat image from its download URL.
///
/// Only the final path segment is trusted (query string stripped, and an
/// URL-encoded `%2F` separator honoured); the directory is always rebuilt from
/// `chat_id` so a URL can never point the delete outside the chat's folder.
pub fn chat_image_path_from_url(chat_id: &ChatId, url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    let last = without_query.rsplit('/').next().unwrap_or_default();
    let file_name = match last.rfind("%2F").or_else(|| last.rfind("%2f")) {
        Some(idx) => &last[idx + 3..],
        None => last,
    };

    if file_name.is_empty() || file_name == ".." || file_name == "." {
        return None;
    }
    Some(format!("{CHAT_IMAGES_DIR}/{chat_id}/{file_name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_123).unwrap()
    }

    #[test]
    fn builds_profile_photo_path() {
        let path = profile_photo_path(&UserId::from("u1"), "me.JPG", at());
        assert_eq!(path, "profile-photos/u1/1700000000123.JPG");
    }

    #[test]
    fn builds_chat_image_path() {
        let path = chat_image_path(&ChatId::from("c9"), "cat.photo.png", at());
        assert_eq!(path, "chat-images/c9/1700000000123.png");
    }

    #[test]
    fn image_detection() {
        assert!(is_image_file("a.PNG"));
        assert!(is_image_file("b.webp"));
        assert!(!is_image_file("notes.txt"));
        assert!(!is_image_file("png"));
    }

    #[test]
    fn path_from_plain_url() {
        let chat = ChatId::from("c1");
        let url = "file:///srv/files/chat-images/c1/1700.png?token=abc";
        assert_eq!(
            chat_image_path_from_url(&chat, url).as_deref(),
            Some("chat-images/c1/1700.png")
        );
    }

    #[test]
    fn path_from_encoded_url() {
        let chat = ChatId::from("c1");
        let url = "https://cdn.example/o/chat-images%2Fc1%2F1700.png?alt=media";
        assert_eq!(
            chat_image_path_from_url(&chat, url).as_deref(),
            Some("chat-images/c1/1700.png")
        );
    }

    #[test]
    fn path_from_url_without_file() {
        assert!(chat_image_path_from_url(&ChatId::from("c1"), "https://cdn.example/").is_none());
    }
}
