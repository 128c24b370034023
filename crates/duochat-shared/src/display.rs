//! Display helpers shared by the desktop and mobile layouts.
//!
//! Everything here is pure: user labels, conversation previews, timestamp
//! formatting and message grouping. Times are rendered in UTC.

use chrono::{DateTime, Utc};

use crate::constants::{NO_MESSAGES_PREVIEW, PREVIEW_MAX_CHARS, UNKNOWN_USER};

/// The profile fields a label can be derived from.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameParts<'a> {
    pub username: Option<&'a str>,
    pub email: Option<&'a str>,
    pub display_name: Option<&'a str>,
    pub uid: Option<&'a str>,
}

/// Local part of an email address with its first letter uppercased.
///
/// A string without `@` is returned unchanged.
pub fn username_from_email(email: &str) -> String {
    if email.is_empty() {
        return UNKNOWN_USER.to_string();
    }
    let Some(at) = email.find('@') else {
        return email.to_string();
    };
    capitalize(&email[..at])
}

/// Best label for a user: username, then the email's local part, then the
/// auth display name, then a shortened uid.
pub fn display_name(parts: &NameParts<'_>) -> String {
    if let Some(username) = non_blank(parts.username) {
        return username.to_string();
    }
    if let Some(email) = non_blank(parts.email) {
        return username_from_email(email);
    }
    if let Some(name) = non_blank(parts.display_name) {
        return name.to_string();
    }
    match parts.uid {
        Some(uid) if uid.chars().count() > 8 => format!("{}...", take_chars(uid, 8)),
        _ => UNKNOWN_USER.to_string(),
    }
}

/// Label for a bare user id when no profile is available.
pub fn format_user_id(uid: &str) -> String {
    if uid.is_empty() {
        return UNKNOWN_USER.to_string();
    }
    if uid.contains('@') {
        return username_from_email(uid);
    }
    if uid.chars().count() > 20 {
        return format!("{}...", take_chars(uid, 8));
    }
    uid.to_string()
}

/// Sidebar preview of a conversation's last message.
pub fn preview(last_message: &str) -> String {
    if last_message.is_empty() {
        return NO_MESSAGES_PREVIEW.to_string();
    }
    if last_message.chars().count() > PREVIEW_MAX_CHARS {
        return format!("{}...", take_chars(last_message, PREVIEW_MAX_CHARS));
    }
    last_message.to_string()
}

/// Relative time shown next to a conversation in the list.
pub fn format_chat_time(ts: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(ts) = ts else {
        return String::new();
    };
    let age = now.signed_duration_since(ts);
    if age.num_minutes() < 60 {
        "Just now".to_string()
    } else if age.num_hours() < 24 {
        ts.format("%H:%M").to_string()
    } else if age.num_hours() < 48 {
        "Yesterday".to_string()
    } else {
        ts.format("%Y-%m-%d").to_string()
    }
}

/// Time shown on a message bubble.
///
/// A message whose server timestamp has not landed yet shows `now`; this
/// substitution is for display only and never feeds ordering.
pub fn format_message_time(ts: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    ts.unwrap_or(now).format("%H:%M").to_string()
}

/// Position of a message inside a run of consecutive messages by one sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupFlags {
    pub first_in_group: bool,
    pub last_in_group: bool,
}

/// Compute [`GroupFlags`] for a list of sender ids in display order.
pub fn group_flags<S: AsRef<str>>(senders: &[S]) -> Vec<GroupFlags> {
    (0..senders.len())
        .map(|i| {
            let current = senders[i].as_ref();
            let first_in_group = i == 0 || senders[i - 1].as_ref() != current;
            let last_in_group = i + 1 == senders.len() || senders[i + 1].as_ref() != current;
            GroupFlags {
                first_in_group,
                last_in_group,
            }
        })
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn take_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
