/// Application name
pub const APP_NAME: &str = "duochat";

/// Conversation preview written when an image is sent without a caption
pub const IMAGE_SENT_PREVIEW: &str = "Image sent";

/// Conversation preview restored from an image-only message after a delete
pub const IMAGE_PREVIEW: &str = "Image";

/// Label used when nothing identifies a user
pub const UNKNOWN_USER: &str = "Unknown User";

/// Sidebar preview for a conversation without messages
pub const NO_MESSAGES_PREVIEW: &str = "No messages yet";

/// Sidebar previews are cut after this many characters
pub const PREVIEW_MAX_CHARS: usize = 30;

/// Informational notice sent when the directory falls back to unordered loading
pub const INDEX_BUILDING_NOTICE: &str =
    "Using basic chat loading. Index is being created for better performance.";

/// Terminal notice sent when the directory subscription fails
pub const LOAD_FAILED_NOTICE: &str = "Failed to load chats. Please try again.";

/// Storage prefix for profile photos
pub const PROFILE_PHOTOS_DIR: &str = "profile-photos";

/// Storage prefix for images attached to messages
pub const CHAT_IMAGES_DIR: &str = "chat-images";

/// File extensions accepted as images
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Maximum profile photo size in bytes (5 MiB)
pub const MAX_PROFILE_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Default maximum upload size in bytes (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Widths up to this many pixels use the mobile layout
pub const MOBILE_MAX_WIDTH_PX: u32 = 767;
