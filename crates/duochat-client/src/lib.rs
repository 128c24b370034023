//! # duochat-client
//!
//! The chat synchronization core: live chat directory with index fallback,
//! live message streams, the mutation operations that write through the same
//! store, and the per-user [`Session`] tying them together.

pub mod config;
pub mod directory;
pub mod events;
pub mod handle;
pub mod profile;
pub mod service;
pub mod session;
pub mod stream;
pub mod views;

mod error;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::ClientConfig;
pub use directory::{ChatDirectory, DirectoryMode, DirectoryNotice};
pub use error::ChatError;
pub use events::SessionEvent;
pub use handle::SyncHandle;
pub use profile::ProfileService;
pub use service::{ChatRef, ChatService, MessageDraft, UploadedImage};
pub use session::{Layout, Services, Session, Theme};
pub use stream::MessageStream;

const DEFAULT_LOG_FILTER: &str = "duochat_client=debug,duochat_store=info,warn";

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Calling this more than once is harmless.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(app = duochat_shared::constants::APP_NAME, "tracing initialised");
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_tracing_is_idempotent() {
        super::init_tracing();
        super::init_tracing();
    }
}
