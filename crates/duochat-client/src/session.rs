//! Per-user session context.
//!
//! A [`Session`] is created once a user signs in and torn down on sign-out.
//! It owns the chat directory sync and at most one message stream, and
//! forwards both to the UI as [`SessionEvent`]s.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use duochat_shared::constants::MOBILE_MAX_WIDTH_PX;
use duochat_shared::{ChatId, UserId};
use duochat_store::{
    DocumentStore, FileStore, LocalFileStore, LocalStore, ProfileSource, StoreError, UserProfile,
};

use crate::config::ClientConfig;
use crate::directory::{ChatDirectory, DirectoryNotice};
use crate::error::Result;
use crate::events::{emit_event, SessionEvent};
use crate::handle::SyncHandle;
use crate::profile::ProfileService;
use crate::service::ChatService;
use crate::stream::MessageStream;

/// The backing services a session runs against.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn DocumentStore>,
    pub profiles: Arc<dyn ProfileSource>,
    pub files: Arc<dyn FileStore>,
}

impl Services {
    /// Open the local store and file store described by `config`.
    pub async fn open(config: &ClientConfig) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(StoreError::from)?;
        }

        let store = LocalStore::open_at(&config.db_path)?;
        if config.directory_index {
            store.create_directory_index()?;
        }
        let files = LocalFileStore::new(
            config.files_path.clone(),
            config.files_base_url.clone(),
            config.max_upload_bytes,
        )
        .await?;

        info!(db = %config.db_path.display(), "services ready");
        Ok(Self::local(store, files))
    }

    pub fn local(store: LocalStore, files: LocalFileStore) -> Self {
        let store = Arc::new(store);
        Self {
            store: store.clone(),
            profiles: store,
            files: Arc::new(files),
        }
    }

    pub fn chats(&self) -> ChatService {
        ChatService::new(Arc::clone(&self.store), Arc::clone(&self.files))
    }

    pub fn profiles(&self) -> ProfileService {
        ProfileService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.profiles),
            Arc::clone(&self.files),
        )
    }
}

/// Colour theme. Only the dark theme exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Dark,
}

impl Theme {
    pub fn toggle(self) -> Self {
        Theme::Dark
    }

    pub fn is_dark(self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Desktop,
    Mobile,
}

impl Layout {
    pub fn for_width(px: u32) -> Self {
        if px <= MOBILE_MAX_WIDTH_PX {
            Layout::Mobile
        } else {
            Layout::Desktop
        }
    }
}

pub struct Session {
    user_id: UserId,
    profile: Option<UserProfile>,
    services: Services,
    events: mpsc::UnboundedSender<SessionEvent>,
    notice: Arc<Mutex<Option<DirectoryNotice>>>,
    directory: Option<SyncHandle>,
    messages: Option<SyncHandle>,
    selected: Option<ChatId>,
    theme: Theme,
}

impl Session {
    /// Start a session for `user_id`: load the user's profile and begin
    /// syncing the chat directory. Returns the session and its event stream.
    pub async fn init(
        user_id: UserId,
        services: Services,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SessionEvent>)> {
        let profile = services.profiles.get_profile(&user_id).await?;
        if profile.is_none() {
            warn!(user = %user_id.short(), "no profile for signed-in user");
        }

        let (events, rx) = mpsc::unbounded_channel();
        let notice = Arc::new(Mutex::new(None));

        let directory = ChatDirectory::new(Arc::clone(&services.store), Arc::clone(&services.profiles));
        let handle = {
            let chats_tx = events.clone();
            let chats_notice = Arc::clone(&notice);
            let notice_tx = events.clone();
            let latest_notice = Arc::clone(&notice);
            directory.watch(
                user_id.clone(),
                move |chats| {
                    set_notice(&chats_notice, None);
                    emit_event(&chats_tx, SessionEvent::ChatsUpdated { chats });
                },
                move |n: DirectoryNotice| {
                    let event = SessionEvent::DirectoryNotice {
                        message: n.to_string(),
                        fatal: n.is_fatal(),
                    };
                    set_notice(&latest_notice, Some(n));
                    emit_event(&notice_tx, event);
                },
            )
        };

        info!(user = %user_id.short(), "session started");
        let session = Self {
            user_id,
            profile,
            services,
            events,
            notice,
            directory: Some(handle),
            messages: None,
            selected: None,
            theme: Theme::default(),
        };
        Ok((session, rx))
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn chats(&self) -> ChatService {
        self.services.chats()
    }

    pub fn profiles(&self) -> ProfileService {
        self.services.profiles()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle();
    }

    /// Latest directory notice, cleared by the next successful delivery.
    pub fn notice(&self) -> Option<DirectoryNotice> {
        self.notice.lock().ok().and_then(|n| n.clone())
    }

    pub fn selected_chat(&self) -> Option<&ChatId> {
        self.selected.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.directory.is_some()
    }

    /// Open `chat_id`: replace the message stream and mark the chat read.
    pub async fn select_chat(&mut self, chat_id: ChatId) -> Result<()> {
        if let Some(mut old) = self.messages.take() {
            old.dispose();
        }

        let tx = self.events.clone();
        let streamed = chat_id.clone();
        let handle = MessageStream::new(Arc::clone(&self.services.store)).watch(
            chat_id.clone(),
            move |messages| {
                emit_event(
                    &tx,
                    SessionEvent::MessagesUpdated {
                        chat_id: streamed.clone(),
                        messages,
                    },
                );
            },
        );
        self.messages = Some(handle);
        self.selected = Some(chat_id.clone());

        debug!(chat = %chat_id, "chat selected");
        self.chats().mark_chat_read(&chat_id, &self.user_id).await
    }

    /// Leave the open chat (mobile layout).
    pub fn back_to_chats(&mut self) {
        if let Some(mut handle) = self.messages.take() {
            handle.dispose();
        }
        self.selected = None;
    }

    /// Stop every live sync. No events are emitted afterwards.
    pub fn teardown(&mut self) {
        self.back_to_chats();
        if let Some(mut handle) = self.directory.take() {
            handle.dispose();
            info!(user = %self.user_id.short(), "session ended");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn set_notice(slot: &Mutex<Option<DirectoryNotice>>, value: Option<DirectoryNotice>) {
    if let Ok(mut current) = slot.lock() {
        *current = value;
    }
}
