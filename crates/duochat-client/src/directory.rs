//! Chat Directory Sync.
//!
//! Keeps a live, newest-first list of the user's chats, each enriched with
//! the counterpart's profile. The ordered query needs the directory index;
//! while that index is missing the sync drops to an unordered query and
//! sorts on the client.
//!
//! ```text
//!   Optimized --(failed precondition)--> Fallback
//!       |                                    |
//!       +------(any other error)-------------+--> stopped (LoadFailed)
//! ```
//!
//! Only one subscription is open at a time: the optimized one is closed
//! before the fallback one is opened.

use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, warn};

use duochat_shared::constants::{INDEX_BUILDING_NOTICE, LOAD_FAILED_NOTICE};
use duochat_shared::UserId;
use duochat_store::{Chat, ChatQuery, DocumentStore, ProfileSource};

use crate::handle::{CancelFlag, SyncHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryMode {
    /// Server-ordered query backed by the directory index.
    Optimized,
    /// Unordered query, sorted client-side.
    Fallback,
}

impl DirectoryMode {
    pub fn query(self, user: &UserId) -> ChatQuery {
        let query = ChatQuery::member(user.clone());
        match self {
            DirectoryMode::Optimized => query.newest_first(),
            DirectoryMode::Fallback => query,
        }
    }
}

/// Side-channel message from the directory sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryNotice {
    /// Switched to fallback loading. Deliveries continue.
    IndexBuilding,
    /// The subscription failed and will not be retried.
    LoadFailed { reason: String },
}

impl DirectoryNotice {
    pub fn is_fatal(&self) -> bool {
        matches!(self, DirectoryNotice::LoadFailed { .. })
    }
}

impl fmt::Display for DirectoryNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryNotice::IndexBuilding => f.write_str(INDEX_BUILDING_NOTICE),
            DirectoryNotice::LoadFailed { .. } => f.write_str(LOAD_FAILED_NOTICE),
        }
    }
}

/// Newest `updatedAt` first; chats still waiting for a timestamp sort as the
/// epoch, i.e. last.
pub fn sort_newest_first(chats: &mut [Chat]) {
    chats.sort_by_key(|chat| Reverse(chat.updated_at.unwrap_or_default()));
}

#[derive(Clone)]
pub struct ChatDirectory {
    store: Arc<dyn DocumentStore>,
    profiles: Arc<dyn ProfileSource>,
}

impl ChatDirectory {
    pub fn new(store: Arc<dyn DocumentStore>, profiles: Arc<dyn ProfileSource>) -> Self {
        Self { store, profiles }
    }

    /// Start syncing `user`'s chats.
    ///
    /// `on_chats` receives the full list on every delivery. `on_notice`
    /// receives the fallback notice and terminal failures. Neither runs after
    /// the returned handle is disposed.
    pub fn watch<C, N>(&self, user: UserId, on_chats: C, on_notice: N) -> SyncHandle
    where
        C: FnMut(Vec<Chat>) + Send + 'static,
        N: FnMut(DirectoryNotice) + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let profiles = Arc::clone(&self.profiles);
        SyncHandle::spawn(move |cancel| run(store, profiles, user, on_chats, on_notice, cancel))
    }
}

async fn run<C, N>(
    store: Arc<dyn DocumentStore>,
    profiles: Arc<dyn ProfileSource>,
    user: UserId,
    mut on_chats: C,
    mut on_notice: N,
    cancel: CancelFlag,
) where
    C: FnMut(Vec<Chat>) + Send + 'static,
    N: FnMut(DirectoryNotice) + Send + 'static,
{
    let mut mode = DirectoryMode::Optimized;

    'subscribe: loop {
        debug!(user = %user, ?mode, "opening chat directory subscription");
        let mut sub = store.watch_chats(mode.query(&user));

        loop {
            let Some(snapshot) = sub.next().await else {
                debug!(user = %user, "chat directory subscription ended");
                break 'subscribe;
            };
            if cancel.is_cancelled() {
                break 'subscribe;
            }

            match snapshot {
                Ok(mut chats) => {
                    if mode == DirectoryMode::Fallback {
                        sort_newest_first(&mut chats);
                    }
                    let chats = enrich(profiles.as_ref(), &user, chats).await;
                    if cancel.is_cancelled() {
                        break 'subscribe;
                    }
                    on_chats(chats);
                }
                Err(e) if mode == DirectoryMode::Optimized && e.is_failed_precondition() => {
                    warn!(user = %user, error = %e, "directory index unavailable, using fallback query");
                    sub.close();
                    mode = DirectoryMode::Fallback;
                    if cancel.is_cancelled() {
                        break 'subscribe;
                    }
                    on_notice(DirectoryNotice::IndexBuilding);
                    continue 'subscribe;
                }
                Err(e) => {
                    error!(user = %user, ?mode, error = %e, "chat directory subscription failed");
                    if !cancel.is_cancelled() {
                        on_notice(DirectoryNotice::LoadFailed {
                            reason: e.to_string(),
                        });
                    }
                    break 'subscribe;
                }
            }
        }
    }
}

/// Attach each chat's counterpart profile. A failed lookup leaves that
/// chat's `other_user` empty and does not affect the others.
async fn enrich(profiles: &dyn ProfileSource, me: &UserId, chats: Vec<Chat>) -> Vec<Chat> {
    join_all(chats.into_iter().map(|mut chat| async move {
        if let Some(other) = chat.counterpart(me).cloned() {
            match profiles.get_profile(&other).await {
                Ok(profile) => chat.other_user = profile,
                Err(e) => {
                    debug!(chat = %chat.id, user = %other, error = %e, "profile lookup failed")
                }
            }
        }
        chat
    }))
    .await
}
