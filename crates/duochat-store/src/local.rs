//! SQLite-backed [`DocumentStore`] with in-process live queries.
//!
//! Every committed write re-runs the query of each registered watcher and
//! pushes the full result set. Watchers whose consumer detached are pruned on
//! the next pass. Lock order is always `watchers` then `db`; writes release
//! the database before publishing.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, warn};

use duochat_shared::{ChatId, MessageId, UserId};

use crate::database::Database;
use crate::document::{DocumentStore, ProfileSource};
use crate::error::{Result, StoreError};
use crate::models::{Chat, ChatPatch, Message, NewChat, NewMessage, ProfilePatch, UserProfile};
use crate::query::{ChatQuery, MessageQuery};
use crate::subscription::{SnapshotSender, Subscription};

enum Watcher {
    Chats {
        query: ChatQuery,
        tx: SnapshotSender<Chat>,
    },
    Messages {
        query: MessageQuery,
        tx: SnapshotSender<Message>,
    },
}

impl Watcher {
    /// Re-run the query and deliver. Returns `false` once the watcher is done.
    fn refresh(&self, db: &Database) -> bool {
        match self {
            Watcher::Chats { query, tx } => push(tx, db.query_chats(query)),
            Watcher::Messages { query, tx } => push(tx, db.query_messages(query)),
        }
    }
}

fn push<T>(tx: &SnapshotSender<T>, result: Result<Vec<T>>) -> bool {
    match result {
        Ok(rows) => tx.deliver(rows),
        Err(e) => {
            warn!(error = %e, "live query failed, closing subscription");
            tx.clone().fail(e);
            false
        }
    }
}

/// Store clock, truncated to the stored precision so returned documents
/// compare equal to what a later read yields.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Local document store. Cheap to clone; clones share the database and the
/// watcher registry.
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Mutex<Database>>,
    watchers: Arc<Mutex<Vec<Watcher>>>,
}

impl LocalStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            watchers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open_at(path)?))
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Build the composite directory index and re-deliver every live query.
    pub fn create_directory_index(&self) -> Result<()> {
        self.db()?.create_directory_index()?;
        self.publish();
        Ok(())
    }

    /// Drop the directory index. Ordered directory watches fail on the next
    /// delivery.
    pub fn drop_directory_index(&self) -> Result<()> {
        self.db()?.drop_directory_index()?;
        self.publish();
        Ok(())
    }

    /// Register or replace a user profile, as the auth subsystem does on
    /// sign-up.
    pub fn upsert_user(&self, profile: &UserProfile) -> Result<()> {
        self.db()?.upsert_user(profile)?;
        self.publish();
        Ok(())
    }

    /// Number of live subscriptions still attached.
    pub fn watcher_count(&self) -> usize {
        self.prune();
        self.watchers.lock().map(|w| w.len()).unwrap_or(0)
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|e| StoreError::Backend(format!("database lock poisoned: {e}")))
    }

    fn write<T>(&self, op: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let out = {
            let db = self.db()?;
            op(&*db)?
        };
        self.publish();
        Ok(out)
    }

    fn read<T>(&self, op: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let db = self.db()?;
        op(&*db)
    }

    fn publish(&self) {
        let Ok(mut watchers) = self.watchers.lock() else {
            return;
        };
        let Ok(db) = self.db.lock() else {
            return;
        };
        let before = watchers.len();
        watchers.retain(|w| w.refresh(&*db));
        if watchers.len() != before {
            debug!(removed = before - watchers.len(), "pruned live queries");
        }
    }

    fn prune(&self) {
        if let Ok(mut watchers) = self.watchers.lock() {
            watchers.retain(|w| match w {
                Watcher::Chats { tx, .. } => !tx.is_closed(),
                Watcher::Messages { tx, .. } => !tx.is_closed(),
            });
        }
    }

    fn register(&self, watcher: Watcher) {
        let mut watchers = match self.watchers.lock() {
            Ok(w) => w,
            Err(e) => {
                warn!(error = %e, "watcher registry poisoned");
                return;
            }
        };
        let alive = match self.db.lock() {
            Ok(db) => watcher.refresh(&*db),
            Err(e) => {
                let err = StoreError::Backend(format!("database lock poisoned: {e}"));
                match watcher {
                    Watcher::Chats { tx, .. } => tx.fail(err),
                    Watcher::Messages { tx, .. } => tx.fail(err),
                }
                return;
            }
        };
        if alive {
            watchers.push(watcher);
        }
    }
}

#[async_trait]
impl DocumentStore for LocalStore {
    async fn create_chat(&self, chat: NewChat) -> Result<Chat> {
        let created = self.write(|db| db.insert_chat(&chat, now()))?;
        debug!(chat = %created.id, "chat created");
        Ok(created)
    }

    async fn get_chat(&self, id: &ChatId) -> Result<Option<Chat>> {
        self.read(|db| db.find_chat(id))
    }

    async fn query_chats(&self, query: &ChatQuery) -> Result<Vec<Chat>> {
        self.read(|db| db.query_chats(query))
    }

    async fn update_chat(&self, id: &ChatId, patch: ChatPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        self.write(|db| db.update_chat(id, &patch, now()))
    }

    async fn add_message(&self, chat_id: &ChatId, message: NewMessage) -> Result<Message> {
        self.write(|db| db.insert_message(chat_id, &message, now()))
    }

    async fn delete_message(&self, chat_id: &ChatId, id: &MessageId) -> Result<()> {
        let removed = self.write(|db| db.delete_message(chat_id, id))?;
        if !removed {
            debug!(chat = %chat_id, message = %id, "delete of absent message");
        }
        Ok(())
    }

    async fn query_messages(&self, query: &MessageQuery) -> Result<Vec<Message>> {
        self.read(|db| db.query_messages(query))
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>> {
        self.read(|db| db.list_users())
    }

    async fn update_user(&self, id: &UserId, patch: ProfilePatch) -> Result<()> {
        self.write(|db| db.update_user(id, &patch))
    }

    fn watch_chats(&self, query: ChatQuery) -> Subscription<Chat> {
        let (tx, sub) = Subscription::channel();
        self.register(Watcher::Chats { query, tx });
        sub
    }

    fn watch_messages(&self, query: MessageQuery) -> Subscription<Message> {
        let (tx, sub) = Subscription::channel();
        self.register(Watcher::Messages { query, tx });
        sub
    }
}

#[async_trait]
impl ProfileSource for LocalStore {
    async fn get_profile(&self, id: &UserId) -> Result<Option<UserProfile>> {
        self.read(|db| db.find_user(id))
    }
}
