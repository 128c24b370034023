//! Test doubles for the backing services.
#![allow(dead_code)]

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::mpsc;

use duochat_shared::{ChatId, MessageId, UserId};
use duochat_store::{
    Chat, ChatPatch, ChatQuery, DocumentStore, FileStore, LocalStore, Message, MessageKind,
    MessageQuery, NewChat, NewMessage, ProfilePatch, ProfileSource, Result, SnapshotSender,
    StoreError, Subscription, UserProfile,
};

pub const WAIT: Duration = Duration::from_secs(2);

/// Receive the next item or panic after [`WAIT`].
pub async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for delivery")
        .expect("channel closed")
}

/// Assert nothing arrives for a short while.
pub async fn assert_quiet<T: std::fmt::Debug>(rx: &mut mpsc::UnboundedReceiver<T>) {
    if let Ok(Some(item)) = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
        panic!("unexpected delivery: {item:?}");
    }
}

/// Poll `check` until it holds or [`WAIT`] elapses.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + WAIT;
    while !check().await {
        assert!(tokio::time::Instant::now() < deadline, "condition never held");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
}

pub fn chat(id: &str, me: &str, other: &str, updated: Option<DateTime<Utc>>) -> Chat {
    let mut participants = vec![UserId::from(me), UserId::from(other)];
    participants.sort();
    Chat {
        id: ChatId::from(id),
        participants,
        last_message: String::new(),
        updated_at: updated,
        created_at: updated,
        unread_for: Vec::new(),
        other_user: None,
    }
}

pub fn message(id: &str, sender: &str, created: Option<DateTime<Utc>>) -> Message {
    Message {
        id: MessageId::from(id),
        chat_id: ChatId::from("c1"),
        text: id.to_string(),
        image_url: None,
        sender_id: UserId::from(sender),
        kind: MessageKind::Text,
        created_at: created,
    }
}

/// Document store whose live queries are driven by the test. One-shot reads
/// and writes go to an in-memory [`LocalStore`]; writes are counted.
pub struct ScriptedStore {
    pub inner: LocalStore,
    writes: AtomicUsize,
    chat_watches: Mutex<Vec<(ChatQuery, SnapshotSender<Chat>)>>,
    message_watches: Mutex<Vec<(MessageQuery, SnapshotSender<Message>)>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self {
            inner: LocalStore::in_memory().unwrap(),
            writes: AtomicUsize::new(0),
            chat_watches: Mutex::new(Vec::new()),
            message_watches: Mutex::new(Vec::new()),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn chat_watch_count(&self) -> usize {
        self.chat_watches.lock().unwrap().len()
    }

    pub fn chat_watch(&self, i: usize) -> (ChatQuery, SnapshotSender<Chat>) {
        self.chat_watches.lock().unwrap()[i].clone()
    }

    pub fn message_watch(&self, i: usize) -> (MessageQuery, SnapshotSender<Message>) {
        self.message_watches.lock().unwrap()[i].clone()
    }

    /// Wait until at least `n` chat watches have been opened.
    pub async fn wait_for_chat_watches(&self, n: usize) {
        eventually(|| async move { self.chat_watch_count() >= n }).await;
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    async fn create_chat(&self, chat: NewChat) -> Result<Chat> {
        self.wrote();
        self.inner.create_chat(chat).await
    }

    async fn get_chat(&self, id: &ChatId) -> Result<Option<Chat>> {
        self.inner.get_chat(id).await
    }

    async fn query_chats(&self, query: &ChatQuery) -> Result<Vec<Chat>> {
        self.inner.query_chats(query).await
    }

    async fn update_chat(&self, id: &ChatId, patch: ChatPatch) -> Result<()> {
        self.wrote();
        self.inner.update_chat(id, patch).await
    }

    async fn add_message(&self, chat_id: &ChatId, message: NewMessage) -> Result<Message> {
        self.wrote();
        self.inner.add_message(chat_id, message).await
    }

    async fn delete_message(&self, chat_id: &ChatId, id: &MessageId) -> Result<()> {
        self.wrote();
        self.inner.delete_message(chat_id, id).await
    }

    async fn query_messages(&self, query: &MessageQuery) -> Result<Vec<Message>> {
        self.inner.query_messages(query).await
    }

    async fn list_users(&self) -> Result<Vec<UserProfile>> {
        self.inner.list_users().await
    }

    async fn update_user(&self, id: &UserId, patch: ProfilePatch) -> Result<()> {
        self.wrote();
        self.inner.update_user(id, patch).await
    }

    fn watch_chats(&self, query: ChatQuery) -> Subscription<Chat> {
        let (tx, sub) = Subscription::channel();
        self.chat_watches.lock().unwrap().push((query, tx));
        sub
    }

    fn watch_messages(&self, query: MessageQuery) -> Subscription<Message> {
        let (tx, sub) = Subscription::channel();
        self.message_watches.lock().unwrap().push((query, tx));
        sub
    }
}

/// Profiles keyed by uid; lookups for ids in `failing` return an error.
#[derive(Default)]
pub struct FlakyProfiles {
    pub profiles: Vec<UserProfile>,
    pub failing: HashSet<UserId>,
}

#[async_trait]
impl ProfileSource for FlakyProfiles {
    async fn get_profile(&self, id: &UserId) -> Result<Option<UserProfile>> {
        if self.failing.contains(id) {
            return Err(StoreError::Backend(format!("profile read for {id} refused")));
        }
        Ok(self.profiles.iter().find(|p| p.uid == *id).cloned())
    }
}

/// File store that accepts uploads and fails every delete.
#[derive(Default)]
pub struct FailingFiles {
    pub deletes: AtomicUsize,
}

#[async_trait]
impl FileStore for FailingFiles {
    async fn upload(&self, path: &str, _data: &[u8]) -> Result<String> {
        Ok(self.url_for(path))
    }

    async fn delete(&self, _path: &str) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Backend("storage offline".into()))
    }

    fn url_for(&self, path: &str) -> String {
        format!("mem://files/{path}")
    }
}
