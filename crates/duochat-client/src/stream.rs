//! Message Stream Sync: the live, oldest-first message list of one chat.
//!
//! Deliveries are passed through in store order. Messages still waiting for
//! a server timestamp are never reordered here.

use std::sync::Arc;

use tracing::{debug, error};

use duochat_shared::ChatId;
use duochat_store::{DocumentStore, Message, MessageQuery};

use crate::handle::SyncHandle;

#[derive(Clone)]
pub struct MessageStream {
    store: Arc<dyn DocumentStore>,
}

impl MessageStream {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Start streaming `chat_id`. `on_messages` receives the full list on
    /// every delivery until the handle is disposed. A subscription error is
    /// logged and ends the stream.
    pub fn watch<F>(&self, chat_id: ChatId, mut on_messages: F) -> SyncHandle
    where
        F: FnMut(Vec<Message>) + Send + 'static,
    {
        let mut sub = self.store.watch_messages(MessageQuery::history(chat_id.clone()));

        SyncHandle::spawn(move |cancel| async move {
            while let Some(snapshot) = sub.next().await {
                if cancel.is_cancelled() {
                    return;
                }
                match snapshot {
                    Ok(messages) => {
                        debug!(chat = %chat_id, count = messages.len(), "message delivery");
                        on_messages(messages);
                    }
                    Err(e) => {
                        error!(chat = %chat_id, error = %e, "message subscription failed");
                        return;
                    }
                }
            }
            debug!(chat = %chat_id, "message subscription ended");
        })
    }
}
