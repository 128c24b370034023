mod common;

use std::sync::Arc;

use tokio::sync::mpsc;

use duochat_client::{ChatService, MessageDraft, MessageStream, SyncHandle};
use duochat_shared::UserId;
use duochat_store::{LocalStore, Message, StoreError};

use common::{assert_quiet, at, message, next, FailingFiles, ScriptedStore};

fn collect(stream: &MessageStream, chat: &str) -> (SyncHandle, mpsc::UnboundedReceiver<Vec<Message>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = stream.watch(chat.into(), move |messages| {
        let _ = tx.send(messages);
    });
    (handle, rx)
}

#[tokio::test]
async fn delivered_list_grows_in_creation_order() {
    let store = Arc::new(LocalStore::in_memory().unwrap());
    let chats = ChatService::new(store.clone(), Arc::new(FailingFiles::default()));
    let chat = chats
        .create_or_reuse_chat(&UserId::from("a"), &UserId::from("b"))
        .await
        .unwrap()
        .chat_id;

    let (_handle, mut rx) = collect(&MessageStream::new(store.clone()), chat.as_str());
    assert!(next(&mut rx).await.is_empty());

    const N: usize = 5;
    for i in 0..N {
        let sender = if i % 2 == 0 { "a" } else { "b" };
        chats
            .send_message(&chat, MessageDraft::text(sender, format!("m{i}")))
            .await
            .unwrap();
    }

    // Each send is two writes (message, then summary), each re-delivering.
    let mut latest = Vec::new();
    while latest.len() < N {
        latest = next(&mut rx).await;
    }
    assert_eq!(latest.len(), N);
    assert!(latest
        .windows(2)
        .all(|pair| pair[0].created_at <= pair[1].created_at));
    let bodies: Vec<_> = latest.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(bodies, vec!["m0", "m1", "m2", "m3", "m4"]);
}

#[tokio::test]
async fn pending_timestamps_are_not_reordered() {
    let store = Arc::new(ScriptedStore::new());
    let (_handle, mut rx) = collect(&MessageStream::new(store.clone()), "c1");

    let (query, tx) = store.message_watch(0);
    assert_eq!(query.chat_id.as_str(), "c1");

    let snapshot = vec![
        message("m1", "a", Some(at(9))),
        message("m2", "b", None),
        message("m3", "a", Some(at(8))),
    ];
    tx.deliver(snapshot.clone());
    assert_eq!(next(&mut rx).await, snapshot);
}

#[tokio::test]
async fn error_ends_stream_and_dispose_is_final() {
    let store = Arc::new(ScriptedStore::new());
    let stream = MessageStream::new(store.clone());

    let (mut first, mut first_rx) = collect(&stream, "c1");
    let (_, tx) = store.message_watch(0);
    tx.deliver(vec![message("m1", "a", Some(at(1)))]);
    assert_eq!(next(&mut first_rx).await.len(), 1);

    first.dispose();
    assert!(!first.is_active());
    tx.deliver(vec![]);
    assert_quiet(&mut first_rx).await;

    let (second, mut second_rx) = collect(&stream, "c2");
    let (_, tx) = store.message_watch(1);
    tx.fail(StoreError::Backend("gone".into()));
    assert_quiet(&mut second_rx).await;
    assert!(!second.is_active());
}
