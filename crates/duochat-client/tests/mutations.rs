mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tempfile::TempDir;

use duochat_client::{ChatError, ChatService, MessageDraft, ProfileService};
use duochat_shared::{ChatId, UserId};
use duochat_store::{
    ChatQuery, DocumentStore, LocalFileStore, LocalStore, MessageKind, MessageQuery, StoreError,
    UserProfile,
};

use common::{FailingFiles, ScriptedStore};

struct Fixture {
    store: LocalStore,
    files: Arc<LocalFileStore>,
    chats: ChatService,
    _dir: TempDir,
}

async fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let store = LocalStore::in_memory().unwrap();
    let files = Arc::new(
        LocalFileStore::new(dir.path().join("files"), "file:///files", 1024 * 1024)
            .await
            .unwrap(),
    );
    let chats = ChatService::new(Arc::new(store.clone()), files.clone());
    Fixture {
        store,
        files,
        chats,
        _dir: dir,
    }
}

fn uid(s: &str) -> UserId {
    UserId::from(s)
}

async fn summary(store: &LocalStore, chat_id: &ChatId) -> String {
    store.get_chat(chat_id).await.unwrap().unwrap().last_message
}

#[tokio::test]
async fn create_or_reuse_is_idempotent_in_either_order() {
    let fx = fixture().await;

    let first = fx.chats.create_or_reuse_chat(&uid("bob"), &uid("amy")).await.unwrap();
    assert!(first.is_new);
    let again = fx.chats.create_or_reuse_chat(&uid("amy"), &uid("bob")).await.unwrap();
    assert!(!again.is_new);
    assert_eq!(first.chat_id, again.chat_id);

    let pair = ChatQuery::participants(vec![uid("amy"), uid("bob")]);
    assert_eq!(fx.store.query_chats(&pair).await.unwrap().len(), 1);

    let chat = fx.chats.get_chat_details(&first.chat_id).await.unwrap();
    assert_eq!(chat.last_message, "");
    assert!(chat.created_at.is_some() && chat.updated_at.is_some());
}

#[tokio::test]
async fn chat_with_yourself_is_rejected() {
    let fx = fixture().await;
    let err = fx.chats.create_or_reuse_chat(&uid("amy"), &uid("amy")).await.unwrap_err();
    assert!(matches!(err, ChatError::SameParticipant));
}

#[tokio::test]
async fn unknown_chat_details() {
    let fx = fixture().await;
    let err = fx.chats.get_chat_details(&ChatId::from("nope")).await.unwrap_err();
    assert!(matches!(err, ChatError::ChatNotFound));
}

#[tokio::test]
async fn send_then_read_moves_unread_flag() {
    let fx = fixture().await;
    let chat = fx.chats.create_or_reuse_chat(&uid("s"), &uid("r")).await.unwrap().chat_id;

    let sent = fx
        .chats
        .send_message(&chat, MessageDraft::text("s", "hello"))
        .await
        .unwrap();
    assert_eq!(sent.kind, MessageKind::Text);

    let after_send = fx.chats.get_chat_details(&chat).await.unwrap();
    assert_eq!(after_send.unread_for, vec![uid("r")]);
    assert_eq!(after_send.last_message, "hello");

    fx.chats.mark_chat_read(&chat, &uid("r")).await.unwrap();
    assert!(fx.chats.get_chat_details(&chat).await.unwrap().unread_for.is_empty());

    // Reading again, or reading a missing chat, is a quiet success.
    fx.chats.mark_chat_read(&chat, &uid("r")).await.unwrap();
    fx.chats.mark_chat_read(&ChatId::from("gone"), &uid("r")).await.unwrap();
}

#[tokio::test]
async fn empty_send_writes_nothing() {
    let store = Arc::new(ScriptedStore::new());
    let chats = ChatService::new(store.clone(), Arc::new(FailingFiles::default()));
    let chat = chats.create_or_reuse_chat(&uid("a"), &uid("b")).await.unwrap().chat_id;
    let before = store.writes();

    for draft in [MessageDraft::text("a", ""), MessageDraft::text("a", "  \n")] {
        let err = chats.send_message(&chat, draft).await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));
    }
    assert_eq!(store.writes(), before);
}

#[tokio::test]
async fn image_only_message_uses_placeholder() {
    let fx = fixture().await;
    let chat = fx.chats.create_or_reuse_chat(&uid("a"), &uid("b")).await.unwrap().chat_id;

    let sent = fx
        .chats
        .send_image(&chat, &uid("a"), "cat.png", b"png", "")
        .await
        .unwrap();
    assert_eq!(sent.kind, MessageKind::Image);
    assert_eq!(summary(&fx.store, &chat).await, "Image sent");
}

#[tokio::test]
async fn deleting_the_only_message_clears_summary() {
    let fx = fixture().await;
    let chat = fx.chats.create_or_reuse_chat(&uid("a"), &uid("b")).await.unwrap().chat_id;
    let msg = fx.chats.send_message(&chat, MessageDraft::text("a", "solo")).await.unwrap();
    let before = fx.chats.get_chat_details(&chat).await.unwrap().updated_at;

    fx.chats.delete_message(&chat, &msg).await.unwrap();

    let after = fx.chats.get_chat_details(&chat).await.unwrap();
    assert_eq!(after.last_message, "");
    assert!(after.updated_at >= before);
}

#[tokio::test]
async fn deleting_newest_restores_previous_summary() {
    let fx = fixture().await;
    let chat = fx.chats.create_or_reuse_chat(&uid("a"), &uid("b")).await.unwrap().chat_id;
    let older = fx.chats.send_message(&chat, MessageDraft::text("a", "first")).await.unwrap();
    let newer = fx.chats.send_message(&chat, MessageDraft::text("b", "second")).await.unwrap();

    fx.chats.delete_message(&chat, &newer).await.unwrap();

    let after = fx.chats.get_chat_details(&chat).await.unwrap();
    assert_eq!(after.last_message, "first");
    assert_eq!(after.updated_at, older.created_at);
}

#[tokio::test]
async fn deleting_an_older_message_keeps_summary() {
    let fx = fixture().await;
    let chat = fx.chats.create_or_reuse_chat(&uid("a"), &uid("b")).await.unwrap().chat_id;
    let older = fx.chats.send_message(&chat, MessageDraft::text("a", "first")).await.unwrap();
    fx.chats.send_message(&chat, MessageDraft::text("b", "second")).await.unwrap();

    fx.chats.delete_message(&chat, &older).await.unwrap();
    assert_eq!(summary(&fx.store, &chat).await, "second");
}

#[tokio::test]
async fn deleting_an_image_message_removes_the_file() {
    let fx = fixture().await;
    let chat = fx.chats.create_or_reuse_chat(&uid("a"), &uid("b")).await.unwrap().chat_id;
    let text = fx.chats.send_message(&chat, MessageDraft::text("a", "look")).await.unwrap();
    let uploaded = fx.chats.upload_chat_image(&chat, "dog.jpg", b"jpeg").await.unwrap();
    assert!(uploaded.path.starts_with(&format!("chat-images/{chat}/")));

    let image = fx
        .chats
        .send_message(&chat, MessageDraft::image("a", uploaded.url.clone()))
        .await
        .unwrap();
    assert!(fx.files.read(&uploaded.path).await.is_ok());

    fx.chats.delete_message(&chat, &image).await.unwrap();
    assert!(matches!(
        fx.files.read(&uploaded.path).await.unwrap_err(),
        StoreError::NotFound
    ));
    assert_eq!(summary(&fx.store, &chat).await, text.text);
}

#[tokio::test]
async fn image_cleanup_failure_does_not_fail_delete() {
    let store = LocalStore::in_memory().unwrap();
    let files = Arc::new(FailingFiles::default());
    let chats = ChatService::new(Arc::new(store.clone()), files.clone());
    let chat = chats.create_or_reuse_chat(&uid("a"), &uid("b")).await.unwrap().chat_id;

    let image = chats
        .send_image(&chat, &uid("a"), "x.gif", b"gif", "caption")
        .await
        .unwrap();
    assert_eq!(summary(&store, &chat).await, "caption");

    chats.delete_message(&chat, &image).await.unwrap();
    assert_eq!(files.deletes.load(Ordering::SeqCst), 1);
    assert!(store
        .query_messages(&MessageQuery::history(chat.clone()))
        .await
        .unwrap()
        .is_empty());
    assert_eq!(summary(&store, &chat).await, "");
}

#[tokio::test]
async fn uploads_must_be_images() {
    let fx = fixture().await;
    let chat = fx.chats.create_or_reuse_chat(&uid("a"), &uid("b")).await.unwrap().chat_id;
    let err = fx.chats.upload_chat_image(&chat, "notes.txt", b"hi").await.unwrap_err();
    assert!(matches!(err, ChatError::NotAnImage(_)));
}

#[tokio::test]
async fn search_is_case_insensitive_and_excludes_caller() {
    let fx = fixture().await;
    fx.store
        .upsert_user(&UserProfile::new("u1", "Amy@Example.com").with_username("AmyK"))
        .unwrap();
    fx.store.upsert_user(&UserProfile::new("u2", "bob@example.com")).unwrap();
    fx.store.upsert_user(&UserProfile::new("u3", "amelia@test.org")).unwrap();

    let found = fx.chats.search_users("AMY", &uid("u3")).await.unwrap();
    let ids: Vec<_> = found.iter().map(|u| u.uid.as_str()).collect();
    assert_eq!(ids, vec!["u1"]);

    let found = fx.chats.search_users("example", &uid("u1")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].uid, uid("u2"));

    assert!(fx.chats.search_users("   ", &uid("u1")).await.unwrap().is_empty());
}

#[tokio::test]
async fn profile_updates() {
    let fx = fixture().await;
    fx.store.upsert_user(&UserProfile::new("u1", "amy@example.com")).unwrap();
    let store: Arc<LocalStore> = Arc::new(fx.store.clone());
    let profiles = ProfileService::new(store.clone(), store, fx.files.clone());

    assert_eq!(profiles.update_username(&uid("u1"), "  amy  ").await.unwrap(), "amy");
    assert_eq!(profiles.get_profile(&uid("u1")).await.unwrap().label(), "amy");
    assert!(matches!(
        profiles.update_username(&uid("u1"), " ").await.unwrap_err(),
        ChatError::EmptyUsername
    ));
    assert!(matches!(
        profiles.update_username(&uid("ghost"), "x").await.unwrap_err(),
        ChatError::UserNotFound
    ));

    let url = profiles
        .update_profile_photo(&uid("u1"), "me.webp", b"webp")
        .await
        .unwrap();
    assert!(url.starts_with("file:///files/profile-photos/u1/"));
    assert!(url.ends_with(".webp"));
    let profile = profiles.get_profile(&uid("u1")).await.unwrap();
    assert_eq!(profile.profile_photo_url.as_deref(), Some(url.as_str()));

    let too_big = vec![0u8; 5 * 1024 * 1024 + 1];
    assert!(matches!(
        profiles.update_profile_photo(&uid("u1"), "big.png", &too_big).await.unwrap_err(),
        ChatError::ImageTooLarge { .. }
    ));
    assert!(matches!(
        profiles.update_profile_photo(&uid("u1"), "me.pdf", b"pdf").await.unwrap_err(),
        ChatError::NotAnImage(_)
    ));
}
