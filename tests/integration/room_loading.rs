//! Integration tests for opening rooms from each data source.
//!
//! Verifies:
//! 1. A room that already carries a message list (even an empty one) keeps
//!    it verbatim and is never persisted on load.
//! 2. A `new-chat` room without a list starts empty, gets a two-party
//!    snapshot, and is persisted.
//! 3. `dummy` rooms load the first five fixture comments, `extended` rooms
//!    load all of them.
//! 4. Fixture failures leave the room empty and clear the loading flag.

use std::path::PathBuf;
use std::sync::Arc;

use chatsim::chat::host::InMemoryRoomHost;
use chatsim::chat::{ChatEvent, ChatSession, SessionConfig};
use chatsim::fixtures::{DirFixtureSource, FixtureSource, LoadError};
use chatsim::reply::AutoReplyScheduler;
use chatsim_proto::fixture::FixtureDocument;
use chatsim_proto::message::{Message, MessageType};
use chatsim_proto::room::{CURRENT_USER_ID, CURRENT_USER_NAME, DataSource, Room};

use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../fixtures")
}

fn session_over<F: FixtureSource>(
    fixtures: F,
    config: SessionConfig,
) -> (ChatSession<InMemoryRoomHost, F>, mpsc::Receiver<ChatEvent>) {
    ChatSession::new(
        Arc::new(InMemoryRoomHost::new()),
        fixtures,
        Arc::new(AutoReplyScheduler::default()),
        config,
    )
}

fn session() -> (
    ChatSession<InMemoryRoomHost, DirFixtureSource>,
    mpsc::Receiver<ChatEvent>,
) {
    session_over(DirFixtureSource::new(fixtures_dir()), SessionConfig::default())
}

/// Fails every load.
struct FailingSource;

impl FixtureSource for FailingSource {
    async fn load(&self, source: DataSource) -> Result<FixtureDocument, LoadError> {
        Err(LoadError::NotFound(source))
    }
}

// ---------------------------------------------------------------------------
// Pre-existing lists
// ---------------------------------------------------------------------------

#[tokio::test]
async fn existing_list_is_kept_verbatim() {
    let (session, _events) = session();
    let saved = vec![
        Message::new(MessageType::Text, "first", CURRENT_USER_ID),
        Message::new(MessageType::Text, "second", "agent@mail.com"),
    ];
    session
        .open_room(Room::new("d", DataSource::Dummy).with_messages(saved.clone()))
        .await;

    assert_eq!(session.messages(), saved);
    assert_eq!(session.host().save_count(), 0);
    // Room data still comes from the fixture.
    let participants = session.room_data().unwrap().participant;
    assert_eq!(participants.len(), 3);
}

#[tokio::test]
async fn existing_empty_list_is_not_refilled() {
    let (session, _events) = session();
    session
        .open_room(Room::new("d", DataSource::Dummy).with_messages(vec![]))
        .await;

    assert!(session.messages().is_empty());
    assert_eq!(session.host().save_count(), 0);
}

#[tokio::test]
async fn existing_list_never_refetches_messages() {
    let (session, _events) = session_over(FailingSource, SessionConfig::default());
    let saved = vec![Message::new(MessageType::Text, "mine", CURRENT_USER_ID)];
    session
        .open_room(Room::new("e", DataSource::Extended).with_messages(saved.clone()))
        .await;

    assert_eq!(session.messages(), saved);
    assert!(session.room_data().is_none());
    assert!(!session.is_loading());
}

#[tokio::test]
async fn new_chat_with_list_synthesizes_snapshot_without_fetching() {
    let (session, _events) = session_over(FailingSource, SessionConfig::default());
    session
        .open_room(
            Room::new("n", DataSource::NewChat)
                .with_counterpart("bob@mail.com", "Bob")
                .with_messages(vec![]),
        )
        .await;

    let data = session.room_data().unwrap();
    assert_eq!(data.participant.len(), 2);
    assert_eq!(data.participant[0].name, CURRENT_USER_NAME);
    assert_eq!(data.participant[0].role, 2);
    assert_eq!(data.participant[1].id, "bob@mail.com");
    assert_eq!(data.participant[1].role, 1);
}

// ---------------------------------------------------------------------------
// Fresh rooms
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_new_chat_is_persisted_empty() {
    let (session, mut events) = session();
    session
        .open_room(Room::new("n", DataSource::NewChat).with_counterpart("bob@mail.com", "Bob"))
        .await;

    assert!(session.messages().is_empty());
    assert_eq!(session.host().saved_messages("n"), Some(vec![]));
    assert_eq!(
        events.try_recv().ok(),
        Some(ChatEvent::RoomLoaded {
            room_id: "n".into(),
            message_count: 0
        })
    );
}

#[tokio::test]
async fn dummy_room_loads_first_five_comments() {
    let (session, _events) = session();
    session.open_room(Room::new("d", DataSource::Dummy)).await;

    let messages = session.messages();
    assert_eq!(messages.len(), 5);
    assert_eq!(messages[0].id.as_str(), "885512");
    assert_eq!(messages[0].message, "Selamat malam");
    assert_eq!(messages[4].kind, MessageType::Image);
    assert!(messages[4].attachment.is_some());
    assert_eq!(session.host().saved_messages("d"), Some(messages));
}

#[tokio::test]
async fn dummy_limit_is_configurable() {
    let (session, _events) = session_over(
        DirFixtureSource::new(fixtures_dir()),
        SessionConfig {
            dummy_comment_limit: 2,
            ..SessionConfig::default()
        },
    );
    session.open_room(Room::new("d", DataSource::Dummy)).await;
    assert_eq!(session.messages().len(), 2);
}

#[tokio::test]
async fn extended_room_loads_all_comments() {
    let (session, _events) = session();
    session.open_room(Room::new("e", DataSource::Extended)).await;

    let messages = session.messages();
    assert_eq!(messages.len(), 8);
    assert_eq!(messages[2].kind, MessageType::Pdf);
    assert_eq!(messages[4].kind, MessageType::Video);
    // `message: null` decodes as empty text.
    assert_eq!(messages[7].message, "");
    assert_eq!(session.room_data().unwrap().participant.len(), 4);
    assert_eq!(session.participant_name("agent.b@mail.com"), "Agent B");
}

#[tokio::test]
async fn unknown_source_loads_nothing() {
    let (session, mut events) = session();
    session.open_room(Room::new("x", DataSource::Unknown)).await;

    assert!(session.messages().is_empty());
    assert!(session.room_data().is_none());
    assert!(!session.is_loading());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn missing_fixture_dir_leaves_state_unset() {
    let (session, _events) = session_over(
        DirFixtureSource::new("/nonexistent/chatsim-fixtures"),
        SessionConfig::default(),
    );
    session.open_room(Room::new("d", DataSource::Dummy)).await;

    assert!(session.messages().is_empty());
    assert!(session.room_data().is_none());
    assert!(!session.is_loading());
    assert_eq!(session.host().save_count(), 0);
}

#[tokio::test]
async fn reopening_same_room_keeps_snapshot() {
    let (session, _events) = session();
    session.open_room(Room::new("d", DataSource::Dummy)).await;
    let saved = session.host().saved_messages("d").unwrap();

    session
        .open_room(Room::new("d", DataSource::Dummy).with_messages(saved.clone()))
        .await;
    assert_eq!(session.messages(), saved);
    assert_eq!(session.host().save_count(), 1);
}

#[tokio::test]
async fn switching_rooms_replaces_list() {
    let (session, _events) = session();
    session.open_room(Room::new("d", DataSource::Dummy)).await;
    session.open_room(Room::new("x", DataSource::Unknown)).await;

    assert!(session.messages().is_empty());
    assert!(session.room_data().is_none());
    assert_eq!(session.current_room_id().as_deref(), Some("x"));
}
