//! Integration tests for searching a loaded room and sending staged files.
//!
//! Verifies:
//! 1. Search runs over the session's list, including replies that arrive
//!    after the first search, and navigation wraps both ways.
//! 2. A file staged from disk is sent as a typed attachment with a data URL,
//!    persisted, and summarised with the paperclip placeholder.
//! 3. A failed stage leaves the previous selection in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chatsim::chat::{ChatSession, SessionConfig};
use chatsim::chat::host::InMemoryRoomHost;
use chatsim::chat::search::MessageSearch;
use chatsim::chat::staging::{FileStaging, StagingError};
use chatsim::fixtures::DirFixtureSource;
use chatsim::reply::picker::DOCUMENT_REPLY;
use chatsim::reply::{AutoReplyScheduler, ReplyTiming};
use chatsim_proto::message::MessageType;
use chatsim_proto::room::{DataSource, Room};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../fixtures")
}

fn session() -> ChatSession<InMemoryRoomHost, DirFixtureSource> {
    ChatSession::new(
        Arc::new(InMemoryRoomHost::new()),
        DirFixtureSource::new(fixtures_dir()),
        Arc::new(AutoReplyScheduler::new(ReplyTiming::fixed(
            Duration::from_millis(100),
            Duration::from_millis(100),
        ))),
        SessionConfig::default(),
    )
    .0
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn search_over_extended_room() {
    let session = session();
    session.open_room(Room::new("e", DataSource::Extended)).await;

    let mut search = MessageSearch::new();
    search.toggle();
    search.set_query("HALO", &session.messages());

    let indices: Vec<usize> = search.results().iter().map(|h| h.index).collect();
    assert_eq!(indices, vec![0, 1]);
    assert_eq!(search.cursor(), Some(0));

    assert_eq!(search.next_match(), Some(1));
    assert_eq!(search.next_match(), Some(0));
    assert_eq!(search.prev_match(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn search_sees_new_replies_after_rerun() {
    let session = session();
    session
        .open_room(
            Room::new("n", DataSource::NewChat)
                .with_counterpart("bob@mail.com", "Bob")
                .with_messages(vec![]),
        )
        .await;

    session.send_message("kirim file dong", None);
    let mut search = MessageSearch::new();
    search.set_query("dokumen", &session.messages());
    assert!(search.results().is_empty());

    tokio::time::sleep(Duration::from_millis(300)).await;
    search.perform_search(&session.messages());

    assert_eq!(search.results().len(), 1);
    assert_eq!(search.current().unwrap().message.message, DOCUMENT_REPLY);
    assert_eq!(search.current().unwrap().index, 1);
}

#[tokio::test(start_paused = true)]
async fn hiding_search_clears_it() {
    let session = session();
    session.open_room(Room::new("d", DataSource::Dummy)).await;

    let mut search = MessageSearch::new();
    search.toggle();
    search.set_query("malam", &session.messages());
    assert_eq!(search.results().len(), 2);

    search.toggle();
    assert!(search.results().is_empty());
    assert_eq!(search.next_match(), None);
}

// ---------------------------------------------------------------------------
// Staging
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn staged_pdf_from_disk_is_sent_as_attachment() {
    let session = session();
    session
        .open_room(
            Room::new("n", DataSource::NewChat)
                .with_counterpart("bob@mail.com", "Bob")
                .with_messages(vec![]),
        )
        .await;

    let mut staging = FileStaging::new();
    staging
        .stage_path(&fixtures_dir().join("dummy-data.json"), "application/pdf")
        .await
        .unwrap();
    assert!(staging.has_preview());

    let sent = session.send_staged("", &mut staging).unwrap();
    assert_eq!(sent.kind, MessageType::Pdf);
    let attachment = sent.attachment.as_ref().unwrap();
    assert_eq!(attachment.file_name, "dummy-data.json");
    assert_eq!(attachment.mime_type, "application/pdf");
    assert!(attachment.file_size > 0);
    assert!(attachment.url.starts_with("data:application/pdf;base64,"));

    let host = session.host();
    assert_eq!(host.summary("n").unwrap().last_message, "📎 dummy-data.json");
    assert_eq!(host.saved_messages("n").unwrap(), vec![sent]);
    assert!(staging.selected().is_none());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(session.messages()[1].message, DOCUMENT_REPLY);
}

#[tokio::test(start_paused = true)]
async fn caption_is_the_room_summary() {
    let session = session();
    session
        .open_room(
            Room::new("n", DataSource::NewChat)
                .with_counterpart("bob@mail.com", "Bob")
                .with_messages(vec![]),
        )
        .await;

    let mut staging = FileStaging::new();
    staging
        .stage_path(&fixtures_dir().join("extended-data.json"), "image/jpeg")
        .await
        .unwrap();
    let sent = session.send_staged("ini fotonya", &mut staging).unwrap();

    assert_eq!(sent.kind, MessageType::Image);
    assert_eq!(sent.message, "ini fotonya");
    assert_eq!(
        session.host().summary("n").unwrap().last_message,
        "ini fotonya"
    );
}

#[tokio::test]
async fn failed_stage_keeps_previous_selection() {
    let mut staging = FileStaging::new();
    staging
        .stage_path(&fixtures_dir().join("dummy-data.json"), "application/json")
        .await
        .unwrap();

    let err = staging
        .stage_path(Path::new("/nonexistent/x.png"), "image/png")
        .await
        .unwrap_err();
    assert!(matches!(err, StagingError::Read { .. }));
    assert_eq!(
        staging.selected().map(|f| f.name.as_str()),
        Some("dummy-data.json")
    );
}
