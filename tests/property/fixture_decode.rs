//! Property-based tests for the fixture format and message ids.
//!
//! Uses proptest to verify:
//! 1. Random bytes never cause a panic in `decode` (returns `Err` gracefully).
//! 2. Any generated fixture survives encode → decode.
//! 3. Comment ids decode to the same string whether written as JSON
//!    numbers or strings, and unknown type tags decode as text.
//! 4. Generated message ids are distinct with a strictly increasing counter.

use std::collections::HashSet;

use proptest::prelude::*;

use chatsim_proto::fixture::{self, FixtureDocument};
use chatsim_proto::message::{Attachment, Message, MessageId, MessageIdGenerator, MessageType};
use chatsim_proto::room::{Participant, RoomData};

// --- Strategies ---

/// Strategy for generating arbitrary `MessageType` values.
fn arb_message_type() -> impl Strategy<Value = MessageType> {
    prop_oneof![
        Just(MessageType::Text),
        Just(MessageType::Image),
        Just(MessageType::Video),
        Just(MessageType::Pdf),
    ]
}

/// Strategy for generating arbitrary `Attachment` values.
fn arb_attachment() -> impl Strategy<Value = Attachment> {
    ("[a-z]{1,12}", "[a-z]{1,8}\\.[a-z]{3}", any::<u32>(), "[a-z]{1,8}/[a-z]{1,8}").prop_map(
        |(url, file_name, size, mime_type)| Attachment {
            url: format!("https://cdn.example/{url}"),
            file_name,
            file_size: u64::from(size),
            mime_type,
        },
    )
}

/// Strategy for generating arbitrary `Message` values.
fn arb_message() -> impl Strategy<Value = Message> {
    (
        "[a-z0-9_]{1,20}",
        arb_message_type(),
        ".{0,64}",
        "[a-z]{1,8}@mail\\.com",
        prop::option::of(arb_attachment()),
    )
        .prop_map(|(id, kind, text, sender, attachment)| Message {
            id: MessageId::from_string(id),
            kind,
            message: text,
            sender,
            timestamp: "2024-01-01T10:00:00.000Z".to_string(),
            attachment,
        })
}

/// Strategy for generating arbitrary `RoomData` values.
fn arb_room_data() -> impl Strategy<Value = RoomData> {
    (
        prop::option::of("[A-Za-z ]{1,20}"),
        prop::collection::vec(("[a-z]{1,8}@mail\\.com", "[A-Za-z ]{1,16}", 0u32..3), 0..5),
    )
        .prop_map(|(name, participants)| RoomData {
            id: None,
            name,
            participant: participants
                .into_iter()
                .map(|(id, name, role)| Participant::new(id, name, role))
                .collect(),
        })
}

/// Strategy for generating arbitrary `FixtureDocument` values.
fn arb_document() -> impl Strategy<Value = FixtureDocument> {
    (
        prop::option::of(arb_room_data()),
        prop::option::of(prop::collection::vec(arb_message(), 0..8)),
    )
        .prop_map(|(room, comments)| FixtureDocument::single(room, comments))
}

// --- Property tests ---

proptest! {
    #[test]
    fn decode_random_bytes_never_panics(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = fixture::decode(&data);
    }

    #[test]
    fn decode_random_json_text_never_panics(text in "[\\[\\]{}\":,0-9a-z ]{0,128}") {
        let _ = fixture::decode(text.as_bytes());
    }

    #[test]
    fn document_round_trip(doc in arb_document()) {
        let bytes = fixture::encode(&doc).unwrap();
        let decoded = fixture::decode(&bytes).unwrap();
        prop_assert_eq!(decoded, doc);
    }

    #[test]
    fn numeric_and_string_ids_agree(id in any::<u64>()) {
        let numeric = format!(r#"{{"results":[{{"comments":[{{"id":{id},"type":"text","message":"m","sender":"s","timestamp":"t"}}]}}]}}"#);
        let string = format!(r#"{{"results":[{{"comments":[{{"id":"{id}","type":"text","message":"m","sender":"s","timestamp":"t"}}]}}]}}"#);

        let a = fixture::decode(numeric.as_bytes()).unwrap();
        let b = fixture::decode(string.as_bytes()).unwrap();
        prop_assert_eq!(a.first_comments(), b.first_comments());
        prop_assert_eq!(a.first_comments().unwrap()[0].id.to_string(), id.to_string());
    }

    #[test]
    fn unknown_type_tags_decode_as_text(tag in "[a-z]{1,10}") {
        prop_assume!(!["text", "image", "video", "pdf"].contains(&tag.as_str()));
        let json = format!(r#"{{"results":[{{"comments":[{{"id":"x","type":"{tag}","message":"m","sender":"s","timestamp":"t"}}]}}]}}"#);
        let doc = fixture::decode(json.as_bytes()).unwrap();
        prop_assert_eq!(doc.first_comments().unwrap()[0].kind, MessageType::Text);
    }

    #[test]
    fn generated_ids_are_unique_and_ordered(n in 1usize..200) {
        let ids = MessageIdGenerator::new();
        let mut seen = HashSet::new();
        let mut last = 0;
        for _ in 0..n {
            let id = ids.next_id();
            let counter = id.counter().unwrap();
            prop_assert!(counter > last);
            last = counter;
            prop_assert!(seen.insert(id));
        }
        prop_assert_eq!(ids.last_counter(), n as u64);
    }
}
