//! Room-level helpers for the chat session: fixture resolution and
//! participant display names.

use chatsim_proto::message::Message;
use chatsim_proto::room::{DataSource, Room, RoomData};

use crate::fixtures::FixtureSource;

/// History read from a fixture for a room without saved messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureHistory {
    /// `results[0].room`, if the fixture has one.
    pub room_data: Option<RoomData>,
    /// `results[0].comments`, truncated for `dummy` rooms.
    pub messages: Vec<Message>,
}

/// Reads the participant snapshot for a fixture-backed room.
///
/// Failures are logged and yield `None`.
pub async fn fetch_room_data<F: FixtureSource>(
    fixtures: &F,
    source: DataSource,
) -> Option<RoomData> {
    match fixtures.load(source).await {
        Ok(doc) => doc.first_room().cloned(),
        Err(e) => {
            tracing::warn!(source = %source, error = %e, "failed to load room data");
            None
        }
    }
}

/// Reads the conversation history for a fixture-backed room.
///
/// `dummy` rooms keep at most `dummy_limit` comments, `extended` rooms
/// keep all of them. Failures and fixtures without comments are logged
/// and yield `None`.
pub async fn fetch_history<F: FixtureSource>(
    fixtures: &F,
    source: DataSource,
    dummy_limit: usize,
) -> Option<FixtureHistory> {
    let doc = match fixtures.load(source).await {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(source = %source, error = %e, "failed to load messages");
            return None;
        }
    };

    let Some(first) = doc.first() else {
        tracing::warn!(source = %source, "fixture has no results");
        return None;
    };
    let Some(comments) = first.comments.as_ref() else {
        tracing::warn!(source = %source, "fixture result has no comments");
        return None;
    };

    let messages = match source {
        DataSource::Dummy => comments.iter().take(dummy_limit).cloned().collect(),
        _ => comments.clone(),
    };

    Some(FixtureHistory {
        room_data: first.room.clone(),
        messages,
    })
}

/// Display name for a message sender.
///
/// Checks the `new-chat` counterpart, then the participant snapshot, then
/// derives a name from an e-mail local part (`john.doe@x` → `John doe`),
/// and finally falls back to the raw id.
#[must_use]
pub fn participant_name(room: &Room, room_data: Option<&RoomData>, sender: &str) -> String {
    if room.data_source == DataSource::NewChat && room.user_id.as_deref() == Some(sender) {
        return room.name.clone();
    }

    if let Some(participant) = room_data.and_then(|data| data.find(sender)) {
        return participant.name.clone();
    }

    if let Some((user, _)) = sender.split_once('@') {
        let mut chars = user.chars();
        return chars.next().map_or_else(String::new, |first| {
            first
                .to_uppercase()
                .chain(chars.as_str().replace('.', " ").chars())
                .collect()
        });
    }

    sender.to_string()
}
