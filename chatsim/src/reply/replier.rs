//! Choosing which participant answers an outgoing message.

use rand::seq::IndexedRandom;

use chatsim_proto::room::{CURRENT_USER_ID, DUMMY_AGENT_ID, DataSource, Participant, Room};

/// The parts of a room that decide who replies.
#[derive(Debug, Clone, Copy)]
pub struct ReplierContext<'a> {
    /// Backing data source.
    pub data_source: DataSource,
    /// Counterpart user id (`new-chat` rooms).
    pub user_id: Option<&'a str>,
    /// Known participants, if any.
    pub participants: Option<&'a [Participant]>,
}

impl<'a> ReplierContext<'a> {
    /// Context for a room using its own participant list.
    #[must_use]
    pub fn from_room(room: &'a Room) -> Self {
        Self {
            data_source: room.data_source,
            user_id: room.user_id.as_deref(),
            participants: room.participant.as_deref(),
        }
    }

    /// Replaces the participant list (e.g. with a loaded snapshot).
    #[must_use]
    pub const fn with_participants(mut self, participants: Option<&'a [Participant]>) -> Self {
        self.participants = participants;
        self
    }
}

/// Resolves the participant that should auto-reply, or `None` when the
/// room gets no reply.
#[must_use]
pub fn select_replier(ctx: &ReplierContext<'_>) -> Option<String> {
    match ctx.data_source {
        DataSource::Dummy => Some(DUMMY_AGENT_ID.to_string()),
        DataSource::NewChat => ctx.user_id.map(str::to_string),
        DataSource::Extended => {
            let others: Vec<&Participant> = ctx
                .participants?
                .iter()
                .filter(|p| p.id != CURRENT_USER_ID)
                .collect();
            others.choose(&mut rand::rng()).map(|p| p.id.clone())
        }
        DataSource::Unknown => None,
    }
}
