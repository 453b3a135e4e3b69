//! Room and participant types.
//!
//! A [`Room`] is owned by the host application and handed to the chat
//! session read-only. [`RoomData`] is the participant snapshot the session
//! derives for it, either synthesized or read from a fixture.

use serde::{Deserialize, Deserializer, Serialize};

use crate::message::Message;

/// Identity of the local user in every room.
pub const CURRENT_USER_ID: &str = "customer@mail.com";

/// Display name of the local user.
pub const CURRENT_USER_NAME: &str = "Naufal Labib";

/// Fixed agent identity that answers in `dummy` rooms.
pub const DUMMY_AGENT_ID: &str = "agent@mail.com";

/// Participant role of the local user in synthesized rooms.
pub const ROLE_CUSTOMER: u32 = 2;

/// Participant role of the counterpart in synthesized rooms.
pub const ROLE_COUNTERPART: u32 = 1;

/// Where a room's messages and participants come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataSource {
    /// A conversation started locally; participants are synthesized.
    NewChat,
    /// The small demo fixture (`dummy-data.json`).
    Dummy,
    /// The multi-participant fixture (`extended-data.json`).
    Extended,
    /// Any other tag. Such rooms never load data and never get replies.
    Unknown,
}

impl DataSource {
    /// Parses a data source tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "new-chat" => Self::NewChat,
            "dummy" => Self::Dummy,
            "extended" => Self::Extended,
            _ => Self::Unknown,
        }
    }

    /// Returns the tag used in room records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NewChat => "new-chat",
            Self::Dummy => "dummy",
            Self::Extended => "extended",
            Self::Unknown => "unknown",
        }
    }

    /// File name of the fixture backing this source, if any.
    #[must_use]
    pub const fn fixture_file(self) -> Option<&'static str> {
        match self {
            Self::Dummy => Some("dummy-data.json"),
            Self::Extended => Some("extended-data.json"),
            Self::NewChat | Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DataSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

/// A member of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant id (an e-mail address in the fixtures).
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Numeric role tag.
    #[serde(default)]
    pub role: u32,
    /// Avatar URL, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Participant {
    /// Creates a participant without an avatar.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            avatar: None,
        }
    }
}

/// Room record as supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Room identifier.
    pub id: String,
    /// Backing data source.
    pub data_source: DataSource,
    /// Counterpart user id (`new-chat` rooms).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Room or counterpart display name.
    #[serde(default)]
    pub name: String,
    /// Room avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Participants known to the host, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<Vec<Participant>>,
    /// Previously saved messages. `Some(vec![])` means "loaded, empty".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
}

impl Room {
    /// Creates a room with no saved messages and no participant list.
    #[must_use]
    pub fn new(id: impl Into<String>, data_source: DataSource) -> Self {
        Self {
            id: id.into(),
            data_source,
            user_id: None,
            name: String::new(),
            avatar: None,
            participant: None,
            messages: None,
        }
    }

    /// Sets the counterpart user and display name.
    #[must_use]
    pub fn with_counterpart(mut self, user_id: impl Into<String>, name: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self.name = name.into();
        self
    }

    /// Sets the saved message list.
    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Sets the host-supplied participant list.
    #[must_use]
    pub fn with_participants(mut self, participants: Vec<Participant>) -> Self {
        self.participant = Some(participants);
        self
    }
}

/// Participant snapshot derived for a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomData {
    /// Fixture room id, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    /// Fixture room name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Room members.
    #[serde(default)]
    pub participant: Vec<Participant>,
}

impl RoomData {
    /// Two-party snapshot for a `new-chat` room: the local user plus the
    /// room's counterpart.
    #[must_use]
    pub fn two_party(room: &Room) -> Self {
        Self {
            id: None,
            name: None,
            participant: vec![
                Participant::new(CURRENT_USER_ID, CURRENT_USER_NAME, ROLE_CUSTOMER),
                Participant::new(
                    room.user_id.clone().unwrap_or_default(),
                    room.name.clone(),
                    ROLE_COUNTERPART,
                ),
            ],
        }
    }

    /// Looks up a participant by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Participant> {
        self.participant.iter().find(|p| p.id == id)
    }
}
