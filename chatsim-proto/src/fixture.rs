//! JSON fixture format.
//!
//! A fixture is shaped `{"results": [{"room": {...}, "comments": [...]}]}`.
//! Only the first result is ever consulted; both of its fields are
//! optional so that a partially filled fixture still yields whatever it
//! does contain.

use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::room::RoomData;

/// Error type for fixture decode/encode operations.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    /// The bytes are not a valid fixture document.
    #[error("fixture decode error: {0}")]
    Decode(String),
    /// The document could not be serialized.
    #[error("fixture encode error: {0}")]
    Encode(String),
}

/// One entry of a fixture's `results` array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureResult {
    /// Participant snapshot for the room.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomData>,
    /// Conversation history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Message>>,
}

/// Top-level fixture document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureDocument {
    /// Result entries; only the first is used.
    #[serde(default)]
    pub results: Vec<FixtureResult>,
}

impl FixtureDocument {
    /// Builds a single-result document.
    #[must_use]
    pub fn single(room: Option<RoomData>, comments: Option<Vec<Message>>) -> Self {
        Self {
            results: vec![FixtureResult { room, comments }],
        }
    }

    /// The first result, if the document has any.
    #[must_use]
    pub fn first(&self) -> Option<&FixtureResult> {
        self.results.first()
    }

    /// `results[0].room`, if present.
    #[must_use]
    pub fn first_room(&self) -> Option<&RoomData> {
        self.first()?.room.as_ref()
    }

    /// `results[0].comments`, if present.
    #[must_use]
    pub fn first_comments(&self) -> Option<&[Message]> {
        self.first()?.comments.as_deref()
    }
}

/// Decodes a fixture document from JSON bytes.
///
/// # Errors
///
/// Returns `FixtureError::Decode` if the bytes are not valid JSON or do
/// not match the fixture shape.
pub fn decode(bytes: &[u8]) -> Result<FixtureDocument, FixtureError> {
    serde_json::from_slice(bytes).map_err(|e| FixtureError::Decode(e.to_string()))
}

/// Encodes a fixture document as pretty-printed JSON.
///
/// # Errors
///
/// Returns `FixtureError::Encode` if serialization fails.
pub fn encode(document: &FixtureDocument) -> Result<Vec<u8>, FixtureError> {
    serde_json::to_vec_pretty(document).map_err(|e| FixtureError::Encode(e.to_string()))
}
