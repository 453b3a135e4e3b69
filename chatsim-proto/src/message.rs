//! Message types shared by the chat session, the reply scheduler, and the
//! fixture format.
//!
//! Messages are plain JSON-shaped records. Fixture files written by hand
//! are not always tidy, so decoding is lenient: numeric ids are accepted,
//! unknown message types fall back to [`MessageType::Text`], and `null`
//! text fields decode as empty strings.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

/// Exclusive upper bound of the random suffix in generated ids.
const ID_RANDOM_BOUND: u32 = 10_000;

/// Unique identifier for a message.
///
/// Generated ids have the form `msg_<unix-millis>_<counter>_<random>`.
/// Ids loaded from fixtures are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generates a fresh id from the process-wide generator.
    #[must_use]
    pub fn generate() -> Self {
        GLOBAL_IDS.next_id()
    }

    /// Wraps an existing id string.
    #[must_use]
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the counter component of a generated id.
    ///
    /// `None` for ids that were not produced by a [`MessageIdGenerator`].
    #[must_use]
    pub fn counter(&self) -> Option<u64> {
        let mut parts = self.0.strip_prefix("msg_")?.split('_');
        let _millis = parts.next()?;
        parts.next()?.parse().ok()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Unsigned(n) => Self(n.to_string()),
            RawId::Signed(n) => Self(n.to_string()),
        })
    }
}

/// Produces unique message ids from a monotonic counter, the wall clock,
/// and a random suffix.
#[derive(Debug, Default)]
pub struct MessageIdGenerator {
    counter: AtomicU64,
}

impl MessageIdGenerator {
    /// Creates a generator whose first id carries counter `1`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }

    /// Produces the next id. The counter component strictly increases.
    #[must_use]
    pub fn next_id(&self) -> MessageId {
        let counter = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let millis = Utc::now().timestamp_millis();
        let suffix = rand::rng().random_range(0..ID_RANDOM_BOUND);
        MessageId(format!("msg_{millis}_{counter}_{suffix}"))
    }

    /// Resets the counter so the next id carries counter `1` again.
    pub fn reset(&self) {
        self.counter.store(0, Ordering::Relaxed);
    }

    /// Returns the counter value of the most recently issued id.
    #[must_use]
    pub fn last_counter(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

static GLOBAL_IDS: MessageIdGenerator = MessageIdGenerator::new();

/// Kind of content a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Plain text.
    #[default]
    Text,
    /// Image attachment.
    Image,
    /// Video attachment.
    Video,
    /// PDF document attachment.
    Pdf,
}

impl MessageType {
    /// Parses a type tag. Unrecognized tags map to [`MessageType::Text`].
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "image" => Self::Image,
            "video" => Self::Video,
            "pdf" => Self::Pdf,
            _ => Self::Text,
        }
    }

    /// Returns the lowercase tag used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MessageType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = Option::<String>::deserialize(deserializer)?;
        Ok(tag.as_deref().map_or(Self::Text, Self::from_tag))
    }
}

/// File payload attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Location of the file contents (a data URL for local files).
    pub url: String,
    /// Original file name.
    pub file_name: String,
    /// Size in bytes.
    pub file_size: u64,
    /// MIME type reported for the file.
    pub mime_type: String,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier.
    pub id: MessageId,
    /// Content kind.
    #[serde(rename = "type", default)]
    pub kind: MessageType,
    /// Text body (may be empty for attachment-only messages).
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    /// Participant id of the author.
    #[serde(default, deserialize_with = "null_as_default")]
    pub sender: String,
    /// ISO-8601 creation time.
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,
    /// Attached file, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

impl Message {
    /// Builds a new message with a generated id and the current time.
    #[must_use]
    pub fn new(kind: MessageType, text: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            kind,
            message: text.into(),
            sender: sender.into(),
            timestamp: now_timestamp(),
            attachment: None,
        }
    }

    /// Attaches a file payload.
    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }
}

/// Current UTC time as ISO-8601 with millisecond precision and a `Z` suffix.
#[must_use]
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
