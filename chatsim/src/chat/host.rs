//! Outbound interface to the application that owns the rooms.
//!
//! The chat session never owns persistence. After every mutation that
//! should survive the session it hands the full message list to a
//! [`RoomHost`], and it reports room-summary changes and replies for rooms
//! that are not currently open the same way.

use std::collections::HashMap;

use parking_lot::Mutex;

use chatsim_proto::message::Message;

/// Calls the chat session makes into its owner.
///
/// Calls are fire-and-forget: they cannot fail from the session's point
/// of view.
pub trait RoomHost: Send + Sync {
    /// Persist the complete message list of a room.
    fn save_messages(&self, room_id: &str, messages: &[Message]);

    /// The room's last message changed (for a room list display).
    fn update_room(&self, room_id: &str, last_message: &str, timestamp: &str);

    /// A reply arrived for a room that is not open in the session.
    fn add_message_to_room(&self, room_id: &str, message: Message);
}

/// Last-message summary recorded by [`InMemoryRoomHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    /// Display text of the last message.
    pub last_message: String,
    /// Timestamp of the last message.
    pub timestamp: String,
}

#[derive(Debug, Default)]
struct HostState {
    saved: HashMap<String, Vec<Message>>,
    summaries: HashMap<String, RoomSummary>,
    deliveries: Vec<(String, Message)>,
    save_count: usize,
}

/// In-memory [`RoomHost`] that behaves like a room list: saved lists are
/// kept per room, and out-of-focus deliveries are appended to the owning
/// room's saved list.
#[derive(Debug, Default)]
pub struct InMemoryRoomHost {
    state: Mutex<HostState>,
}

impl InMemoryRoomHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved message list of a room.
    #[must_use]
    pub fn saved_messages(&self, room_id: &str) -> Option<Vec<Message>> {
        self.state.lock().saved.get(room_id).cloned()
    }

    /// The last summary reported for a room.
    #[must_use]
    pub fn summary(&self, room_id: &str) -> Option<RoomSummary> {
        self.state.lock().summaries.get(room_id).cloned()
    }

    /// Every out-of-focus delivery, in arrival order.
    #[must_use]
    pub fn deliveries(&self) -> Vec<(String, Message)> {
        self.state.lock().deliveries.clone()
    }

    /// Total number of `save_messages` calls.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.state.lock().save_count
    }
}

impl RoomHost for InMemoryRoomHost {
    fn save_messages(&self, room_id: &str, messages: &[Message]) {
        let mut state = self.state.lock();
        state.saved.insert(room_id.to_string(), messages.to_vec());
        state.save_count += 1;
    }

    fn update_room(&self, room_id: &str, last_message: &str, timestamp: &str) {
        self.state.lock().summaries.insert(
            room_id.to_string(),
            RoomSummary {
                last_message: last_message.to_string(),
                timestamp: timestamp.to_string(),
            },
        );
    }

    fn add_message_to_room(&self, room_id: &str, message: Message) {
        let mut state = self.state.lock();
        state
            .saved
            .entry(room_id.to_string())
            .or_default()
            .push(message.clone());
        state.deliveries.push((room_id.to_string(), message));
    }
}
