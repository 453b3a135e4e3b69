//! Chat session layer for chatsim.
//!
//! Contains the [`ChatSession`], which owns the open room's message list,
//! loads rooms from their data source, runs the send pipeline
//! (validate -> append -> persist -> announce -> auto-reply), and applies
//! auto-reply side effects back onto the right room.

pub mod host;
pub mod room;
pub mod search;
pub mod staging;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use chatsim_proto::message::{Message, MessageType};
use chatsim_proto::room::{CURRENT_USER_ID, DataSource, Room, RoomData};

use crate::fixtures::FixtureSource;
use crate::reply::{
    AutoReplyScheduler, ReplierContext, ReplyCallbacks, ReplyRequest, select_replier,
};

use host::RoomHost;
use staging::{FileStaging, PreparedAttachment};

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Capacity of the [`ChatEvent`] channel.
    pub event_buffer: usize,
    /// Number of fixture comments kept for `dummy` rooms.
    pub dummy_comment_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            event_buffer: 64,
            dummy_comment_limit: 5,
        }
    }
}

/// Events emitted by the [`ChatSession`] for a display layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A room finished loading.
    RoomLoaded {
        /// The loaded room.
        room_id: String,
        /// Number of messages in its list.
        message_count: usize,
    },
    /// A message was appended to the open room.
    MessageAppended {
        /// The open room.
        room_id: String,
        /// The new message.
        message: Message,
    },
    /// The replier started typing in the open room.
    TypingStarted {
        /// The open room.
        room_id: String,
        /// Who is typing.
        sender: String,
    },
    /// The replier stopped typing in the open room.
    TypingStopped {
        /// The open room.
        room_id: String,
    },
    /// A reply arrived for a room that is not open and was handed to the
    /// host.
    DeliveredElsewhere {
        /// The room the reply belongs to.
        room_id: String,
        /// The reply.
        message: Message,
    },
}

#[derive(Debug, Default)]
struct SessionState {
    room: Option<Room>,
    messages: Vec<Message>,
    room_data: Option<RoomData>,
    is_loading: bool,
    typing_sender: Option<String>,
}

impl SessionState {
    fn room_id(&self) -> Option<&str> {
        self.room.as_ref().map(|r| r.id.as_str())
    }

    fn is_open(&self, room_id: &str) -> bool {
        self.room_id() == Some(room_id)
    }
}

/// State shared between the session and the reply callbacks it hands to
/// the scheduler.
struct SessionShared<H> {
    state: Mutex<SessionState>,
    host: Arc<H>,
    event_tx: mpsc::Sender<ChatEvent>,
}

impl<H: RoomHost> SessionShared<H> {
    fn emit(&self, event: ChatEvent) {
        // Best effort: a slow or absent display layer must not stall the
        // session.
        let _ = self.event_tx.try_send(event);
    }
}

/// Manages one open room at a time on behalf of a host application.
///
/// The session never holds its state lock across an `.await` or while
/// calling into the scheduler, so reply callbacks can always take it.
pub struct ChatSession<H: RoomHost + 'static, F: FixtureSource> {
    shared: Arc<SessionShared<H>>,
    fixtures: F,
    scheduler: Arc<AutoReplyScheduler>,
    config: SessionConfig,
}

impl<H: RoomHost + 'static, F: FixtureSource> ChatSession<H, F> {
    /// Creates a session with no room open.
    ///
    /// Returns the session and a receiver for [`ChatEvent`]s.
    pub fn new(
        host: Arc<H>,
        fixtures: F,
        scheduler: Arc<AutoReplyScheduler>,
        config: SessionConfig,
    ) -> (Self, mpsc::Receiver<ChatEvent>) {
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer);
        let session = Self {
            shared: Arc::new(SessionShared {
                state: Mutex::new(SessionState::default()),
                host,
                event_tx,
            }),
            fixtures,
            scheduler,
            config,
        };
        (session, event_rx)
    }

    /// Opens `room` and loads its messages.
    ///
    /// Switching to a different room clears the typing indicator and the
    /// previous room's list and participant snapshot. Reply sequences of
    /// the previous room keep running and deliver through the host.
    pub async fn open_room(&self, room: Room) {
        {
            let mut state = self.shared.state.lock();
            if state.room_id() != Some(room.id.as_str()) {
                state.typing_sender = None;
                state.messages.clear();
                state.room_data = None;
            }
            state.room = Some(room);
        }
        self.load_messages().await;
    }

    /// Materializes the open room's message list and participant snapshot.
    ///
    /// - A room that already carries a list (even an empty one) keeps it
    ///   verbatim; only the participant snapshot is resolved.
    /// - A `new-chat` room without a list starts empty and is persisted.
    /// - A `dummy`/`extended` room without a list is filled from its
    ///   fixture and persisted.
    ///
    /// Failures are logged and leave the state unset. The loading flag is
    /// always cleared.
    pub async fn load_messages(&self) {
        let room = {
            let mut state = self.shared.state.lock();
            let Some(room) = state.room.clone() else {
                return;
            };
            state.is_loading = true;
            room
        };

        if let Some(saved) = room.messages.as_ref() {
            let room_data = match room.data_source {
                DataSource::NewChat => Some(RoomData::two_party(&room)),
                DataSource::Dummy | DataSource::Extended => {
                    room::fetch_room_data(&self.fixtures, room.data_source).await
                }
                DataSource::Unknown => None,
            };
            self.finish_load(&room.id, Some(saved.clone()), room_data, false);
            return;
        }

        match room.data_source {
            DataSource::NewChat => {
                self.finish_load(&room.id, Some(Vec::new()), Some(RoomData::two_party(&room)), true);
            }
            DataSource::Dummy | DataSource::Extended => {
                let history = room::fetch_history(
                    &self.fixtures,
                    room.data_source,
                    self.config.dummy_comment_limit,
                )
                .await;
                match history {
                    Some(history) => {
                        self.finish_load(&room.id, Some(history.messages), history.room_data, true);
                    }
                    None => self.finish_load(&room.id, None, None, false),
                }
            }
            DataSource::Unknown => {
                tracing::debug!(room_id = %room.id, "unknown data source, nothing to load");
                self.finish_load(&room.id, None, None, false);
            }
        }
    }

    fn finish_load(
        &self,
        room_id: &str,
        messages: Option<Vec<Message>>,
        room_data: Option<RoomData>,
        persist: bool,
    ) {
        let mut state = self.shared.state.lock();
        if !state.is_open(room_id) {
            tracing::debug!(room_id, "room changed while loading, discarding result");
            return;
        }
        state.is_loading = false;
        if room_data.is_some() {
            state.room_data = room_data;
        }
        let Some(messages) = messages else {
            return;
        };
        state.messages = messages;
        let count = state.messages.len();
        let snapshot = persist.then(|| state.messages.clone());
        drop(state);

        if let Some(list) = snapshot {
            self.shared.host.save_messages(room_id, &list);
        }
        tracing::info!(room_id, message_count = count, "room loaded");
        self.shared.emit(ChatEvent::RoomLoaded {
            room_id: room_id.to_string(),
            message_count: count,
        });
    }

    /// Sends a message from the local user into the open room.
    ///
    /// Returns `None` without side effects when the text is blank and
    /// there is no attachment, or when no room is open.
    pub fn send_message(
        &self,
        text: &str,
        attachment: Option<PreparedAttachment>,
    ) -> Option<Message> {
        if text.trim().is_empty() && attachment.is_none() {
            return None;
        }

        let kind = attachment
            .as_ref()
            .map_or(MessageType::Text, PreparedAttachment::message_type);
        let mut msg = Message::new(kind, text, CURRENT_USER_ID);
        if let Some(prepared) = attachment.as_ref() {
            msg = msg.with_attachment(prepared.data.clone());
        }

        let (room, room_data, list) = {
            let mut state = self.shared.state.lock();
            let Some(room) = state.room.clone() else {
                tracing::warn!("send without an open room ignored");
                return None;
            };
            state.messages.push(msg.clone());
            (room, state.room_data.clone(), state.messages.clone())
        };

        let host = &self.shared.host;
        host.save_messages(&room.id, &list);

        let display = if msg.message.is_empty() {
            let name = attachment
                .as_ref()
                .map(|a| a.data.file_name.as_str())
                .filter(|n| !n.is_empty())
                .unwrap_or("File");
            format!("📎 {name}")
        } else {
            msg.message.clone()
        };
        host.update_room(&room.id, &display, &msg.timestamp);

        self.shared.emit(ChatEvent::MessageAppended {
            room_id: room.id.clone(),
            message: msg.clone(),
        });

        let context = if text.is_empty() {
            format!("{kind} file")
        } else {
            text.to_string()
        };
        self.trigger_auto_reply(&room, room_data.as_ref(), context, kind);

        Some(msg)
    }

    /// Sends the staged file (if any) with `caption`, clearing the staging
    /// area once the message is sent.
    pub fn send_staged(&self, caption: &str, staging: &mut FileStaging) -> Option<Message> {
        let prepared = staging.prepare(caption);
        let sent = self.send_message(caption, prepared);
        if sent.is_some() {
            staging.cancel();
        }
        sent
    }

    fn trigger_auto_reply(
        &self,
        room: &Room,
        room_data: Option<&RoomData>,
        user_message: String,
        message_type: MessageType,
    ) {
        let participants = room_data
            .map(|d| d.participant.as_slice())
            .or(room.participant.as_deref());
        let ctx = ReplierContext::from_room(room).with_participants(participants);

        let Some(replier_id) = select_replier(&ctx) else {
            tracing::debug!(room_id = %room.id, "no replier resolvable");
            return;
        };

        let request = ReplyRequest {
            room_id: room.id.clone(),
            user_message,
            message_type,
            replier_id: Some(replier_id),
            current_room_id: self.current_room_id(),
        };
        let callbacks = SessionReplies {
            shared: Arc::clone(&self.shared),
        };
        self.scheduler.schedule(request, callbacks);
    }

    /// Persists the open room's current list through the host.
    pub fn save_to_room(&self) {
        let (room_id, list) = {
            let state = self.shared.state.lock();
            let Some(room_id) = state.room_id() else {
                return;
            };
            (room_id.to_string(), state.messages.clone())
        };
        self.shared.host.save_messages(&room_id, &list);
    }

    /// Clears the typing indicator.
    pub fn reset_chat_state(&self) {
        self.shared.state.lock().typing_sender = None;
    }

    /// Id of the open room.
    #[must_use]
    pub fn current_room_id(&self) -> Option<String> {
        self.shared.state.lock().room_id().map(str::to_string)
    }

    /// Snapshot of the open room's messages.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.shared.state.lock().messages.clone()
    }

    /// Participant snapshot of the open room.
    #[must_use]
    pub fn room_data(&self) -> Option<RoomData> {
        self.shared.state.lock().room_data.clone()
    }

    /// Whether a load is in progress.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.shared.state.lock().is_loading
    }

    /// Who is typing in the open room, if anyone.
    #[must_use]
    pub fn typing_sender(&self) -> Option<String> {
        self.shared.state.lock().typing_sender.clone()
    }

    /// Whether the typing indicator is shown.
    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.shared.state.lock().typing_sender.is_some()
    }

    /// Display name of a sender in the open room.
    #[must_use]
    pub fn participant_name(&self, sender: &str) -> String {
        let state = self.shared.state.lock();
        state.room.as_ref().map_or_else(
            || sender.to_string(),
            |r| room::participant_name(r, state.room_data.as_ref(), sender),
        )
    }

    /// The scheduler replies are run on.
    #[must_use]
    pub const fn scheduler(&self) -> &Arc<AutoReplyScheduler> {
        &self.scheduler
    }

    /// The host collaborator.
    #[must_use]
    pub fn host(&self) -> &Arc<H> {
        &self.shared.host
    }
}

/// Applies a reply sequence's effects to the session it was started from.
struct SessionReplies<H> {
    shared: Arc<SessionShared<H>>,
}

impl<H: RoomHost + 'static> ReplyCallbacks for SessionReplies<H> {
    fn on_typing_start(&self, room_id: &str, replier_id: &str) {
        {
            let mut state = self.shared.state.lock();
            if !state.is_open(room_id) {
                return;
            }
            state.typing_sender = Some(replier_id.to_string());
        }
        self.shared.emit(ChatEvent::TypingStarted {
            room_id: room_id.to_string(),
            sender: replier_id.to_string(),
        });
    }

    fn on_typing_end(&self, room_id: &str) {
        {
            let mut state = self.shared.state.lock();
            if !state.is_open(room_id) {
                return;
            }
            state.typing_sender = None;
        }
        self.shared.emit(ChatEvent::TypingStopped {
            room_id: room_id.to_string(),
        });
    }

    fn on_message_sent(&self, room_id: &str, reply: Message) {
        let open_list = {
            let mut state = self.shared.state.lock();
            if state.is_open(room_id) {
                state.messages.push(reply.clone());
                Some(state.messages.clone())
            } else {
                None
            }
        };

        let host = &self.shared.host;
        let (text, timestamp) = (reply.message.clone(), reply.timestamp.clone());
        if let Some(list) = open_list {
            host.save_messages(room_id, &list);
            self.shared.emit(ChatEvent::MessageAppended {
                room_id: room_id.to_string(),
                message: reply,
            });
        } else {
            tracing::debug!(room_id, "reply for a room that is not open, handing to host");
            host.add_message_to_room(room_id, reply.clone());
            self.shared.emit(ChatEvent::DeliveredElsewhere {
                room_id: room_id.to_string(),
                message: reply,
            });
        }
        host.update_room(room_id, &text, &timestamp);
    }
}
