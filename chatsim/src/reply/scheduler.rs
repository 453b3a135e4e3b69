//! Timed auto-reply sequencing.
//!
//! Each room has at most one reply sequence in flight. A sequence is two
//! Tokio timers sharing a ticket in the scheduler's registry:
//!
//! ```text
//! Idle -> TypingPending --(D1)--> TypingActive --(D2)--> Delivered -> Idle
//!   ^                                                                  |
//!   +---------------------- cancel (any phase) ------------------------+
//! ```
//!
//! Cancelling aborts both timers and removes the registry entry. A timer
//! that already woke up holds the sequence's gate while it checks its
//! ticket, moves the phase forward and runs its callbacks. `cancel` closes
//! the gate after removing the entry, so once it returns `true` no callback
//! of that sequence runs, on any runtime flavor. A sequence that reached
//! `Delivered` is committed: `cancel` leaves it alone and returns `false`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;
use tokio::task::JoinHandle;

use chatsim_proto::message::{Message, MessageType};

use super::picker::pick_reply;

/// Delay parameters for a reply sequence.
///
/// Typing starts after `read_delay + uniform(0, read_jitter)`; the reply
/// lands `typing_delay + uniform(0, typing_jitter)` after that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyTiming {
    /// Base delay before the typing indicator appears.
    pub read_delay: Duration,
    /// Maximum random extra on top of `read_delay`.
    pub read_jitter: Duration,
    /// Base duration of the typing indicator.
    pub typing_delay: Duration,
    /// Maximum random extra on top of `typing_delay`.
    pub typing_jitter: Duration,
}

impl Default for ReplyTiming {
    fn default() -> Self {
        Self {
            read_delay: Duration::from_millis(2500),
            read_jitter: Duration::from_millis(500),
            typing_delay: Duration::from_millis(1500),
            typing_jitter: Duration::from_millis(1000),
        }
    }
}

impl ReplyTiming {
    /// Timing without jitter.
    #[must_use]
    pub const fn fixed(read_delay: Duration, typing_delay: Duration) -> Self {
        Self {
            read_delay,
            read_jitter: Duration::ZERO,
            typing_delay,
            typing_jitter: Duration::ZERO,
        }
    }

    /// Draws `(D1, D2)` for one sequence.
    fn sample(&self) -> (Duration, Duration) {
        let mut rng = rand::rng();
        (
            self.read_delay + jitter(&mut rng, self.read_jitter),
            self.typing_delay + jitter(&mut rng, self.typing_jitter),
        )
    }
}

fn jitter(rng: &mut impl Rng, max: Duration) -> Duration {
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(rng.random_range(0..=max_ms))
}

/// Observer for the side effects of a reply sequence.
///
/// Callbacks run on a timer task without the registry lock held, but with
/// the sequence's gate closed. They must not cancel their own room.
pub trait ReplyCallbacks: Send + Sync + 'static {
    /// The replier started typing. Only fired when the room was focused
    /// at schedule time.
    fn on_typing_start(&self, room_id: &str, replier_id: &str);

    /// The replier stopped typing. Same focus condition as
    /// [`on_typing_start`](Self::on_typing_start).
    fn on_typing_end(&self, room_id: &str);

    /// The reply is ready. Always fired, whichever room is focused.
    fn on_message_sent(&self, room_id: &str, reply: Message);
}

impl<T: ReplyCallbacks> ReplyCallbacks for Arc<T> {
    fn on_typing_start(&self, room_id: &str, replier_id: &str) {
        (**self).on_typing_start(room_id, replier_id);
    }

    fn on_typing_end(&self, room_id: &str) {
        (**self).on_typing_end(room_id);
    }

    fn on_message_sent(&self, room_id: &str, reply: Message) {
        (**self).on_message_sent(room_id, reply);
    }
}

/// Input to [`AutoReplyScheduler::schedule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    /// Room the reply belongs to.
    pub room_id: String,
    /// Text the reply answers (or a `"<type> file"` placeholder).
    pub user_message: String,
    /// Type of the message being answered.
    pub message_type: MessageType,
    /// Participant that replies; `None` means no reply.
    pub replier_id: Option<String>,
    /// Room focused at the time of scheduling.
    pub current_room_id: Option<String>,
}

/// Result of [`AutoReplyScheduler::schedule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// A sequence was started.
    Scheduled {
        /// Who will reply.
        replier_id: String,
        /// The reply text that will be delivered.
        reply_text: &'static str,
        /// Delay until the typing phase (`D1`).
        typing_after: Duration,
        /// Delay until delivery (`D1 + D2`).
        deliver_after: Duration,
    },
    /// No replier was resolvable; nothing was scheduled.
    NoReplier,
}

/// Phase of a room's reply sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReplyPhase {
    /// No sequence in flight.
    Idle,
    /// Waiting for the typing indicator.
    TypingPending,
    /// Typing indicator shown, waiting for delivery.
    TypingActive,
    /// Delivery callbacks are running; the sequence can no longer be
    /// cancelled.
    Delivered,
}

struct PendingReply {
    ticket: u64,
    phase: ReplyPhase,
    timers: Vec<JoinHandle<()>>,
    live: Gate,
}

/// `true` until the sequence is cancelled. Held while callbacks run.
type Gate = Arc<Mutex<bool>>;

type Registry = Arc<Mutex<HashMap<String, PendingReply>>>;

/// Owns every in-flight reply sequence, keyed by room id.
pub struct AutoReplyScheduler {
    timing: ReplyTiming,
    pending: Registry,
    next_ticket: AtomicU64,
}

impl AutoReplyScheduler {
    /// Creates a scheduler with the given timing.
    #[must_use]
    pub fn new(timing: ReplyTiming) -> Self {
        Self {
            timing,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Starts a reply sequence for `request.room_id`, superseding any
    /// sequence already in flight for that room.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule<C: ReplyCallbacks>(
        &self,
        request: ReplyRequest,
        callbacks: C,
    ) -> ScheduleOutcome {
        if self.is_replying(&request.room_id) {
            self.cancel(&request.room_id);
        }

        let Some(replier_id) = request.replier_id else {
            tracing::debug!(room_id = %request.room_id, "no replier for room, skipping auto-reply");
            return ScheduleOutcome::NoReplier;
        };

        let reply_text = pick_reply(&request.user_message, request.message_type);
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let (typing_after, typing_for) = self.timing.sample();
        let deliver_after = typing_after + typing_for;

        let live: Gate = Arc::new(Mutex::new(true));
        let sequence = ReplySequence {
            registry: Arc::clone(&self.pending),
            live: Arc::clone(&live),
            focused: request.current_room_id.as_deref() == Some(request.room_id.as_str()),
            room_id: request.room_id,
            ticket,
            replier_id: replier_id.clone(),
            callbacks: Arc::new(callbacks),
        };

        // Register while holding the lock so that neither timer can look
        // for its ticket before the entry exists.
        let mut pending = self.pending.lock();
        let timers = vec![
            tokio::spawn(sequence.clone().typing(typing_after)),
            tokio::spawn(sequence.clone().deliver(deliver_after, reply_text)),
        ];
        pending.insert(
            sequence.room_id.clone(),
            PendingReply {
                ticket,
                phase: ReplyPhase::TypingPending,
                timers,
                live,
            },
        );
        drop(pending);

        tracing::debug!(
            room_id = %sequence.room_id,
            replier = %replier_id,
            typing_ms = typing_after.as_millis(),
            deliver_ms = deliver_after.as_millis(),
            "auto-reply scheduled"
        );

        ScheduleOutcome::Scheduled {
            replier_id,
            reply_text,
            typing_after,
            deliver_after,
        }
    }

    /// Cancels the room's sequence without firing any of its callbacks.
    ///
    /// Returns `true` if a sequence was stopped. Returns `false` when the
    /// room has none, or when its reply is already being delivered.
    ///
    /// Blocks while a callback of the sequence is running on another thread.
    pub fn cancel(&self, room_id: &str) -> bool {
        let mut pending = self.pending.lock();
        if pending
            .get(room_id)
            .is_none_or(|entry| entry.phase == ReplyPhase::Delivered)
        {
            return false;
        }
        let Some(entry) = pending.remove(room_id) else {
            return false;
        };
        drop(pending);

        for timer in &entry.timers {
            timer.abort();
        }
        *entry.live.lock() = false;
        tracing::debug!(room_id, "auto-reply cancelled");
        true
    }

    /// Whether the room has a sequence in flight.
    #[must_use]
    pub fn is_replying(&self, room_id: &str) -> bool {
        self.pending.lock().contains_key(room_id)
    }

    /// Current phase of the room's sequence.
    #[must_use]
    pub fn phase(&self, room_id: &str) -> ReplyPhase {
        self.pending
            .lock()
            .get(room_id)
            .map_or(ReplyPhase::Idle, |entry| entry.phase)
    }

    /// Number of the room's timers that have not fired yet.
    #[must_use]
    pub fn pending_timer_count(&self, room_id: &str) -> usize {
        self.pending.lock().get(room_id).map_or(0, |entry| {
            entry.timers.iter().filter(|t| !t.is_finished()).count()
        })
    }

    /// Rooms with a sequence in flight, sorted.
    #[must_use]
    pub fn active_rooms(&self) -> Vec<String> {
        let mut rooms: Vec<String> = self.pending.lock().keys().cloned().collect();
        rooms.sort();
        rooms
    }
}

impl Default for AutoReplyScheduler {
    fn default() -> Self {
        Self::new(ReplyTiming::default())
    }
}

impl Drop for AutoReplyScheduler {
    fn drop(&mut self) {
        let entries: Vec<PendingReply> = self.pending.lock().drain().map(|(_, e)| e).collect();
        for entry in entries {
            for timer in entry.timers {
                timer.abort();
            }
            *entry.live.lock() = false;
        }
    }
}

/// State shared by the two timers of one sequence.
struct ReplySequence<C> {
    registry: Registry,
    live: Gate,
    room_id: String,
    ticket: u64,
    replier_id: String,
    focused: bool,
    callbacks: Arc<C>,
}

impl<C> Clone for ReplySequence<C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            live: Arc::clone(&self.live),
            room_id: self.room_id.clone(),
            ticket: self.ticket,
            replier_id: self.replier_id.clone(),
            focused: self.focused,
            callbacks: Arc::clone(&self.callbacks),
        }
    }
}

impl<C: ReplyCallbacks> ReplySequence<C> {
    async fn typing(self, delay: Duration) {
        tokio::time::sleep(delay).await;

        let live = self.live.lock();
        if !*live || !self.enter(ReplyPhase::TypingActive) {
            return;
        }
        if self.focused {
            self.callbacks
                .on_typing_start(&self.room_id, &self.replier_id);
        }
        drop(live);
    }

    async fn deliver(self, delay: Duration, reply_text: &'static str) {
        tokio::time::sleep(delay).await;

        let live = self.live.lock();
        if !*live || !self.enter(ReplyPhase::Delivered) {
            return;
        }

        if self.focused {
            self.callbacks.on_typing_end(&self.room_id);
        }

        let reply = Message::new(MessageType::Text, reply_text, self.replier_id.as_str());
        tracing::debug!(room_id = %self.room_id, message_id = %reply.id, "auto-reply delivered");
        self.callbacks.on_message_sent(&self.room_id, reply);

        let mut pending = self.registry.lock();
        if pending
            .get(&self.room_id)
            .is_some_and(|entry| entry.ticket == self.ticket)
        {
            pending.remove(&self.room_id);
        }
        drop(pending);
        drop(live);
    }

    /// Moves this sequence's entry forward to `next`. Fails if the entry was
    /// cancelled, superseded, or is already at or past `next`.
    fn enter(&self, next: ReplyPhase) -> bool {
        let mut pending = self.registry.lock();
        match pending.get_mut(&self.room_id) {
            Some(entry) if entry.ticket == self.ticket && entry.phase < next => {
                entry.phase = next;
                true
            }
            _ => false,
        }
    }
}
