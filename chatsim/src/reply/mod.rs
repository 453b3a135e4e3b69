//! Scripted auto-reply bot.
//!
//! - [`picker`] maps an outgoing message to a canned response.
//! - [`replier`] decides which participant answers.
//! - [`scheduler`] runs the timed typing/reply sequence per room.

pub mod picker;
pub mod replier;
pub mod scheduler;

pub use picker::pick_reply;
pub use replier::{ReplierContext, select_replier};
pub use scheduler::{
    AutoReplyScheduler, ReplyCallbacks, ReplyPhase, ReplyRequest, ReplyTiming, ScheduleOutcome,
};
