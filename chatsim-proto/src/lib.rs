//! Shared data model for `chatsim`: messages, rooms, and the fixture format.

pub mod fixture;
pub mod message;
pub mod room;
