//! `chatsim`: simulated chat widget core.
//!
//! Message list management, a scripted auto-reply bot, file-attachment
//! staging, and in-conversation search over fixture-backed rooms.

pub mod chat;
pub mod config;
pub mod fixtures;
pub mod reply;
