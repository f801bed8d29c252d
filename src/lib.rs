//! Read-only Twitch chat client.
//!
//! [`TwitchClient`] owns the socket and the read loop; every chat line it
//! receives goes through [`classify`] and the resulting [`ChatMessage`] is
//! delivered to each subscriber in the order the lines arrived.

pub mod config;
pub mod error;
pub mod logging;
pub mod twitch;

pub use error::{ConnectionError, TagError};
pub use twitch::classifier::{classify, classify_at};
pub use twitch::connection::TwitchClient;
pub use twitch::message::{ChatMessage, EmoteInfo, MessageType, UserNoticeType};
