//! Typed chat events produced by the classifier.
//!
//! A [`ChatMessage`] is built once per incoming line and handed to
//! subscribers by value; nothing mutates it after emission.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Base URL of the Twitch emote CDN.
const EMOTE_CDN: &str = "https://static-cdn.jtvnw.net/emoticons/v2";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MessageType {
    #[default]
    RegularChat,
    EmoteOnly,
    BitsCheer,
    UserNotice,
    /// Status text generated locally rather than by another chatter.
    System,
}

/// Sub-type of a `USERNOTICE` event, taken from its `msg-id` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserNoticeType {
    Sub,
    Resub,
    SubGift,
    Raid,
    BitsBadgeTier,
    #[default]
    Other,
}

impl UserNoticeType {
    pub fn from_msg_id(msg_id: &str) -> Self {
        match msg_id {
            "sub" => UserNoticeType::Sub,
            "resub" => UserNoticeType::Resub,
            "subgift" => UserNoticeType::SubGift,
            "raid" => UserNoticeType::Raid,
            "bitsbadgetier" => UserNoticeType::BitsBadgeTier,
            _ => UserNoticeType::Other,
        }
    }
}

/// One emote occurrence. Offsets are inclusive character (not byte) indices
/// into the message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmoteInfo {
    pub emote_id: String,
    /// The text covered by the span, or empty if the span is out of bounds.
    pub emote_name: String,
    pub start_index: usize,
    pub end_index: usize,
}

impl EmoteInfo {
    /// Number of characters covered by the span.
    pub fn span_len(&self) -> usize {
        self.end_index
            .saturating_sub(self.start_index)
            .saturating_add(1)
    }

    /// CDN address of the dark-theme, 2x-scale image for this emote.
    pub fn image_url(&self) -> String {
        format!("{}/{}/default/dark/2.0", EMOTE_CDN, self.emote_id)
    }
}

/// A classified chat line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message_type: MessageType,
    pub username: String,
    pub message: String,
    pub timestamp: DateTime<Local>,

    // Badges
    pub is_subscriber: bool,
    pub is_moderator: bool,
    pub is_vip: bool,
    pub is_broadcaster: bool,
    pub badges: Vec<String>,

    // Emotes
    pub has_emotes: bool,
    pub emotes: Vec<EmoteInfo>,

    // Bits
    pub has_bits: bool,
    pub bits_amount: Option<u32>,

    // User notice, only meaningful for `MessageType::UserNotice`
    pub notice_type: UserNoticeType,
    pub system_message: Option<String>,
    pub sub_months: Option<u32>,
    pub raid_from: Option<String>,
    pub raid_viewers: Option<u32>,
}

impl ChatMessage {
    pub(crate) fn new(message_type: MessageType, timestamp: DateTime<Local>) -> Self {
        Self {
            message_type,
            username: String::new(),
            message: String::new(),
            timestamp,
            is_subscriber: false,
            is_moderator: false,
            is_vip: false,
            is_broadcaster: false,
            badges: Vec::new(),
            has_emotes: false,
            emotes: Vec::new(),
            has_bits: false,
            bits_amount: None,
            notice_type: UserNoticeType::Other,
            system_message: None,
            sub_months: None,
            raid_from: None,
            raid_viewers: None,
        }
    }

    pub fn is_user_notice(&self) -> bool {
        self.message_type == MessageType::UserNotice
    }

    /// Image URLs for every emote span, in span order. Repeated emotes are
    /// listed once per occurrence.
    pub fn emote_urls(&self) -> Vec<String> {
        self.emotes.iter().map(EmoteInfo::image_url).collect()
    }
}
