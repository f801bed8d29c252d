//! Turns raw chat lines into [`ChatMessage`] values.
//!
//! Classification is a pure function of the line (and a timestamp). Lines
//! that are not chat traffic yield `None` quietly; chat lines that cannot be
//! parsed yield `None` with a warning naming the line.

use chrono::{DateTime, Local};
use tracing::warn;

use crate::twitch::emotes::{is_emote_only, parse_emotes};
use crate::twitch::message::{ChatMessage, MessageType, UserNoticeType};
use crate::twitch::tags::{self, Badges, TagMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Privmsg,
    UserNotice,
}

/// Classify a line, stamping it with the current local time.
pub fn classify(line: &str) -> Option<ChatMessage> {
    classify_at(line, Local::now())
}

/// Classify a line with an explicit timestamp. Equal inputs give equal
/// outputs.
pub fn classify_at(line: &str, timestamp: DateTime<Local>) -> Option<ChatMessage> {
    let Some((tags, rest)) = tags::split_tags(line) else {
        warn!(line, "Unterminated tag section, skipping line");
        return None;
    };

    let command = detect_command(rest)?;
    let mut message = match command {
        Command::Privmsg => parse_privmsg(rest, timestamp),
        Command::UserNotice => Some(parse_user_notice(rest, &tags, timestamp)),
    }?;

    apply_badges(&mut message, &tags);
    apply_emotes(&mut message, &tags);
    if command == Command::UserNotice {
        apply_notice_tags(&mut message, &tags);
    }
    // Bits run last so a cheer wins over the emote-only reclassification.
    apply_bits(&mut message, &tags);

    if message.username.is_empty() {
        warn!(line, "Chat line without a username, skipping");
        return None;
    }
    Some(message)
}

/// Find the command by substring. When both appear, the earlier occurrence
/// is the command and the later one is part of the chat text.
fn detect_command(rest: &str) -> Option<Command> {
    match (rest.find("PRIVMSG"), rest.find("USERNOTICE")) {
        (Some(p), Some(u)) if u < p => Some(Command::UserNotice),
        (Some(_), _) => Some(Command::Privmsg),
        (None, Some(_)) => Some(Command::UserNotice),
        (None, None) => None,
    }
}

/// `:nick!user@host PRIVMSG #channel :text`
///
/// The username sits between the first `:` and the following `!`; the text
/// is everything after the last `:` in the line.
fn parse_privmsg(rest: &str, timestamp: DateTime<Local>) -> Option<ChatMessage> {
    let Some(username) = rest
        .split_once(':')
        .and_then(|(_, after)| after.split_once('!'))
        .map(|(nick, _)| nick)
    else {
        warn!(line = rest, "Failed to parse PRIVMSG prefix");
        return None;
    };
    let text = rest.rsplit_once(':').map(|(_, t)| t).unwrap_or_default();

    let mut message = ChatMessage::new(MessageType::RegularChat, timestamp);
    message.username = username.to_lowercase();
    message.message = text.to_string();
    Some(message)
}

/// `[:tmi.twitch.tv] USERNOTICE #channel [:text]`
///
/// The login comes from the `login` tag. A colon at the very start of the
/// line is the server prefix, not the start of a message.
fn parse_user_notice(rest: &str, tags: &TagMap, timestamp: DateTime<Local>) -> ChatMessage {
    let mut message = ChatMessage::new(MessageType::UserNotice, timestamp);
    if let Some(login) = tags.get(tags::LOGIN) {
        message.username = login.to_lowercase();
    }
    if let Some(idx) = rest.rfind(':').filter(|&i| i > 0) {
        message.message = rest[idx + 1..].to_string();
    }
    message
}

fn apply_badges(message: &mut ChatMessage, tags: &TagMap) {
    let Some(value) = tags::non_empty(tags, tags::BADGES) else {
        return;
    };
    let badges = Badges::parse(value);
    message.is_subscriber = badges.subscriber;
    message.is_moderator = badges.moderator;
    message.is_vip = badges.vip;
    message.is_broadcaster = badges.broadcaster;
    message.badges = badges.raw;
}

fn apply_emotes(message: &mut ChatMessage, tags: &TagMap) {
    let Some(value) = tags::non_empty(tags, tags::EMOTES) else {
        return;
    };
    match parse_emotes(value, &message.message) {
        Ok(emotes) => message.emotes = emotes,
        Err(e) => {
            warn!(emotes = value, error = %e, "Malformed emotes tag, ignoring it");
            return;
        }
    }
    message.has_emotes = !message.emotes.is_empty();

    if message.message_type == MessageType::RegularChat
        && is_emote_only(&message.message, &message.emotes)
    {
        message.message_type = MessageType::EmoteOnly;
    }
}

fn apply_bits(message: &mut ChatMessage, tags: &TagMap) {
    if let Some(amount) = tags::parse_number(tags, tags::BITS) {
        message.has_bits = true;
        message.bits_amount = Some(amount);
        message.message_type = MessageType::BitsCheer;
    }
}

fn apply_notice_tags(message: &mut ChatMessage, tags: &TagMap) {
    if let Some(system_msg) = tags.get(tags::SYSTEM_MSG) {
        message.system_message = Some(system_msg.replace("\\s", " "));
    }

    let notice_type = tags
        .get(tags::MSG_ID)
        .map(|id| UserNoticeType::from_msg_id(id))
        .unwrap_or_default();
    message.notice_type = notice_type;

    match notice_type {
        UserNoticeType::Resub => {
            message.sub_months = tags::parse_number(tags, tags::CUMULATIVE_MONTHS);
        }
        UserNoticeType::Raid => {
            message.raid_from = tags.get(tags::RAID_DISPLAY_NAME).cloned();
            message.raid_viewers = tags::parse_number(tags, tags::RAID_VIEWER_COUNT);
        }
        _ => {}
    }
}
