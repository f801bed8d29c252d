//! Emote span grammar and the emote-only heuristic.
//!
//! The `emotes` tag looks like `25:0-4,12-16/1902:6-10`: groups separated
//! by `/`, each `emoteId:start-end[,start-end...]`, with inclusive character
//! offsets into the message body.

use crate::error::TagError;
use crate::twitch::message::EmoteInfo;

/// Parse an `emotes` tag value against the message it annotates.
///
/// Spans running past the end of `message` are kept with an empty
/// `emote_name`. Any structural error fails the whole tag.
pub fn parse_emotes(value: &str, message: &str) -> Result<Vec<EmoteInfo>, TagError> {
    let chars: Vec<char> = message.chars().collect();
    let mut emotes = Vec::new();

    for group in value.split('/').filter(|g| !g.is_empty()) {
        let (emote_id, positions) = group
            .split_once(':')
            .ok_or(TagError::MissingDelimiter(':'))?;

        for position in positions.split(',') {
            let (start, end) = parse_range(position)?;
            let emote_name = if end < chars.len() {
                chars[start..=end].iter().collect()
            } else {
                String::new()
            };
            emotes.push(EmoteInfo {
                emote_id: emote_id.to_string(),
                emote_name,
                start_index: start,
                end_index: end,
            });
        }
    }

    Ok(emotes)
}

fn parse_range(position: &str) -> Result<(usize, usize), TagError> {
    let (start, end) = position
        .split_once('-')
        .ok_or(TagError::MissingDelimiter('-'))?;
    let start = parse_offset(start)?;
    let end = parse_offset(end)?;
    if start > end {
        return Err(TagError::InvertedRange { start, end });
    }
    Ok((start, end))
}

/// Offsets are bounded by `u32`; Twitch messages are far shorter.
fn parse_offset(s: &str) -> Result<usize, TagError> {
    s.parse::<u32>()
        .map(|n| n as usize)
        .map_err(|_| TagError::InvalidNumber(s.to_string()))
}

/// Whether emotes make up (nearly) the whole message.
///
/// Emote coverage is the summed length of all spans, so overlapping spans
/// count twice. The message is emote-only when coverage reaches 80% of its
/// non-whitespace characters.
pub fn is_emote_only(message: &str, emotes: &[EmoteInfo]) -> bool {
    if emotes.is_empty() {
        return false;
    }
    let coverage = emotes
        .iter()
        .fold(0u64, |acc, e| acc.saturating_add(e.span_len() as u64));
    let visible = message.chars().filter(|c| !c.is_whitespace()).count() as u64;
    // coverage >= 0.8 * visible, kept in integers
    coverage.saturating_mul(5) >= visible.saturating_mul(4)
}
