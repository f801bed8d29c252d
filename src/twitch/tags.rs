//! IRCv3 tag section parsing and badge interpretation.
//!
//! Tags arrive as `@key=value;key2=value2 <rest of line>`. Values are kept
//! raw; only `system-msg` gets its `\s` escape undone, by the classifier.

use std::collections::HashMap;

/// Tag key to raw value, scoped to a single line.
pub type TagMap = HashMap<String, String>;

pub const BADGES: &str = "badges";
pub const BITS: &str = "bits";
pub const EMOTES: &str = "emotes";
pub const LOGIN: &str = "login";
pub const MSG_ID: &str = "msg-id";
pub const SYSTEM_MSG: &str = "system-msg";
pub const CUMULATIVE_MONTHS: &str = "msg-param-cumulative-months";
pub const RAID_DISPLAY_NAME: &str = "msg-param-displayName";
pub const RAID_VIEWER_COUNT: &str = "msg-param-viewerCount";

/// Parse a tag section (without the leading `@`).
///
/// Pairs are split on the first `=`; a key with no `=` maps to an empty
/// value. Empty pairs (e.g. from a trailing `;`) are ignored.
pub fn parse_tags(section: &str) -> TagMap {
    section
        .split(';')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

/// Split a raw line into its tag map and the remainder after the tag section.
///
/// Lines without a leading `@` yield an empty map and the whole line.
/// Returns `None` when a tag section is opened but never terminated by a
/// space.
pub fn split_tags(line: &str) -> Option<(TagMap, &str)> {
    let Some(tagged) = line.strip_prefix('@') else {
        return Some((TagMap::new(), line));
    };
    let (section, rest) = tagged.split_once(' ')?;
    Some((parse_tags(section), rest))
}

/// Value of a tag, treating an empty value the same as an absent tag.
pub fn non_empty<'a>(tags: &'a TagMap, key: &str) -> Option<&'a str> {
    tags.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

/// Parse a numeric tag. Absent, empty and non-numeric values all yield
/// `None`.
pub fn parse_number(tags: &TagMap, key: &str) -> Option<u32> {
    non_empty(tags, key)?.parse().ok()
}

/// Role flags derived from the `badges` tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Badges {
    pub raw: Vec<String>,
    pub subscriber: bool,
    pub moderator: bool,
    pub vip: bool,
    pub broadcaster: bool,
}

impl Badges {
    /// Interpret a comma-separated badge list such as
    /// `broadcaster/1,subscriber/12`. Unknown badges are kept in `raw`
    /// without setting a flag.
    pub fn parse(value: &str) -> Self {
        let mut badges = Badges::default();
        for token in value.split(',').filter(|t| !t.is_empty()) {
            if token.starts_with("subscriber/") {
                badges.subscriber = true;
            } else if token.starts_with("moderator/") {
                badges.moderator = true;
            } else if token.starts_with("vip/") {
                badges.vip = true;
            } else if token.starts_with("broadcaster/") {
                badges.broadcaster = true;
            }
            badges.raw.push(token.to_string());
        }
        badges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        let tags = parse_tags("badges=vip/1;color=;emote-only;display-name=Foo");
        assert_eq!(tags.get("badges").map(String::as_str), Some("vip/1"));
        assert_eq!(tags.get("color").map(String::as_str), Some(""));
        assert_eq!(tags.get("emote-only").map(String::as_str), Some(""));
        assert_eq!(tags.get("display-name").map(String::as_str), Some("Foo"));
        assert_eq!(tags.len(), 4);
    }

    #[test]
    fn test_parse_tags_splits_on_first_equals() {
        let tags = parse_tags("reply-parent-msg-body=a=b;x=1");
        assert_eq!(
            tags.get("reply-parent-msg-body").map(String::as_str),
            Some("a=b")
        );
        assert_eq!(tags.get("x").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_split_tags() {
        let (tags, rest) = split_tags("@bits=100 :foo!foo@foo.tmi PRIVMSG #chan :cheer100").unwrap();
        assert_eq!(tags.get("bits").map(String::as_str), Some("100"));
        assert_eq!(rest, ":foo!foo@foo.tmi PRIVMSG #chan :cheer100");

        let (tags, rest) = split_tags(":foo!foo@foo.tmi PRIVMSG #chan :hi").unwrap();
        assert!(tags.is_empty());
        assert_eq!(rest, ":foo!foo@foo.tmi PRIVMSG #chan :hi");

        assert!(split_tags("@badges=vip/1").is_none());
    }

    #[test]
    fn test_parse_number() {
        let tags = parse_tags("a=50;b=;c=abc;d=-3");
        assert_eq!(parse_number(&tags, "a"), Some(50));
        assert_eq!(parse_number(&tags, "b"), None);
        assert_eq!(parse_number(&tags, "c"), None);
        assert_eq!(parse_number(&tags, "d"), None);
        assert_eq!(parse_number(&tags, "missing"), None);
    }

    #[test]
    fn test_badges() {
        let badges = Badges::parse("broadcaster/1,subscriber/12,premium/1");
        assert!(badges.broadcaster);
        assert!(badges.subscriber);
        assert!(!badges.moderator);
        assert!(!badges.vip);
        assert_eq!(badges.raw, vec!["broadcaster/1", "subscriber/12", "premium/1"]);
    }

    #[test]
    fn test_badges_need_slash() {
        let badges = Badges::parse("moderator,vip/1");
        assert!(!badges.moderator);
        assert!(badges.vip);
        assert_eq!(badges.raw.len(), 2);
        assert_eq!(Badges::parse(""), Badges::default());
    }
}
