//! Configuration data model.
//!
//! All structs derive `Serialize`/`Deserialize` for TOML persistence.
//! Every field has a default so an empty or missing file gives an anonymous
//! connection to Twitch.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::nickname::generate_nickname;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub twitch: TwitchConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where to connect and which channel to read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitchConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Channel login, with or without the leading `#`.
    #[serde(default)]
    pub channel: String,
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,
    /// Fixed nickname. A fresh anonymous nick is generated per connection
    /// when unset.
    #[serde(default)]
    pub nickname: Option<String>,
}

impl Default for TwitchConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            channel: String::new(),
            capabilities: default_capabilities(),
            nickname: None,
        }
    }
}

impl TwitchConfig {
    /// Channel name as sent in `JOIN`: trimmed, without `#`, lowercase.
    pub fn normalized_channel(&self) -> String {
        self.channel.trim().trim_start_matches('#').to_lowercase()
    }

    pub fn nickname_or_generate(&self) -> String {
        self.nickname.clone().unwrap_or_else(generate_nickname)
    }
}

/// Transport behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Drop the connection when no line arrives for this long.
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
    #[serde(default = "default_true")]
    pub auto_reconnect: bool,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
    /// Longer lines are dropped with a warning instead of being classified.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: None,
            auto_reconnect: true,
            reconnect_delay_secs: default_reconnect_delay(),
            max_line_length: default_max_line_length(),
        }
    }
}

impl ConnectionConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

/// Diagnostic logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_host() -> String {
    "irc.chat.twitch.tv".to_string()
}
fn default_port() -> u16 {
    6667
}
fn default_capabilities() -> Vec<String> {
    vec!["twitch.tv/tags".into(), "twitch.tv/commands".into()]
}
fn default_true() -> bool {
    true
}
fn default_reconnect_delay() -> u64 {
    5
}
fn default_max_line_length() -> usize {
    8704
}
fn default_log_filter() -> String {
    "chatstream=info".to_string()
}
