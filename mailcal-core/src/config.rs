//! Assistant configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MailcalError, MailcalResult};

const DEFAULT_MAX_MESSAGES: u32 = 5;
const DEFAULT_MEETING_MINUTES: i64 = 30;
const MAX_MEETING_MINUTES: i64 = 24 * 60;
const DEFAULT_CALENDAR_ID: &str = "primary";
const DEFAULT_TIMEZONE: &str = "UTC";
const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
const DEFAULT_SERVER_PORT: u16 = 4096;

fn default_max_messages() -> u32 {
    DEFAULT_MAX_MESSAGES
}

fn default_label_ids() -> Vec<String> {
    vec!["INBOX".to_string(), "UNREAD".to_string()]
}

fn default_meeting_minutes() -> i64 {
    DEFAULT_MEETING_MINUTES
}

fn default_calendar_id() -> String {
    DEFAULT_CALENDAR_ID.to_string()
}

fn default_true() -> bool {
    true
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_memory_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailcal")
        .join("booked_slots.json")
}

fn default_host() -> String {
    DEFAULT_SERVER_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_SERVER_PORT
}

/// Configuration at ~/.config/mailcal/config.toml
///
/// OAuth client credentials and tokens live next to it, under `google/`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssistantConfig {
    /// How many unread messages one run looks at.
    #[serde(default = "default_max_messages")]
    pub max_messages: u32,

    #[serde(default = "default_label_ids")]
    pub label_ids: Vec<String>,

    /// Extra Gmail search query, e.g. "newer_than:7d".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    #[serde(default = "default_meeting_minutes")]
    pub meeting_minutes: i64,

    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    /// Insert an event for accepted meetings, not only a draft.
    #[serde(default = "default_true")]
    pub create_events: bool,

    /// IANA zone that times in email bodies are read in.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default = "default_memory_path")]
    pub memory_path: PathBuf,

    #[serde(default)]
    pub server: ServerConfig,
}

/// Where the web UI listens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> MailcalResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| MailcalError::Config(format!("Invalid server address: {e}")))
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            label_ids: default_label_ids(),
            query: None,
            meeting_minutes: default_meeting_minutes(),
            calendar_id: default_calendar_id(),
            create_events: true,
            timezone: default_timezone(),
            memory_path: default_memory_path(),
            server: ServerConfig::default(),
        }
    }
}

impl AssistantConfig {
    pub fn config_dir() -> MailcalResult<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or_else(|| MailcalError::Config("Could not determine config directory".into()))?
            .join("mailcal"))
    }

    pub fn config_path() -> MailcalResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load from ~/.config/mailcal/config.toml, falling back to defaults.
    pub fn load() -> MailcalResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> MailcalResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents).map_err(|e| {
            MailcalError::Config(format!("Could not parse {}: {e}", path.display()))
        })?;

        config.tz()?;
        if !(1..=MAX_MEETING_MINUTES).contains(&config.meeting_minutes) {
            return Err(MailcalError::Config(format!(
                "meeting_minutes must be between 1 and {MAX_MEETING_MINUTES}, got {}",
                config.meeting_minutes
            )));
        }

        Ok(config)
    }

    pub fn tz(&self) -> MailcalResult<chrono_tz::Tz> {
        self.timezone
            .parse()
            .map_err(|_| MailcalError::Config(format!("Unknown timezone '{}'", self.timezone)))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> MailcalResult<()> {
        let contents = format!(
            "\
# mailcal configuration

# How many unread messages a single run looks at:
# max_messages = {DEFAULT_MAX_MESSAGES}

# Gmail labels the messages must carry:
# label_ids = [\"INBOX\", \"UNREAD\"]

# Extra Gmail search query:
# query = \"newer_than:7d\"

# Length of booked meetings, in minutes:
# meeting_minutes = {DEFAULT_MEETING_MINUTES}

# Calendar to check and book on:
# calendar_id = \"{DEFAULT_CALENDAR_ID}\"

# Also create calendar events (drafts are always created):
# create_events = true

# Timezone that times in emails are read in:
# timezone = \"Europe/London\"

# Where booked slots are remembered between runs:
# memory_path = \"~/.local/share/mailcal/booked_slots.json\"

# [server]
# host = \"{DEFAULT_SERVER_HOST}\"
# port = {DEFAULT_SERVER_PORT}
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MailcalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| MailcalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
