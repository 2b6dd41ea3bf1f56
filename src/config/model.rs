//! Configuration model
//!
//! Plain data produced by the parser. A [`Configuration`] is immutable once
//! built; runtime state such as once-only rule memory lives in
//! [`crate::processing::IntakeState`], which is derived from it.

use crate::core::{DateFormat, Level, MessageFormat};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

/// Compiled regular expression compared by its source text
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> std::result::Result<Self, regex::Error> {
        Regex::new(source).map(Pattern)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Pattern {}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.as_str())
    }
}

/// Options carried by the root element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalOptions {
    pub enabled: bool,
    pub max_messages: Option<u32>,
    pub default_ajax_url: Option<String>,
    pub cors_allowed_origins: Option<Pattern>,
    pub server_side_logger: Option<String>,
    pub server_side_level: Option<Level>,
    pub message_format: MessageFormat,
    pub date_format: DateFormat,
    pub production_library_path: Option<String>,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            max_messages: None,
            default_ajax_url: None,
            cors_allowed_origins: None,
            server_side_logger: None,
            server_side_level: None,
            message_format: MessageFormat::default(),
            date_format: DateFormat::default(),
            production_library_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppenderKind {
    Console,
    Ajax {
        url: Option<String>,
        batch_timeout: Option<u32>,
        send_timeout: Option<u32>,
        max_batch_size: Option<u32>,
    },
    /// Appender contributed by an extension; attributes are kept verbatim
    Extension {
        tag: String,
        attributes: BTreeMap<String, String>,
    },
}

/// Named appender declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppenderConfig {
    pub name: String,
    pub kind: AppenderKind,
    pub level: Option<Level>,
    pub user_agent_regex: Option<Pattern>,
    pub ip_regex: Option<Pattern>,
    pub store_in_buffer_level: Option<Level>,
    pub send_with_buffer_level: Option<Level>,
    pub buffer_size: Option<u32>,
    pub batch_size: Option<u32>,
}

impl AppenderConfig {
    pub fn new(name: impl Into<String>, kind: AppenderKind) -> Self {
        Self {
            name: name.into(),
            kind,
            level: None,
            user_agent_regex: None,
            ip_regex: None,
            store_in_buffer_level: None,
            send_with_buffer_level: None,
            buffer_size: None,
            batch_size: None,
        }
    }

    /// Whether an entry that reached the server could have come through this appender
    ///
    /// Entries at or above `level` are sent directly. When buffering is on
    /// (`sendWithBufferLevel` below OFF), entries at or above
    /// `storeInBufferLevel` may arrive together with the triggering entry.
    /// Extension appenders are opaque and admit everything.
    pub fn admits(&self, level: Level, user_agent: &str, client_address: &str) -> bool {
        if matches!(self.kind, AppenderKind::Extension { .. }) {
            return true;
        }

        let threshold = self.level.unwrap_or(Level::Trace);
        let direct = threshold < Level::Off && level >= threshold;
        let buffering = self.send_with_buffer_level.unwrap_or(Level::Off) < Level::Off;
        let buffered = buffering && level >= self.store_in_buffer_level.unwrap_or(Level::All);

        (direct || buffered)
            && self
                .user_agent_regex
                .as_ref()
                .map_or(true, |re| re.is_match(user_agent))
            && self
                .ip_regex
                .as_ref()
                .map_or(true, |re| re.is_match(client_address))
    }
}

/// Deduplication rule; no pattern matches every message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnceOnlyRule {
    pub pattern: Option<Pattern>,
}

/// Named logger declaration; the empty name is the root logger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggerConfig {
    pub name: String,
    pub level: Option<Level>,
    pub user_agent_regex: Option<Pattern>,
    pub ip_regex: Option<Pattern>,
    pub disallow: Option<Pattern>,
    pub appenders: Option<Vec<String>>,
    pub once_only: Vec<OnceOnlyRule>,
}

impl LoggerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Parent of a dotted logger name; the root logger has none
///
/// ```
/// use rust_log_intake::config::parent_logger_name;
///
/// assert_eq!(parent_logger_name("a.b.c"), Some("a.b"));
/// assert_eq!(parent_logger_name("a"), Some(""));
/// assert_eq!(parent_logger_name(""), None);
/// ```
pub fn parent_logger_name(name: &str) -> Option<&str> {
    if name.is_empty() {
        None
    } else {
        Some(name.rfind('.').map_or("", |pos| &name[..pos]))
    }
}

/// Parsed configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) options: GlobalOptions,
    pub(crate) appenders: Vec<AppenderConfig>,
    pub(crate) loggers: Vec<LoggerConfig>,
}

impl Configuration {
    pub fn options(&self) -> &GlobalOptions {
        &self.options
    }

    /// Appenders in declaration order
    pub fn appenders(&self) -> &[AppenderConfig] {
        &self.appenders
    }

    /// Loggers in declaration order
    pub fn loggers(&self) -> &[LoggerConfig] {
        &self.loggers
    }

    pub fn appender(&self, name: &str) -> Option<&AppenderConfig> {
        self.appenders.iter().find(|a| a.name == name)
    }

    pub fn logger(&self, name: &str) -> Option<&LoggerConfig> {
        self.loggers.iter().find(|l| l.name == name)
    }
}
