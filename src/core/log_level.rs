//! Severity levels
//!
//! Levels carry the numeric values used on the wire by the browser client, so
//! a level can be configured either by name (`"WARN"`) or by threshold
//! (`"4000"`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Level {
    #[default]
    All,
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Off,
}

impl Level {
    pub const ALL_LEVELS: [Level; 8] = [
        Level::All,
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
        Level::Off,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            Level::All => "ALL",
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
            Level::Off => "OFF",
        }
    }

    /// Numeric value as understood by the browser client
    pub const fn value(&self) -> i32 {
        match self {
            Level::All => i32::MIN,
            Level::Trace => 1000,
            Level::Debug => 2000,
            Level::Info => 3000,
            Level::Warn => 4000,
            Level::Error => 5000,
            Level::Fatal => 6000,
            Level::Off => i32::MAX,
        }
    }

    /// Map a numeric threshold to the highest level whose value does not exceed it
    ///
    /// ```
    /// use rust_log_intake::Level;
    ///
    /// assert_eq!(Level::from_value(3000), Level::Info);
    /// assert_eq!(Level::from_value(3500), Level::Info);
    /// assert_eq!(Level::from_value(10), Level::All);
    /// ```
    pub fn from_value(value: i32) -> Self {
        Self::ALL_LEVELS
            .iter()
            .rev()
            .copied()
            .find(|level| level.value() <= value)
            .unwrap_or(Level::All)
    }

    /// Parse either a level name or an integer threshold
    pub fn parse_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if let Ok(level) = token.parse::<Level>() {
            return Some(level);
        }
        token.parse::<i32>().ok().map(Self::from_value)
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            Level::All | Level::Trace => BrightBlack,
            Level::Debug => Blue,
            Level::Info => Green,
            Level::Warn => Yellow,
            Level::Error => Red,
            Level::Fatal | Level::Off => BrightRed,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ALL" => Ok(Level::All),
            "TRACE" => Ok(Level::Trace),
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "ERROR" => Ok(Level::Error),
            "FATAL" => Ok(Level::Fatal),
            "OFF" => Ok(Level::Off),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.value())
    }
}

// The client sends numbers, but hand-written payloads often use names.
impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => {
                let clamped = n.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
                Ok(Level::from_value(clamped))
            }
            Raw::Name(name) => Level::parse_token(&name)
                .ok_or_else(|| serde::de::Error::custom(format!("Invalid log level: '{}'", name))),
        }
    }
}
