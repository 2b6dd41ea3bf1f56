//! Inbound log batch as posted by the browser client

use super::error::{IntakeError, Result};
use super::log_level::Level;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message carried by one client entry
///
/// Plain strings stay text; any other JSON value is kept as structured data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessagePayload {
    Text(String),
    Structured(serde_json::Value),
}

impl MessagePayload {
    /// Message as text; structured payloads render as compact JSON
    pub fn as_text(&self) -> String {
        match self {
            MessagePayload::Text(text) => text.clone(),
            MessagePayload::Structured(value) => value.to_string(),
        }
    }

    /// Message as a JSON fragment
    ///
    /// Text that already holds a JSON object or array is passed through,
    /// any other text is quoted.
    pub fn as_json(&self) -> String {
        match self {
            MessagePayload::Structured(value) => value.to_string(),
            MessagePayload::Text(text) => {
                let trimmed = text.trim_start();
                if (trimmed.starts_with('{') || trimmed.starts_with('['))
                    && serde_json::from_str::<serde_json::Value>(text).is_ok()
                {
                    text.clone()
                } else {
                    serde_json::Value::String(text.clone()).to_string()
                }
            }
        }
    }
}

impl Default for MessagePayload {
    fn default() -> Self {
        MessagePayload::Text(String::new())
    }
}

impl From<&str> for MessagePayload {
    fn from(s: &str) -> Self {
        MessagePayload::Text(s.to_string())
    }
}

impl From<String> for MessagePayload {
    fn from(s: String) -> Self {
        MessagePayload::Text(s)
    }
}

/// One log entry inside a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientLogEntry {
    #[serde(rename = "l")]
    pub level: Level,
    #[serde(rename = "m", default)]
    pub message: MessagePayload,
    #[serde(rename = "n", default, skip_serializing_if = "Option::is_none")]
    pub logger: Option<String>,
    /// Milliseconds since the Unix epoch, client clock
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(rename = "u", default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<String>,
}

impl ClientLogEntry {
    pub fn new(level: Level, message: impl Into<MessagePayload>) -> Self {
        Self {
            level,
            message: message.into(),
            logger: None,
            timestamp: None,
            entry_id: None,
        }
    }

    pub fn with_logger(mut self, logger: impl Into<String>) -> Self {
        self.logger = Some(logger.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp.timestamp_millis());
        self
    }

    pub fn with_entry_id(mut self, entry_id: impl Into<String>) -> Self {
        self.entry_id = Some(entry_id.into());
        self
    }

    /// Logger name the entry addresses; empty means the root logger
    pub fn logger_name(&self) -> &str {
        self.logger.as_deref().unwrap_or("")
    }

    /// Client timestamp, if present and representable
    pub fn client_time(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
    }
}

/// A batch of entries as posted by the client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogBatch {
    #[serde(rename = "r", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(rename = "lg")]
    pub entries: Vec<ClientLogEntry>,
    /// Array elements that could not be read as an entry
    #[serde(skip)]
    pub rejected: usize,
}

impl LogBatch {
    pub fn new(entries: Vec<ClientLogEntry>) -> Self {
        Self {
            request_id: None,
            entries,
            rejected: 0,
        }
    }

    /// Parse a request body
    ///
    /// Accepts the `{"r": .., "lg": [..]}` envelope or a bare entry array.
    /// Only the outer shape can fail the batch; an element that is not a
    /// valid entry is skipped and counted in `rejected`.
    pub fn parse(body: &str) -> Result<Self> {
        let (request_id, items) =
            match serde_json::from_str::<Value>(body).map_err(IntakeError::MalformedBatch)? {
                Value::Array(items) => (None, items),
                Value::Object(mut envelope) => {
                    let items = match envelope.remove("lg") {
                        Some(Value::Array(items)) => items,
                        Some(_) => return Err(IntakeError::malformed_batch("`lg` is not an array")),
                        None => return Err(IntakeError::malformed_batch("missing field `lg`")),
                    };
                    let request_id = match envelope.remove("r") {
                        None | Some(Value::Null) => None,
                        Some(Value::String(id)) => Some(id),
                        Some(_) => return Err(IntakeError::malformed_batch("`r` is not a string")),
                    };
                    (request_id, items)
                }
                _ => return Err(IntakeError::malformed_batch("expected an entry array")),
            };

        let mut batch = LogBatch::new(Vec::with_capacity(items.len()));
        batch.request_id = request_id;
        for item in items {
            match serde_json::from_value::<ClientLogEntry>(item) {
                Ok(entry) => batch.entries.push(entry),
                Err(_) => batch.rejected += 1,
            }
        }
        Ok(batch)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_envelope() {
        let body = r#"{"r":"req-1","lg":[{"l":6000,"m":"boom","n":"a.b","t":1420000000000,"u":"e1"}]}"#;
        let batch = LogBatch::parse(body).unwrap();
        assert_eq!(batch.request_id.as_deref(), Some("req-1"));
        assert_eq!(batch.len(), 1);
        let entry = &batch.entries[0];
        assert_eq!(entry.level, Level::Fatal);
        assert_eq!(entry.logger_name(), "a.b");
        assert_eq!(entry.message, MessagePayload::Text("boom".to_string()));
        assert_eq!(entry.entry_id.as_deref(), Some("e1"));
        assert!(entry.client_time().is_some());
    }

    #[test]
    fn test_parse_bare_array() {
        let batch = LogBatch::parse(r#"[{"l":"WARN","m":{"x":5}}]"#).unwrap();
        assert_eq!(batch.entries[0].level, Level::Warn);
        assert_eq!(batch.entries[0].logger_name(), "");
        assert!(matches!(batch.entries[0].message, MessagePayload::Structured(_)));
    }

    #[test]
    fn test_parse_malformed() {
        for body in ["", "not json", "42", r#"{"lg": 5}"#, r#"{"x": []}"#, r#"{"r": 7, "lg": []}"#] {
            let err = LogBatch::parse(body).unwrap_err();
            assert!(matches!(err, IntakeError::MalformedBatch(_)), "body {:?}", body);
        }
    }

    #[test]
    fn test_parse_skips_bad_entries() {
        let body = r#"[{"l":3000,"m":"good one"},{"l":"LOUD","m":"bad level"},{"m":"no level"},7,{"l":4000,"m":"good two"}]"#;
        let batch = LogBatch::parse(body).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.rejected, 3);
        assert_eq!(batch.entries[0].message.as_text(), "good one");
        assert_eq!(batch.entries[1].message.as_text(), "good two");

        let batch = LogBatch::parse(r#"{"r":"req-9","lg":[{"m":"no level"}]}"#).unwrap();
        assert_eq!(batch.request_id.as_deref(), Some("req-9"));
        assert!(batch.is_empty());
        assert_eq!(batch.rejected, 1);
    }

    #[test]
    fn test_message_json_rendering() {
        assert_eq!(MessagePayload::from("hi \"there\"").as_json(), r#""hi \"there\"""#);
        assert_eq!(MessagePayload::from(r#"{"a":1}"#).as_json(), r#"{"a":1}"#);
        assert_eq!(MessagePayload::from("{not json").as_json(), r#""{not json""#);

        let structured = MessagePayload::Structured(serde_json::json!({"k": [1, 2]}));
        assert_eq!(structured.as_json(), r#"{"k":[1,2]}"#);
        assert_eq!(structured.as_text(), r#"{"k":[1,2]}"#);
    }
}
