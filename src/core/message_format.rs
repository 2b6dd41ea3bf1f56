//! Server-side message format
//!
//! The `serverSideMessageFormat` option is a template such as
//! `"%requestId | %logger | %level | %message"`. It is compiled once when the
//! configuration loads, then rendered for each dispatched entry.

use super::log_entry::MessagePayload;
use super::log_level::Level;
use super::timestamp::DateFormat;
use chrono::{DateTime, Utc};

/// Template used when no format is configured
pub const DEFAULT_MESSAGE_FORMAT: &str = "%message";

/// Recognized placeholders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Message,
    JsonMessage,
    Date,
    UtcDate,
    DateServer,
    UtcDateServer,
    Level,
    Logger,
    UserAgent,
    UserHostAddress,
    RequestId,
    Url,
    EntryId,
}

impl Placeholder {
    // Longer names first so `%dateServer` is not read as `%date` + "Server".
    const BY_NAME: [(&'static str, Placeholder); 13] = [
        ("userHostAddress", Placeholder::UserHostAddress),
        ("utcDateServer", Placeholder::UtcDateServer),
        ("jsonmessage", Placeholder::JsonMessage),
        ("dateServer", Placeholder::DateServer),
        ("userAgent", Placeholder::UserAgent),
        ("requestId", Placeholder::RequestId),
        ("message", Placeholder::Message),
        ("utcDate", Placeholder::UtcDate),
        ("entryId", Placeholder::EntryId),
        ("logger", Placeholder::Logger),
        ("level", Placeholder::Level),
        ("date", Placeholder::Date),
        ("url", Placeholder::Url),
    ];

    fn match_prefix(input: &str) -> Option<(Placeholder, usize)> {
        Self::BY_NAME
            .iter()
            .find(|(name, _)| input.starts_with(name))
            .map(|(name, placeholder)| (*placeholder, name.len()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Placeholder),
}

/// Values available to a template for one entry
#[derive(Debug, Clone, Copy)]
pub struct FormatFields<'a> {
    pub message: &'a MessagePayload,
    pub level: Level,
    pub logger: &'a str,
    pub user_agent: &'a str,
    pub user_host_address: &'a str,
    pub request_id: &'a str,
    pub url: &'a str,
    pub entry_id: Option<&'a str>,
    pub client_time: Option<DateTime<Utc>>,
    pub server_time: DateTime<Utc>,
}

/// Compiled message template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFormat {
    source: String,
    segments: Vec<Segment>,
}

impl MessageFormat {
    pub fn new(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(pos) = rest.find('%') {
            literal.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            match Placeholder::match_prefix(after) {
                Some((placeholder, len)) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(placeholder));
                    rest = &after[len..];
                }
                None => {
                    literal.push('%');
                    rest = after;
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            source: template.to_string(),
            segments,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn uses(&self, placeholder: Placeholder) -> bool {
        self.segments
            .iter()
            .any(|segment| *segment == Segment::Field(placeholder))
    }

    pub fn render(&self, fields: &FormatFields<'_>, date_format: &DateFormat) -> String {
        let mut out = String::with_capacity(self.source.len() + 64);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(placeholder) => {
                    Self::render_field(*placeholder, fields, date_format, &mut out)
                }
            }
        }
        out
    }

    fn render_field(
        placeholder: Placeholder,
        fields: &FormatFields<'_>,
        date_format: &DateFormat,
        out: &mut String,
    ) {
        let client_time = fields.client_time.unwrap_or(fields.server_time);
        match placeholder {
            Placeholder::Message => out.push_str(&fields.message.as_text()),
            Placeholder::JsonMessage => out.push_str(&fields.message.as_json()),
            Placeholder::Date | Placeholder::UtcDate => {
                out.push_str(&date_format.format(&client_time))
            }
            Placeholder::DateServer | Placeholder::UtcDateServer => {
                out.push_str(&date_format.format(&fields.server_time))
            }
            Placeholder::Level => out.push_str(fields.level.to_str()),
            Placeholder::Logger => out.push_str(fields.logger),
            Placeholder::UserAgent => out.push_str(fields.user_agent),
            Placeholder::UserHostAddress => out.push_str(fields.user_host_address),
            Placeholder::RequestId => out.push_str(fields.request_id),
            Placeholder::Url => out.push_str(fields.url),
            Placeholder::EntryId => out.push_str(fields.entry_id.unwrap_or("")),
        }
    }
}

impl Default for MessageFormat {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE_FORMAT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fields<'a>(message: &'a MessagePayload) -> FormatFields<'a> {
        FormatFields {
            message,
            level: Level::Warn,
            logger: "a.b",
            user_agent: "Mozilla/5.0",
            user_host_address: "10.0.0.1",
            request_id: "req-42",
            url: "/orders",
            entry_id: Some("e7"),
            client_time: Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).single(),
            server_time: Utc.with_ymd_and_hms(2025, 1, 8, 10, 31, 0).single().unwrap(),
        }
    }

    #[test]
    fn test_default_is_plain_message() {
        let message = MessagePayload::from("hello");
        let out = MessageFormat::default().render(&fields(&message), &DateFormat::Iso8601);
        assert_eq!(out, "hello");
    }

    #[test]
    fn test_request_id_template() {
        let message = MessagePayload::from("hello");
        let format = MessageFormat::new("%requestId | %logger | %level | %message");
        let out = format.render(&fields(&message), &DateFormat::Iso8601);
        assert_eq!(out, "req-42 | a.b | WARN | hello");
    }

    #[test]
    fn test_json_template() {
        let message = MessagePayload::Structured(serde_json::json!({"x": 1}));
        let format = MessageFormat::new(
            "{ 'requestId': '%requestId', 'clientdate': '%date', 'url': '%url', 'logmessage': %jsonmessage }",
        );
        let out = format.render(&fields(&message), &DateFormat::Iso8601);
        assert_eq!(
            out,
            "{ 'requestId': 'req-42', 'clientdate': '2025-01-08T10:30:45.000Z', 'url': '/orders', 'logmessage': {\"x\":1} }"
        );
    }

    #[test]
    fn test_server_date_not_confused_with_date() {
        let message = MessagePayload::from("m");
        let format = MessageFormat::new("%date/%dateServer");
        let out = format.render(&fields(&message), &DateFormat::Unix);
        let client = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap().timestamp();
        let server = Utc.with_ymd_and_hms(2025, 1, 8, 10, 31, 0).unwrap().timestamp();
        assert_eq!(out, format!("{}/{}", client, server));
    }

    #[test]
    fn test_unknown_placeholders_are_kept() {
        let message = MessagePayload::from("m");
        let format = MessageFormat::new("100% of %bogus: %message%");
        let out = format.render(&fields(&message), &DateFormat::Iso8601);
        assert_eq!(out, "100% of %bogus: m%");
        assert!(format.uses(Placeholder::Message));
        assert!(!format.uses(Placeholder::Url));
    }

    #[test]
    fn test_agent_and_address() {
        let message = MessagePayload::from("m");
        let format = MessageFormat::new("%userAgent@%userHostAddress#%entryId");
        let out = format.render(&fields(&message), &DateFormat::Iso8601);
        assert_eq!(out, "Mozilla/5.0@10.0.0.1#e7");
    }
}
