//! Request processing
//!
//! One call per inbound request. CORS and batch validation can fail the
//! request as a whole; after that every entry is filtered on its own and
//! either reaches the sink or is dropped silently.

use super::cors::{CorsDecision, CorsPolicy};
use super::request::{LogRequest, LogResponse, STATUS_BAD_REQUEST, STATUS_FORBIDDEN};
use super::state::IntakeState;
use crate::config::{ActiveConfiguration, Configuration, Element};
use crate::core::{
    ClientLogEntry, DropReason, FormatFields, IntakeMetrics, LogBatch, LogSink, Result,
};
use crate::sinks::TracingSink;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Process one request against a configuration snapshot
///
/// Returns the status and headers to send back. The sink is invoked once per
/// entry that survives filtering, in batch order.
pub fn process_log_request(
    body: &str,
    request: &LogRequest,
    server_time: DateTime<Utc>,
    state: &IntakeState,
    sink: &dyn LogSink,
    metrics: &IntakeMetrics,
) -> LogResponse {
    metrics.record_request();
    let options = state.options();
    let mut response = LogResponse::ok();

    match CorsPolicy::new(options.cors_allowed_origins.as_ref()).evaluate(request) {
        CorsDecision::Rejected => {
            metrics.record_cors_rejected();
            tracing::warn!(
                origin = request.origin.as_deref().unwrap_or(""),
                method = %request.method,
                "rejected log request from disallowed origin"
            );
            return LogResponse::new(STATUS_FORBIDDEN);
        }
        CorsDecision::Allowed { origin } => {
            CorsPolicy::apply_headers(&origin, request.is_preflight(), &mut response);
        }
        CorsDecision::NotApplicable => {}
    }

    if request.is_preflight() {
        return response;
    }

    if !options.enabled {
        tracing::debug!("logging disabled, ignoring batch");
        return response;
    }

    let batch = match LogBatch::parse(body) {
        Ok(batch) => batch,
        Err(e) => {
            metrics.record_malformed();
            tracing::warn!(error = %e, body_len = body.len(), "malformed log batch");
            response.status = STATUS_BAD_REQUEST;
            return response;
        }
    };

    let request_id = request
        .request_id
        .clone()
        .or_else(|| batch.request_id.clone())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let context = EntryContext {
        request,
        request_id: &request_id,
        server_time,
        state,
    };
    if batch.rejected > 0 {
        tracing::debug!(
            request_id = %request_id,
            rejected = batch.rejected,
            "skipped malformed entries"
        );
        for _ in 0..batch.rejected {
            metrics.record_received();
            metrics.record_dropped(DropReason::MalformedEntry);
        }
    }
    for entry in &batch.entries {
        metrics.record_received();
        match context.dispatch(entry, sink) {
            Ok(()) => {
                metrics.record_logged();
            }
            Err(reason) => {
                metrics.record_dropped(reason);
            }
        }
    }

    tracing::debug!(
        request_id = %request_id,
        entries = batch.len(),
        "processed log batch"
    );
    response
}

/// Values shared by every entry of one request
struct EntryContext<'a> {
    request: &'a LogRequest,
    request_id: &'a str,
    server_time: DateTime<Utc>,
    state: &'a IntakeState,
}

impl EntryContext<'_> {
    fn dispatch(&self, entry: &ClientLogEntry, sink: &dyn LogSink) -> std::result::Result<(), DropReason> {
        let options = self.state.options();
        let logger = self.state.resolve(entry.logger_name());
        let text = entry.message.as_text();

        if let Some(reason) = logger.filter(
            entry.level,
            &text,
            &self.request.user_agent,
            &self.request.user_host_address,
        ) {
            return Err(reason);
        }
        if !logger.check_once_only(&text) {
            return Err(DropReason::OnceOnly);
        }

        let fields = FormatFields {
            message: &entry.message,
            level: entry.level,
            logger: entry.logger_name(),
            user_agent: &self.request.user_agent,
            user_host_address: &self.request.user_host_address,
            request_id: self.request_id,
            url: &self.request.url,
            entry_id: entry.entry_id.as_deref(),
            client_time: entry.client_time(),
            server_time: self.server_time,
        };
        let message = options.message_format.render(&fields, &options.date_format);

        sink.log(
            options.server_side_level.unwrap_or(entry.level),
            options
                .server_side_logger
                .as_deref()
                .unwrap_or(entry.logger_name()),
            &message,
        );
        Ok(())
    }
}

/// Intake endpoint bound to a sink and an active configuration
///
/// # Example
///
/// ```
/// use rust_log_intake::{RequestProcessor, LogRequest};
/// use rust_log_intake::sinks::MemorySink;
/// use std::sync::Arc;
///
/// let sink = Arc::new(MemorySink::new());
/// let processor = RequestProcessor::builder().sink(Arc::clone(&sink)).build();
///
/// let response = processor.process(r#"{"lg":[{"l":4000,"m":"hello","n":"app"}]}"#, &LogRequest::new());
/// assert_eq!(response.status, 200);
/// assert_eq!(sink.records()[0].message, "hello");
/// ```
pub struct RequestProcessor {
    sink: Arc<dyn LogSink>,
    configuration: Arc<ActiveConfiguration>,
    metrics: Arc<IntakeMetrics>,
}

impl RequestProcessor {
    pub fn builder() -> RequestProcessorBuilder {
        RequestProcessorBuilder::new()
    }

    /// Process with the current time as server time
    pub fn process(&self, body: &str, request: &LogRequest) -> LogResponse {
        self.process_at(body, request, Utc::now())
    }

    pub fn process_at(
        &self,
        body: &str,
        request: &LogRequest,
        server_time: DateTime<Utc>,
    ) -> LogResponse {
        let state = self.configuration.snapshot();
        process_log_request(
            body,
            request,
            server_time,
            &state,
            self.sink.as_ref(),
            &self.metrics,
        )
    }

    /// Replace the active configuration; the old one stays on error
    pub fn reload(&self, root: &Element) -> Result<()> {
        self.configuration.reload(root)
    }

    pub fn configuration(&self) -> &Arc<ActiveConfiguration> {
        &self.configuration
    }

    pub fn metrics(&self) -> &IntakeMetrics {
        &self.metrics
    }

    pub fn flush(&self) {
        self.sink.flush();
    }
}

impl std::fmt::Debug for RequestProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestProcessor")
            .field("sink", &self.sink.name())
            .field("configuration", &self.configuration)
            .finish()
    }
}

pub struct RequestProcessorBuilder {
    sink: Option<Arc<dyn LogSink>>,
    configuration: Option<Arc<ActiveConfiguration>>,
    metrics: Option<Arc<IntakeMetrics>>,
}

impl RequestProcessorBuilder {
    pub fn new() -> Self {
        Self {
            sink: None,
            configuration: None,
            metrics: None,
        }
    }

    pub fn sink<S: LogSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    pub fn shared_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = Some(Arc::new(ActiveConfiguration::new(configuration)));
        self
    }

    /// Share an active configuration with other components, e.g. a reloader
    pub fn active_configuration(mut self, configuration: Arc<ActiveConfiguration>) -> Self {
        self.configuration = Some(configuration);
        self
    }

    pub fn metrics(mut self, metrics: Arc<IntakeMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Unset parts default to a [`TracingSink`], an accept-all configuration
    /// and fresh metrics
    pub fn build(self) -> RequestProcessor {
        RequestProcessor {
            sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink::new())),
            configuration: self.configuration.unwrap_or_default(),
            metrics: self.metrics.unwrap_or_default(),
        }
    }
}

impl Default for RequestProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigParser, ROOT_TAG};
    use crate::core::Level;
    use crate::processing::cors::ALLOW_ORIGIN_HEADER;
    use crate::processing::request::STATUS_OK;
    use crate::sinks::MemorySink;
    use chrono::TimeZone;

    fn state(root: Element) -> IntakeState {
        IntakeState::new(ConfigParser::new().parse_configuration(&root).unwrap())
    }

    fn server_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn run(state: &IntakeState, body: &str, request: &LogRequest) -> (LogResponse, MemorySink) {
        let sink = MemorySink::new();
        let metrics = IntakeMetrics::new();
        let response = process_log_request(body, request, server_time(), state, &sink, &metrics);
        (response, sink)
    }

    #[test]
    fn test_entries_dispatched_in_order() {
        let state = state(Element::new(ROOT_TAG));
        let body = r#"[{"l":"INFO","m":"one","n":"a"},{"l":"ERROR","m":"two","n":"b.c"}]"#;
        let (response, sink) = run(&state, body, &LogRequest::new());

        assert_eq!(response.status, STATUS_OK);
        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!((records[0].level, records[0].logger.as_str()), (Level::Info, "a"));
        assert_eq!((records[1].level, records[1].logger.as_str()), (Level::Error, "b.c"));
    }

    #[test]
    fn test_malformed_batch() {
        let state = state(Element::new(ROOT_TAG));
        let metrics = IntakeMetrics::new();
        let sink = MemorySink::new();
        let response =
            process_log_request("{oops", &LogRequest::new(), server_time(), &state, &sink, &metrics);
        assert_eq!(response.status, STATUS_BAD_REQUEST);
        assert!(sink.is_empty());
        assert_eq!(metrics.malformed_batches(), 1);
    }

    #[test]
    fn test_bad_entry_does_not_fail_batch() {
        let state = state(Element::new(ROOT_TAG));
        let metrics = IntakeMetrics::new();
        let sink = MemorySink::new();
        let body = r#"[
            {"l":3000,"m":"good one"},
            {"l":"LOUD","m":"bad level"},
            {"m":"no level"},
            {"l":4000,"m":"good two"}
        ]"#;
        let response =
            process_log_request(body, &LogRequest::new(), server_time(), &state, &sink, &metrics);

        assert_eq!(response.status, STATUS_OK);
        let messages: Vec<String> = sink.records().into_iter().map(|r| r.message).collect();
        assert_eq!(messages, vec!["good one", "good two"]);
        assert_eq!(metrics.malformed_batches(), 0);
        assert_eq!(metrics.entries_received(), 4);
        assert_eq!(metrics.entries_logged(), 2);
        assert_eq!(metrics.dropped(DropReason::MalformedEntry), 2);
    }

    #[test]
    fn test_server_side_overrides_and_format() {
        let state = state(
            Element::new(ROOT_TAG)
                .with_attribute("serverSideLogger", "jslogger")
                .with_attribute("serverSideLevel", "WARN")
                .with_attribute(
                    "serverSideMessageFormat",
                    "%requestId | %logger | %level | %userAgent | %message",
                ),
        );
        let request = LogRequest::new()
            .with_user_agent("Chrome")
            .with_request_id("req-9");
        let (_, sink) = run(&state, r#"[{"l":2000,"m":"hi","n":"app.ui"}]"#, &request);

        let records = sink.records();
        assert_eq!(records[0].level, Level::Warn);
        assert_eq!(records[0].logger, "jslogger");
        assert_eq!(records[0].message, "req-9 | app.ui | DEBUG | Chrome | hi");
    }

    #[test]
    fn test_request_id_from_batch_then_generated() {
        let state = state(Element::new(ROOT_TAG).with_attribute("serverSideMessageFormat", "%requestId"));

        let (_, sink) = run(&state, r#"{"r":"batch-id","lg":[{"l":3000,"m":"x"}]}"#, &LogRequest::new());
        assert_eq!(sink.records()[0].message, "batch-id");

        let (_, sink) = run(&state, r#"{"lg":[{"l":3000,"m":"x"}]}"#, &LogRequest::new());
        assert!(uuid::Uuid::parse_str(&sink.records()[0].message).is_ok());
    }

    #[test]
    fn test_disabled_configuration_dispatches_nothing() {
        let state = state(Element::new(ROOT_TAG).with_attribute("enabled", "false"));
        let (response, sink) = run(&state, r#"[{"l":6000,"m":"x"}]"#, &LogRequest::new());
        assert_eq!(response.status, STATUS_OK);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_preflight_processes_no_entries() {
        let state = state(
            Element::new(ROOT_TAG).with_attribute("corsAllowedOriginsRegex", "^https://ok\\.com$"),
        );
        let request = LogRequest::new()
            .with_method("OPTIONS")
            .with_origin("https://ok.com");
        let (response, sink) = run(&state, r#"[{"l":6000,"m":"x"}]"#, &request);

        assert_eq!(response.status, STATUS_OK);
        assert_eq!(response.header(ALLOW_ORIGIN_HEADER), Some("https://ok.com"));
        assert_eq!(response.headers.len(), 4);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_preflight_without_cors_configured() {
        let state = state(Element::new(ROOT_TAG));
        let request = LogRequest::new()
            .with_method("OPTIONS")
            .with_origin("https://anywhere.com");
        let (response, sink) = run(&state, "", &request);
        assert_eq!(response.status, STATUS_OK);
        assert!(response.headers.is_empty());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_drop_metrics() {
        let state = state(
            Element::new(ROOT_TAG).with_child(
                Element::new("logger")
                    .with_attribute("level", "INFO")
                    .with_attribute("disallow", "secret")
                    .with_child(Element::new("onceOnly")),
            ),
        );
        let metrics = IntakeMetrics::new();
        let sink = MemorySink::new();
        let body = r#"[
            {"l":"DEBUG","m":"low"},
            {"l":"INFO","m":"secret stuff"},
            {"l":"INFO","m":"first"},
            {"l":"INFO","m":"second"}
        ]"#;
        process_log_request(body, &LogRequest::new(), server_time(), &state, &sink, &metrics);

        assert_eq!(metrics.entries_received(), 4);
        assert_eq!(metrics.entries_logged(), 1);
        assert_eq!(metrics.dropped(DropReason::BelowLevel), 1);
        assert_eq!(metrics.dropped(DropReason::Disallowed), 1);
        assert_eq!(metrics.dropped(DropReason::OnceOnly), 1);
        assert_eq!(sink.records()[0].message, "first");
    }

    #[test]
    fn test_builder_defaults() {
        let processor = RequestProcessor::builder().build();
        let response = processor.process(r#"[{"l":1000,"m":"x"}]"#, &LogRequest::new());
        assert!(response.is_success());
        assert_eq!(processor.metrics().entries_logged(), 1);
    }
}
