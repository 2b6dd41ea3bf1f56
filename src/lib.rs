//! # Rust Log Intake
//!
//! Server-side intake for log batches posted by a browser logging client.
//! A declarative configuration names loggers and appenders; each inbound
//! batch is checked against it and surviving entries go to a [`LogSink`].
//!
//! ## Features
//!
//! - **Extensible configuration**: tag handlers registered per element name,
//!   with third-party tags loaded through `<extension>` elements
//! - **Client code generation**: the same configuration yields the client's
//!   initialization statements
//! - **Per-logger filtering**: severity, user agent, client address,
//!   `disallow` patterns and once-only suppression
//! - **Safe reload**: configurations swap atomically, a broken one is never
//!   activated
//!
//! ## Example
//!
//! ```
//! use rust_log_intake::prelude::*;
//! use rust_log_intake::element;
//! use std::sync::Arc;
//!
//! let config = element!("logging", [
//!     element!("logger", { "name" => "checkout", "level" => "WARN" }),
//! ]);
//!
//! let sink = Arc::new(MemorySink::new());
//! let processor = RequestProcessor::builder()
//!     .sink(Arc::clone(&sink))
//!     .active_configuration(Arc::new(ActiveConfiguration::load(&config).unwrap()))
//!     .build();
//!
//! let body = r#"{"r":"req-1","lg":[
//!     {"l":3000,"m":"cart opened","n":"checkout"},
//!     {"l":5000,"m":"payment failed","n":"checkout"}
//! ]}"#;
//! let response = processor.process(body, &LogRequest::new());
//!
//! assert_eq!(response.status, 200);
//! assert_eq!(sink.len(), 1);
//! assert_eq!(sink.records()[0].level, Level::Error);
//! ```

pub mod config;
pub mod core;
pub mod macros;
pub mod processing;
pub mod sinks;

pub mod prelude {
    pub use crate::config::{
        ActiveConfiguration, ConfigParser, Configuration, Element, ExtensionRegistry,
        ParseEnvironment, TagInfo,
    };
    pub use crate::core::{
        DateFormat, DropReason, IntakeError, IntakeMetrics, Level, LogBatch, LogSink,
        MessageFormat, Result, SinkRecord,
    };
    pub use crate::processing::{LogRequest, LogResponse, RequestProcessor};
    pub use crate::sinks::{MemorySink, TracingSink};
}

pub use crate::config::{ActiveConfiguration, ConfigParser, Configuration, Element};
pub use crate::core::{
    ClientLogEntry, DateFormat, DropReason, IntakeError, IntakeMetrics, Level, LogBatch, LogSink,
    MessageFormat, MessagePayload, Result, SinkRecord,
};
pub use crate::processing::{
    process_log_request, LogRequest, LogResponse, RequestProcessor, RequestProcessorBuilder,
};
