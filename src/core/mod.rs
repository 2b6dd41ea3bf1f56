//! Core intake types and traits

pub mod error;
pub mod log_entry;
pub mod log_level;
pub mod message_format;
pub mod metrics;
pub mod sink;
pub mod timestamp;

pub use error::{IntakeError, Result};
pub use log_entry::{ClientLogEntry, LogBatch, MessagePayload};
pub use log_level::Level;
pub use message_format::{FormatFields, MessageFormat, Placeholder, DEFAULT_MESSAGE_FORMAT};
pub use metrics::{DropReason, IntakeMetrics};
pub use sink::{LogSink, SinkRecord};
pub use timestamp::DateFormat;
