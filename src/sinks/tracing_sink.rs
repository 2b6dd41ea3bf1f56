//! Sink that re-emits client records as `tracing` events
//!
//! The client logger name travels as the `client_logger` field; the event
//! target is fixed so hosts can route client records with a filter directive
//! such as `rust_log_intake::client=info`.

use crate::core::{Level, LogSink};

pub const CLIENT_TARGET: &str = "rust_log_intake::client";

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl LogSink for TracingSink {
    fn log(&self, level: Level, logger_name: &str, message: &str) {
        match level {
            Level::Off => {}
            Level::All | Level::Trace => {
                tracing::trace!(target: CLIENT_TARGET, client_logger = logger_name, "{}", message)
            }
            Level::Debug => {
                tracing::debug!(target: CLIENT_TARGET, client_logger = logger_name, "{}", message)
            }
            Level::Info => {
                tracing::info!(target: CLIENT_TARGET, client_logger = logger_name, "{}", message)
            }
            Level::Warn => {
                tracing::warn!(target: CLIENT_TARGET, client_logger = logger_name, "{}", message)
            }
            Level::Error | Level::Fatal => {
                tracing::error!(
                    target: CLIENT_TARGET,
                    client_logger = logger_name,
                    fatal = matches!(level, Level::Fatal),
                    "{}",
                    message
                )
            }
        }
    }

    fn name(&self) -> &str {
        "tracing"
    }
}
