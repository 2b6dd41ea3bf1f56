//! Sink trait for log output destinations

use super::log_level::Level;

/// Destination for entries that survive filtering
///
/// Implementations are shared across concurrently processed requests, so
/// `log` takes `&self`. Delivery is fire-and-forget: the processor never
/// waits on, or inspects, what the sink does with the record.
pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, logger_name: &str, message: &str);

    fn flush(&self) {}

    fn name(&self) -> &str;
}

impl<S: LogSink + ?Sized> LogSink for std::sync::Arc<S> {
    fn log(&self, level: Level, logger_name: &str, message: &str) {
        (**self).log(level, logger_name, message)
    }

    fn flush(&self) {
        (**self).flush()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Owned copy of one sink invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkRecord {
    pub level: Level,
    pub logger: String,
    pub message: String,
}

impl SinkRecord {
    pub fn new(level: Level, logger: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            logger: logger.into(),
            message: message.into(),
        }
    }
}
