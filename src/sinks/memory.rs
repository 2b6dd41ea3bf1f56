//! In-memory sink
//!
//! Keeps every record it receives. Meant for tests and for hosts that forward
//! records elsewhere in bulk.

use crate::core::{Level, LogSink, SinkRecord};
use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<SinkRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Copy of everything received so far
    pub fn records(&self) -> Vec<SinkRecord> {
        self.records.lock().clone()
    }

    /// Take everything received so far, leaving the sink empty
    pub fn drain(&self) -> Vec<SinkRecord> {
        std::mem::take(&mut *self.records.lock())
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: Level, logger_name: &str, message: &str) {
        self.records
            .lock()
            .push(SinkRecord::new(level, logger_name, message));
    }

    fn name(&self) -> &str {
        "memory"
    }
}
