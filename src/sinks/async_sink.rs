//! Channel-backed sink
//!
//! Request threads hand records to a bounded queue and return immediately; a
//! worker thread drains the queue in batches and forwards to the wrapped sink.
//! What happens when the queue is full is set by an [`OverflowPolicy`].

use crate::core::{Level, LogSink, SinkRecord};
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender, TrySendError};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Time `flush` and `Drop` wait for the worker
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

const BATCH_SIZE: usize = 50;

/// Policy for a full queue
///
/// # Example
///
/// ```
/// use rust_log_intake::sinks::OverflowPolicy;
/// use std::time::Duration;
///
/// let policy = OverflowPolicy::default();
/// assert_eq!(policy, OverflowPolicy::AlertAndDrop);
///
/// let policy = OverflowPolicy::BlockWithTimeout(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Drop the record, counting it
    DropNewest,
    /// Wait for space
    Block,
    /// Wait for space up to a timeout, then drop with an alert
    BlockWithTimeout(Duration),
    /// Drop with a warning and the overflow callback
    #[default]
    AlertAndDrop,
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::DropNewest => write!(f, "DropNewest"),
            OverflowPolicy::Block => write!(f, "Block"),
            OverflowPolicy::BlockWithTimeout(d) => write!(f, "BlockWithTimeout({:?})", d),
            OverflowPolicy::AlertAndDrop => write!(f, "AlertAndDrop"),
        }
    }
}

/// Called with the running total of dropped records
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;

enum Command {
    Record(SinkRecord),
    Flush(Sender<()>),
}

#[derive(Debug, Default)]
pub struct AsyncSinkMetrics {
    delivered: AtomicU64,
    dropped: AtomicU64,
    queue_full_events: AtomicU64,
    critical_preserved: AtomicU64,
}

impl AsyncSinkMetrics {
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    /// Error and Fatal records written synchronously because the queue was full
    pub fn critical_preserved(&self) -> u64 {
        self.critical_preserved.load(Ordering::Relaxed)
    }
}

pub struct AsyncSink {
    inner: Arc<dyn LogSink>,
    sender: Option<Sender<Command>>,
    worker: Option<thread::JoinHandle<()>>,
    metrics: Arc<AsyncSinkMetrics>,
    overflow_policy: OverflowPolicy,
    on_overflow: Option<OverflowCallback>,
}

impl AsyncSink {
    pub fn new(inner: Arc<dyn LogSink>, capacity: usize) -> Self {
        Self::with_policy(inner, capacity, OverflowPolicy::default(), None)
    }

    pub fn with_policy(
        inner: Arc<dyn LogSink>,
        capacity: usize,
        overflow_policy: OverflowPolicy,
        on_overflow: Option<OverflowCallback>,
    ) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        let metrics = Arc::new(AsyncSinkMetrics::default());
        let worker_sink = Arc::clone(&inner);
        let worker_metrics = Arc::clone(&metrics);

        let worker = thread::Builder::new()
            .name("log-intake-sink".to_string())
            .spawn(move || run_worker(receiver, worker_sink.as_ref(), &worker_metrics))
            .map_err(|e| tracing::warn!(error = %e, "failed to spawn sink worker, writing synchronously"))
            .ok();

        Self {
            inner,
            sender: worker.as_ref().map(|_| sender),
            worker,
            metrics,
            overflow_policy,
            on_overflow,
        }
    }

    pub fn metrics(&self) -> &AsyncSinkMetrics {
        &self.metrics
    }

    pub fn overflow_policy(&self) -> &OverflowPolicy {
        &self.overflow_policy
    }

    fn handle_overflow(&self, sender: &Sender<Command>, record: SinkRecord) {
        self.metrics.queue_full_events.fetch_add(1, Ordering::Relaxed);

        // Error and Fatal are never dropped
        if record.level >= Level::Error {
            self.metrics.critical_preserved.fetch_add(1, Ordering::Relaxed);
            self.write_sync(&record);
            return;
        }

        match &self.overflow_policy {
            OverflowPolicy::DropNewest => {
                self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
            }
            OverflowPolicy::Block => {
                let _ = sender.send(Command::Record(record));
            }
            OverflowPolicy::BlockWithTimeout(timeout) => {
                if let Err(SendTimeoutError::Timeout(_)) =
                    sender.send_timeout(Command::Record(record), *timeout)
                {
                    self.alert_and_drop();
                }
            }
            OverflowPolicy::AlertAndDrop => self.alert_and_drop(),
        }
    }

    fn alert_and_drop(&self) {
        let dropped = self.metrics.dropped.fetch_add(1, Ordering::Relaxed) + 1;

        // First drop and every thousandth after
        if dropped == 1 || dropped % 1000 == 0 {
            tracing::warn!(
                dropped,
                policy = %self.overflow_policy,
                "sink queue full, dropping client log records"
            );
            if let Some(callback) = &self.on_overflow {
                callback(dropped);
            }
        }
    }

    fn write_sync(&self, record: &SinkRecord) {
        if deliver(self.inner.as_ref(), record) {
            self.metrics.delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl LogSink for AsyncSink {
    fn log(&self, level: Level, logger_name: &str, message: &str) {
        let record = SinkRecord::new(level, logger_name, message);
        let Some(sender) = &self.sender else {
            self.write_sync(&record);
            return;
        };

        match sender.try_send(Command::Record(record)) {
            Ok(()) => {}
            Err(TrySendError::Full(Command::Record(record))) => self.handle_overflow(sender, record),
            Err(TrySendError::Full(Command::Flush(_))) | Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Wait until everything queued before this call reached the wrapped sink
    fn flush(&self) {
        if let Some(sender) = &self.sender {
            let (ack, done) = bounded(1);
            if sender
                .send_timeout(Command::Flush(ack), DEFAULT_SHUTDOWN_TIMEOUT)
                .is_ok()
                && done.recv_timeout(DEFAULT_SHUTDOWN_TIMEOUT).is_err()
            {
                tracing::warn!("timed out waiting for sink worker to flush");
            }
        } else {
            self.inner.flush();
        }
    }

    fn name(&self) -> &str {
        "async"
    }
}

impl Drop for AsyncSink {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("sink worker panicked during shutdown");
            }
        }
    }
}

fn run_worker(receiver: Receiver<Command>, sink: &dyn LogSink, metrics: &AsyncSinkMetrics) {
    let mut batch = Vec::with_capacity(BATCH_SIZE);

    while let Ok(command) = receiver.recv() {
        batch.push(command);
        while batch.len() < BATCH_SIZE {
            match receiver.try_recv() {
                Ok(command) => batch.push(command),
                Err(_) => break,
            }
        }

        for command in batch.drain(..) {
            match command {
                Command::Record(record) => {
                    if deliver(sink, &record) {
                        metrics.delivered.fetch_add(1, Ordering::Relaxed);
                    } else {
                        metrics.dropped.fetch_add(1, Ordering::Relaxed);
                    }
                }
                Command::Flush(ack) => {
                    sink.flush();
                    let _ = ack.send(());
                }
            }
        }
    }
    sink.flush();
}

/// Forward one record; a panicking sink costs that record only
fn deliver(sink: &dyn LogSink, record: &SinkRecord) -> bool {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        sink.log(record.level, &record.logger, &record.message)
    }));

    match result {
        Ok(()) => true,
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            tracing::error!(sink = sink.name(), panic = %panic_msg, "sink panicked, record lost");
            false
        }
    }
}
