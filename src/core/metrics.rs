//! Intake metrics for observability
//!
//! Counters for requests and entries seen by the request processor, with
//! one counter per reason an entry can be silently dropped.

use std::sync::atomic::{AtomicU64, Ordering};

/// Why an entry did not reach the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Entry severity below the logger threshold
    BelowLevel,
    /// User agent or client address rejected by a logger regex
    ClientFilter,
    /// Message matched the logger's `disallow` pattern
    Disallowed,
    /// Suppressed by a fired once-only rule
    OnceOnly,
    /// None of the logger's appenders admits the entry
    NoAppender,
    /// Entry inside a valid batch that is not a log entry
    MalformedEntry,
}

impl DropReason {
    pub const ALL: [DropReason; 6] = [
        DropReason::BelowLevel,
        DropReason::ClientFilter,
        DropReason::Disallowed,
        DropReason::OnceOnly,
        DropReason::NoAppender,
        DropReason::MalformedEntry,
    ];
}

/// Metrics for intake observability
///
/// # Example
///
/// ```
/// use rust_log_intake::{DropReason, IntakeMetrics};
///
/// let metrics = IntakeMetrics::new();
/// metrics.record_received();
/// metrics.record_dropped(DropReason::OnceOnly);
///
/// assert_eq!(metrics.entries_received(), 1);
/// assert_eq!(metrics.dropped(DropReason::OnceOnly), 1);
/// ```
#[derive(Debug)]
pub struct IntakeMetrics {
    requests: AtomicU64,
    cors_rejected: AtomicU64,
    malformed_batches: AtomicU64,
    entries_received: AtomicU64,
    entries_logged: AtomicU64,
    dropped_below_level: AtomicU64,
    dropped_client_filter: AtomicU64,
    dropped_disallowed: AtomicU64,
    dropped_once_only: AtomicU64,
    dropped_no_appender: AtomicU64,
    dropped_malformed_entry: AtomicU64,
}

impl IntakeMetrics {
    pub const fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            cors_rejected: AtomicU64::new(0),
            malformed_batches: AtomicU64::new(0),
            entries_received: AtomicU64::new(0),
            entries_logged: AtomicU64::new(0),
            dropped_below_level: AtomicU64::new(0),
            dropped_client_filter: AtomicU64::new(0),
            dropped_disallowed: AtomicU64::new(0),
            dropped_once_only: AtomicU64::new(0),
            dropped_no_appender: AtomicU64::new(0),
            dropped_malformed_entry: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn cors_rejected(&self) -> u64 {
        self.cors_rejected.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn malformed_batches(&self) -> u64 {
        self.malformed_batches.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn entries_received(&self) -> u64 {
        self.entries_received.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn entries_logged(&self) -> u64 {
        self.entries_logged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped(&self, reason: DropReason) -> u64 {
        self.drop_counter(reason).load(Ordering::Relaxed)
    }

    /// Total entries dropped for any reason
    pub fn dropped_total(&self) -> u64 {
        DropReason::ALL
            .iter()
            .map(|reason| self.dropped(*reason))
            .sum()
    }

    #[inline]
    pub fn record_request(&self) -> u64 {
        self.requests.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_cors_rejected(&self) -> u64 {
        self.cors_rejected.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_malformed(&self) -> u64 {
        self.malformed_batches.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_received(&self) -> u64 {
        self.entries_received.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.entries_logged.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self, reason: DropReason) -> u64 {
        self.drop_counter(reason).fetch_add(1, Ordering::Relaxed)
    }

    fn drop_counter(&self, reason: DropReason) -> &AtomicU64 {
        match reason {
            DropReason::BelowLevel => &self.dropped_below_level,
            DropReason::ClientFilter => &self.dropped_client_filter,
            DropReason::Disallowed => &self.dropped_disallowed,
            DropReason::OnceOnly => &self.dropped_once_only,
            DropReason::NoAppender => &self.dropped_no_appender,
            DropReason::MalformedEntry => &self.dropped_malformed_entry,
        }
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if no entries have been received.
    pub fn drop_rate(&self) -> f64 {
        let received = self.entries_received() as f64;
        if received == 0.0 {
            0.0
        } else {
            (self.dropped_total() as f64 / received) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        for counter in [
            &self.requests,
            &self.cors_rejected,
            &self.malformed_batches,
            &self.entries_received,
            &self.entries_logged,
            &self.dropped_below_level,
            &self.dropped_client_filter,
            &self.dropped_disallowed,
            &self.dropped_once_only,
            &self.dropped_no_appender,
            &self.dropped_malformed_entry,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for IntakeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
