//! Sink implementations

#[cfg(feature = "async-sink")]
pub mod async_sink;
#[cfg(feature = "console")]
pub mod console;
pub mod memory;
pub mod tracing_sink;

#[cfg(feature = "async-sink")]
pub use async_sink::{AsyncSink, AsyncSinkMetrics, OverflowCallback, OverflowPolicy};
#[cfg(feature = "console")]
pub use console::ConsoleSink;
pub use memory::MemorySink;
pub use tracing_sink::TracingSink;
