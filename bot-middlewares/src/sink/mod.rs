//! Destinations for log entries.

pub mod console;
pub mod memory;
pub mod store;

pub use console::ConsoleSink;
pub use memory::MemorySink;
pub use store::{LazyStoreSink, StoreSink};

use crate::entry::LogEntry;
use crate::error::LogError;

/// Anything that accepts finished log entries.
///
/// A write either succeeds or reports why it did not; nothing is retried.
pub trait LogSink: Send + Sync {
    fn name(&self) -> &str;

    fn write(&self, entry: &LogEntry) -> Result<(), LogError>;
}
