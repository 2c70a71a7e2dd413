use parking_lot::Mutex;

use super::LogSink;
use crate::entry::LogEntry;
use crate::error::LogError;

/// Keeps entries in memory. Used by the replay tool's dry-run mode and tests.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn write(&self, entry: &LogEntry) -> Result<(), LogError> {
        self.entries.lock().push(entry.clone());
        Ok(())
    }
}
