use std::io::{self, Write};

use parking_lot::Mutex;

use super::LogSink;
use crate::entry::LogEntry;
use crate::error::LogError;

/// Writes each entry's data as one line, standard output by default
pub struct ConsoleSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::stdout()
    }
}

impl LogSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn write(&self, entry: &LogEntry) -> Result<(), LogError> {
        let mut out = self.out.lock();
        writeln!(out, "{}", entry.data)?;
        out.flush()?;
        Ok(())
    }
}
