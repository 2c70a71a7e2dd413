//! The normalized record written to a sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Request sent by the bot
    Out,
    /// Result or update received by the bot
    In,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Out => "OUT",
            Direction::In => "IN",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the `bot_log` table, or one console line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Capture time, not the event's own timestamp
    pub date_time: DateTime<Utc>,
    pub app_name: String,
    pub direction: Direction,
    pub data: String,
    pub class_name: String,
    /// Machine that captured the entry
    pub host: String,
}

impl LogEntry {
    pub fn new(app_name: &str, host: &str, direction: Direction, class_name: &str, data: String) -> Self {
        Self {
            date_time: Utc::now(),
            app_name: app_name.to_string(),
            direction,
            data,
            class_name: class_name.to_string(),
            host: host.to_string(),
        }
    }
}
