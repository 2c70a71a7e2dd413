use std::fmt;

/// Why a single event could not be logged.
///
/// None of these ever reach the bot runtime: the middleware pipeline turns
/// them into diagnostics and drops the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    /// Sink target missing or unusable. Fatal to the sink for the process lifetime.
    Configuration(String),
    /// No encoding registered for the event's concrete type
    Serialization { type_name: String, reason: String },
    /// The store rejected or never received the row
    Persistence(String),
    /// The text formatter does not recognize the event type
    Format { type_name: String },
}

impl LogError {
    pub fn configuration(message: impl Into<String>) -> Self {
        LogError::Configuration(message.into())
    }

    pub fn unregistered(type_name: &str) -> Self {
        LogError::Serialization {
            type_name: type_name.to_string(),
            reason: "no encoding registered".to_string(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, LogError::Configuration(_))
    }
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            LogError::Serialization { type_name, reason } => {
                write!(f, "cannot serialize {}: {}", type_name, reason)
            }
            LogError::Persistence(msg) => write!(f, "persistence error: {}", msg),
            LogError::Format { type_name } => write!(f, "unknown type for formatting: {}", type_name),
        }
    }
}

impl std::error::Error for LogError {}

impl From<rusqlite::Error> for LogError {
    fn from(e: rusqlite::Error) -> Self {
        LogError::Persistence(e.to_string())
    }
}

impl From<r2d2::Error> for LogError {
    fn from(e: r2d2::Error) -> Self {
        LogError::Persistence(format!("connection pool: {}", e))
    }
}

impl From<serde_json::Error> for LogError {
    fn from(e: serde_json::Error) -> Self {
        LogError::Serialization {
            type_name: "json".to_string(),
            reason: e.to_string(),
        }
    }
}

impl From<std::io::Error> for LogError {
    fn from(e: std::io::Error) -> Self {
        LogError::Persistence(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = LogError::unregistered("UnknownUpdate");
        assert_eq!(
            err.to_string(),
            "cannot serialize UnknownUpdate: no encoding registered"
        );
        assert!(LogError::configuration("BOT_LOG_URL not set").is_configuration());
    }
}
