//! Log entry structure

use super::log_level::LogLevel;
use super::payload::Payload;
use chrono::{DateTime, Utc};

/// One log call, built only after the level filter has accepted it
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub pid: u32,
    pub level: LogLevel,
    pub context: Option<String>,
    pub message: String,
    pub payload: Payload,
}

impl LogEntry {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// so a message can never start a forged record of its own.
    pub(crate) fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, message: impl AsRef<str>) -> Self {
        Self {
            timestamp: Utc::now(),
            pid: std::process::id(),
            level,
            context: None,
            message: Self::sanitize_message(message.as_ref()),
            payload: Payload::Absent,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(Self::sanitize_message(&context.into()));
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_entry_carries_pid() {
        let entry = LogEntry::new(LogLevel::Info, "hello");
        assert_eq!(entry.pid, std::process::id());
        assert!(entry.context.is_none());
        assert!(entry.payload.is_absent());
    }

    #[test]
    fn test_message_is_sanitized() {
        let entry = LogEntry::new(LogLevel::Warn, "a\nb\rc\td");
        assert_eq!(entry.message, "a\\nb\\rc\\td");
    }

    #[test]
    fn test_builder_methods() {
        let entry = LogEntry::new(LogLevel::Debug, "x")
            .with_context("tasks")
            .with_payload(json!({"a": 1}));
        assert_eq!(entry.context.as_deref(), Some("tasks"));
        assert!(!entry.payload.is_absent());
    }
}
