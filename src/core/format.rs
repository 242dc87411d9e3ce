//! Record rendering
//!
//! Chooses a human-readable layout for an entry from its payload shape and
//! level:
//! - no payload: a single head line
//! - flat record at TRACE/DEBUG: head line with ` (k=v ...)` appended
//! - anything else: head line, then the payload as an indented JSON tree
//!
//! Example: `[2025-01-08T10:30:45.123Z] [PID:4242] DEBUG: [tasks] fetched (count=3)`

use super::log_entry::LogEntry;
use super::log_level::LogLevel;
use super::payload::Payload;
use super::timestamp::TimestampFormat;
use serde_json::Value;

/// Layout chosen for a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStyle {
    /// Head line only
    Plain,
    /// Head line with inline `(k=v ...)` fields
    Inline,
    /// Head line followed by a multi-line tree
    Tree,
}

impl RenderStyle {
    pub fn select(level: LogLevel, payload: &Payload) -> Self {
        match payload {
            Payload::Absent => RenderStyle::Plain,
            Payload::FlatRecord(_) if level.is_verbose() => RenderStyle::Inline,
            Payload::FlatRecord(_) | Payload::Structured(_) => RenderStyle::Tree,
        }
    }
}

/// Render an entry as record text, without the trailing newline
pub fn render(entry: &LogEntry, timestamp_format: &TimestampFormat) -> String {
    let mut output = format!(
        "[{}] [PID:{}] {}: ",
        timestamp_format.format(&entry.timestamp),
        entry.pid,
        entry.level.to_str()
    );

    if let Some(ref context) = entry.context {
        output.push('[');
        output.push_str(context);
        output.push_str("] ");
    }
    output.push_str(&entry.message);

    match (RenderStyle::select(entry.level, &entry.payload), &entry.payload) {
        (RenderStyle::Inline, Payload::FlatRecord(record)) => {
            output.push_str(" (");
            output.push_str(&record.format_fields());
            output.push(')');
        }
        (RenderStyle::Tree, payload) => {
            if let Some(tree) = payload.to_json_value() {
                output.push('\n');
                output.push_str(&render_tree(&tree));
            }
        }
        _ => {}
    }

    output
}

/// Pretty-print a payload tree with two-space indentation
pub fn render_tree(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
