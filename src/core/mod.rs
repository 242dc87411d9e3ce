//! Core logger types and traits

pub mod context;
pub mod error;
pub mod format;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod payload;
pub mod sink;
pub mod timestamp;

pub use context::ContextLogger;
pub use error::{LoggerError, Result};
pub use format::RenderStyle;
pub use log_entry::LogEntry;
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder, DEFAULT_SHUTDOWN_TIMEOUT};
pub use metrics::LoggerMetrics;
pub use payload::{FieldValue, FlatRecord, Payload, MAX_INLINE_FIELDS};
pub use sink::{FileSink, MemoryBuffer, MemorySink, Sink, SinkState};
pub use timestamp::TimestampFormat;
