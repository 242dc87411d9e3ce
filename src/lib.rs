//! # Bridge Logger
//!
//! File-backed structured diagnostic logging for protocol bridge servers
//! whose stdout (or socket) carries machine-readable protocol messages.
//!
//! ## Features
//!
//! - **Off the protocol channel**: records only ever go to the log file
//! - **Fixed threshold**: decided once at startup; suppressed calls do no formatting
//! - **Shape-aware rendering**: small flat payloads inline, everything else as a tree
//! - **Thread safe**: any number of handlers write through one serialized sink
//! - **Clean shutdown**: termination signals flush and close the file exactly once

pub mod config;
pub mod core;
#[cfg(feature = "lifecycle")]
pub mod lifecycle;
pub mod macros;

pub mod prelude {
    pub use crate::config::LoggingConfig;
    pub use crate::core::{
        ContextLogger, FieldValue, FlatRecord, LogLevel, Logger, LoggerBuilder, LoggerError,
        Payload, Result, TimestampFormat, DEFAULT_SHUTDOWN_TIMEOUT,
    };
    #[cfg(feature = "lifecycle")]
    pub use crate::lifecycle::Lifecycle;
}

pub use config::LoggingConfig;
pub use core::{
    ContextLogger, FieldValue, FileSink, FlatRecord, LogEntry, LogLevel, Logger, LoggerBuilder,
    LoggerError, LoggerMetrics, MemoryBuffer, MemorySink, Payload, RenderStyle, Result, Sink,
    SinkState, TimestampFormat, DEFAULT_SHUTDOWN_TIMEOUT, MAX_INLINE_FIELDS,
};
#[cfg(feature = "lifecycle")]
pub use lifecycle::Lifecycle;
#[cfg(all(feature = "lifecycle", unix))]
pub use lifecycle::ShutdownHandle;
