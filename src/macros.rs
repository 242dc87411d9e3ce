//! Logging macros with lazy message formatting.
//!
//! The level is checked before `format!` runs or the payload expression is
//! evaluated, so a suppressed call costs one comparison.
//!
//! # Examples
//!
//! ```no_run
//! use bridge_logger::prelude::*;
//! use bridge_logger::{debug, info};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let logger = Arc::new(
//!     Logger::builder()
//!         .path("/tmp/task-bridge-server.log")
//!         .build()
//!         .expect("log file must be writable"),
//! );
//! let tools = logger.context("tools");
//!
//! info!(tools, "Registered {} tools", 12);
//! debug!(tools, payload = json!({"tool": "create_task"}); "Dispatching call");
//! ```

/// Log through a [`ContextLogger`](crate::ContextLogger) at an explicit level.
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, payload = $payload:expr; $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.enabled(level) {
            logger.log(level, format!($($arg)+), $payload);
        }
    }};
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.enabled(level) {
            logger.log(level, format!($($arg)+), $crate::Payload::Absent);
        }
    }};
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}
