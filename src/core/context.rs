//! Per-subsystem logging facade
//!
//! A [`ContextLogger`] pairs a subsystem tag with the shared [`Logger`]. It is
//! cheap to clone and can be handed to every request handler; all instances
//! write through the same sink, so records from different contexts appear in
//! sink order, not in the order the contexts were created.
//!
//! # Example
//!
//! ```no_run
//! use bridge_logger::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let logger = Arc::new(
//!     Logger::builder()
//!         .min_level(LogLevel::Debug)
//!         .path("/tmp/task-bridge-server.log")
//!         .build()
//!         .expect("log file must be writable"),
//! );
//!
//! let tasks = logger.context("tasks");
//! tasks.info("tool registered");
//! tasks.debug_with("fetched tasks", json!({"project": "inbox", "count": 3}));
//! ```

use super::log_level::LogLevel;
use super::logger::Logger;
use super::payload::Payload;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct ContextLogger {
    tag: Arc<str>,
    logger: Arc<Logger>,
}

impl ContextLogger {
    pub fn new(tag: impl Into<String>, logger: Arc<Logger>) -> Self {
        Self {
            tag: Arc::from(tag.into()),
            logger,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    /// Context for a component of this subsystem, tagged `parent:child`
    pub fn child(&self, name: &str) -> Self {
        Self {
            tag: Arc::from(format!("{}:{}", self.tag, name)),
            logger: Arc::clone(&self.logger),
        }
    }

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.logger.enabled(level)
    }

    /// Log at `level`; the payload is only converted if the level is enabled
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>, payload: impl Into<Payload>) {
        if !self.enabled(level) {
            return;
        }
        self.logger
            .log(level, Some(&self.tag), message.as_ref(), payload);
    }

    #[inline]
    pub fn trace(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Trace, message, Payload::Absent);
    }

    #[inline]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message, Payload::Absent);
    }

    #[inline]
    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message, Payload::Absent);
    }

    #[inline]
    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message, Payload::Absent);
    }

    #[inline]
    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message, Payload::Absent);
    }

    #[inline]
    pub fn trace_with(&self, message: impl AsRef<str>, payload: impl Into<Payload>) {
        self.log(LogLevel::Trace, message, payload);
    }

    #[inline]
    pub fn debug_with(&self, message: impl AsRef<str>, payload: impl Into<Payload>) {
        self.log(LogLevel::Debug, message, payload);
    }

    #[inline]
    pub fn info_with(&self, message: impl AsRef<str>, payload: impl Into<Payload>) {
        self.log(LogLevel::Info, message, payload);
    }

    #[inline]
    pub fn warn_with(&self, message: impl AsRef<str>, payload: impl Into<Payload>) {
        self.log(LogLevel::Warn, message, payload);
    }

    #[inline]
    pub fn error_with(&self, message: impl AsRef<str>, payload: impl Into<Payload>) {
        self.log(LogLevel::Error, message, payload);
    }
}

impl fmt::Debug for ContextLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextLogger")
            .field("tag", &self.tag)
            .field("threshold", &self.logger.threshold())
            .finish()
    }
}
