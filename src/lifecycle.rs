//! Process termination handling
//!
//! [`Lifecycle`] is registered once at startup. When the process is asked to
//! terminate it runs the registered pre-close hooks in order, logs a shutdown
//! notice, closes the logger (waiting a bounded time for queued records) and
//! only then exits. The sequence runs at most once no matter how many signals
//! arrive or how many callers invoke [`Lifecycle::shutdown`].

use crate::core::{ContextLogger, Logger, DEFAULT_SHUTDOWN_TIMEOUT};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[cfg(unix)]
use crate::core::{LoggerError, Result};
#[cfg(unix)]
use signal_hook::iterator::{Handle, Signals};
#[cfg(unix)]
use std::thread;

type ShutdownHook = Box<dyn FnOnce() + Send>;

/// Called with the exit status once shutdown completes
pub type ExitCallback = Arc<dyn Fn(i32) + Send + Sync>;

fn exit_process(code: i32) {
    std::process::exit(code)
}

pub struct Lifecycle {
    logger: Arc<Logger>,
    log: ContextLogger,
    timeout: Duration,
    hooks: Mutex<Vec<(String, ShutdownHook)>>,
    triggered: AtomicBool,
    signals: Vec<i32>,
    on_exit: ExitCallback,
}

impl Lifecycle {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            log: logger.context("lifecycle"),
            logger,
            timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            hooks: Mutex::new(Vec::new()),
            triggered: AtomicBool::new(false),
            signals: vec![signal_hook::consts::SIGTERM, signal_hook::consts::SIGINT],
            on_exit: Arc::new(exit_process),
        }
    }

    /// Upper bound on waiting for queued records during close
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Signals that trigger shutdown (default: SIGTERM and SIGINT)
    #[must_use]
    pub fn signals(mut self, signals: &[i32]) -> Self {
        self.signals = signals.to_vec();
        self
    }

    /// Replace the default `std::process::exit`
    #[must_use]
    pub fn on_exit<F>(mut self, callback: F) -> Self
    where
        F: Fn(i32) + Send + Sync + 'static,
    {
        self.on_exit = Arc::new(callback);
        self
    }

    /// Register work to run before the logger closes
    ///
    /// Hooks run in registration order and may still log.
    #[must_use]
    pub fn before_close<F>(self, name: impl Into<String>, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.hooks.lock().push((name.into(), Box::new(hook)));
        self
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::Acquire)
    }

    /// Run the shutdown sequence; only the first call does anything
    ///
    /// Returns `true` if this call ran the sequence and every record logged
    /// before it reached the file.
    pub fn shutdown(&self, reason: &str) -> bool {
        if self.triggered.swap(true, Ordering::AcqRel) {
            return false;
        }

        let hooks = std::mem::take(&mut *self.hooks.lock());
        for (name, hook) in hooks {
            self.log.debug(format!("Running shutdown hook '{}'", name));
            // one failing hook must not keep the log from closing
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(hook)).is_err() {
                self.log.error(format!("Shutdown hook '{}' panicked", name));
            }
        }

        self.log.info(format!("Received {}, shutting down", reason));
        self.logger.shutdown(self.timeout)
    }

    /// Listen for the configured signals on a dedicated thread
    ///
    /// The first signal runs [`shutdown`](Self::shutdown) and then the exit
    /// callback with status 0.
    #[cfg(unix)]
    pub fn install(self: Arc<Self>) -> Result<ShutdownHandle> {
        let mut signals = Signals::new(&self.signals).map_err(LoggerError::SignalRegistration)?;
        let handle = signals.handle();

        let lifecycle = Arc::clone(&self);
        let thread = thread::Builder::new()
            .name("bridge-logger-signals".into())
            .spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    let reason = signal_hook::low_level::signal_name(signal)
                        .map(String::from)
                        .unwrap_or_else(|| format!("signal {}", signal));
                    lifecycle.shutdown(&reason);
                    (lifecycle.on_exit)(0);
                }
            })?;

        Ok(ShutdownHandle {
            handle,
            thread: Some(thread),
        })
    }
}

/// Keeps the signal listener alive; [`close`](Self::close) unregisters it
#[cfg(unix)]
pub struct ShutdownHandle {
    handle: Handle,
    thread: Option<thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl ShutdownHandle {
    /// Stop listening without running the shutdown sequence
    pub fn close(mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, MemoryBuffer, MemorySink, SinkState};

    fn logger_at(level: LogLevel) -> (Arc<Logger>, MemoryBuffer) {
        let sink = MemorySink::new();
        let buffer = sink.buffer();
        let logger = Logger::builder()
            .min_level(level)
            .sink(sink)
            .build()
            .expect("build logger");
        (Arc::new(logger), buffer)
    }

    #[test]
    fn test_shutdown_notice_is_last_line() {
        let (logger, buffer) = logger_at(LogLevel::Info);
        logger.context("server").info("listening on stdio");

        let lifecycle = Lifecycle::new(Arc::clone(&logger));
        assert!(lifecycle.shutdown("SIGTERM"));

        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with("INFO: [lifecycle] Received SIGTERM, shutting down"));
        assert_eq!(logger.sink_state(), SinkState::Closed);
    }

    #[test]
    fn test_shutdown_runs_once() {
        let (logger, buffer) = logger_at(LogLevel::Info);
        let lifecycle = Lifecycle::new(Arc::clone(&logger));

        assert!(lifecycle.shutdown("SIGTERM"));
        assert!(!lifecycle.shutdown("SIGINT"));
        assert!(lifecycle.is_triggered());
        assert_eq!(buffer.lines().len(), 1);
    }

    #[test]
    fn test_hooks_run_in_order_before_close() {
        let (logger, buffer) = logger_at(LogLevel::Debug);
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&order);
        let second = Arc::clone(&order);
        let hook_log = logger.context("transport");
        let lifecycle = Lifecycle::new(Arc::clone(&logger))
            .before_close("transport", move || {
                hook_log.info("transport stopped");
                first.lock().push("transport");
            })
            .before_close("api", move || second.lock().push("api"));

        assert!(lifecycle.shutdown("SIGTERM"));
        assert_eq!(*order.lock(), vec!["transport", "api"]);

        let lines = buffer.lines();
        assert!(lines.iter().any(|l| l.contains("[transport] transport stopped")));
        assert!(lines
            .last()
            .is_some_and(|l| l.ends_with("Received SIGTERM, shutting down")));
    }

    #[test]
    fn test_panicking_hook_does_not_block_close() {
        let (logger, buffer) = logger_at(LogLevel::Info);
        let lifecycle =
            Lifecycle::new(Arc::clone(&logger)).before_close("broken", || panic!("hook failed"));

        assert!(lifecycle.shutdown("SIGINT"));
        assert!(buffer.contents().contains("Shutdown hook 'broken' panicked"));
        assert!(logger.is_closed());
    }
}
