//! Main logger implementation
//!
//! A [`Logger`] is created once at startup and shared as `Arc<Logger>`. It
//! owns the level threshold (fixed at construction), the timestamp format and
//! the single sink. Records reach the sink in one of two ways:
//! - direct: the caller renders and appends under the sink mutex
//! - queued: the caller renders and hands the text to one writer thread

use super::{
    context::ContextLogger,
    error::{LoggerError, Result},
    format,
    log_entry::LogEntry,
    log_level::LogLevel,
    metrics::LoggerMetrics,
    payload::Payload,
    sink::{FileSink, Sink, SinkState},
    timestamp::TimestampFormat,
};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default bound on how long shutdown waits for queued records to drain
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Most records the writer thread appends before flushing
const BATCH_SIZE: usize = 50;

type SharedSink = Arc<Mutex<Box<dyn Sink>>>;

pub struct Logger {
    threshold: LogLevel,
    timestamp_format: TimestampFormat,
    sink: SharedSink,
    sender: RwLock<Option<Sender<String>>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    /// Only the writer thread may touch the sink while this is set
    queued: bool,
    metrics: Arc<LoggerMetrics>,
    closed: AtomicBool,
}

impl Logger {
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    fn new(
        threshold: LogLevel,
        timestamp_format: TimestampFormat,
        sink: Box<dyn Sink>,
        queued: bool,
    ) -> Self {
        Self {
            threshold,
            timestamp_format,
            sink: Arc::new(Mutex::new(sink)),
            sender: RwLock::new(None),
            worker: Mutex::new(None),
            queued,
            metrics: Arc::new(LoggerMetrics::new()),
            closed: AtomicBool::new(false),
        }
    }

    fn start_writer(&self, capacity: usize) -> Result<()> {
        let (sender, receiver) = bounded(capacity);
        let sink = Arc::clone(&self.sink);
        let metrics = Arc::clone(&self.metrics);

        let handle = thread::Builder::new()
            .name("bridge-logger-writer".into())
            .spawn(move || Self::run_writer(&receiver, &sink, &metrics))?;

        *self.sender.write() = Some(sender);
        *self.worker.lock() = Some(handle);
        Ok(())
    }

    /// Writer thread loop: drain up to a batch, append it, flush, repeat
    ///
    /// Exits once every sender is gone and the queue is empty.
    fn run_writer(receiver: &Receiver<String>, sink: &SharedSink, metrics: &LoggerMetrics) {
        let mut batch = Vec::with_capacity(BATCH_SIZE);

        while let Ok(record) = receiver.recv() {
            batch.push(record);
            while batch.len() < BATCH_SIZE {
                match receiver.try_recv() {
                    Ok(record) => batch.push(record),
                    Err(_) => break,
                }
            }

            let mut sink = sink.lock();
            for record in batch.drain(..) {
                match sink.append(&record) {
                    Ok(()) => {
                        metrics.record_logged();
                    }
                    Err(e) => Self::record_failure(metrics, &e),
                }
            }
            if let Err(e) = sink.flush() {
                eprintln!("[LOGGER ERROR] Flush failed: {}", e);
            }
        }
    }

    /// Count a lost record; report the first loss and every thousandth after
    fn record_failure(metrics: &LoggerMetrics, error: &LoggerError) {
        let previous = metrics.record_dropped();
        if previous == 0 || (previous + 1) % 1000 == 0 {
            eprintln!(
                "[LOGGER ERROR] Failed to write log record ({} dropped so far): {}",
                previous + 1,
                error
            );
        }
    }

    /// Minimum level that is rendered and written
    #[inline]
    pub fn threshold(&self) -> LogLevel {
        self.threshold
    }

    /// Whether a record at `level` would be written
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level.passes(self.threshold)
    }

    pub fn timestamp_format(&self) -> TimestampFormat {
        self.timestamp_format
    }

    /// Create a context logger tagged with a subsystem name
    pub fn context(self: &Arc<Self>, tag: impl Into<String>) -> ContextLogger {
        ContextLogger::new(tag, Arc::clone(self))
    }

    /// Log one record; nothing is built or rendered below the threshold
    pub fn log(
        &self,
        level: LogLevel,
        context: Option<&str>,
        message: &str,
        payload: impl Into<Payload>,
    ) {
        if !self.enabled(level) {
            return;
        }

        let mut entry = LogEntry::new(level, message).with_payload(payload);
        if let Some(context) = context {
            entry = entry.with_context(context);
        }
        self.log_entry(&entry);
    }

    /// Render and write a prepared entry, subject to the threshold
    pub fn log_entry(&self, entry: &LogEntry) {
        if !self.enabled(entry.level) {
            return;
        }
        if self.closed.load(Ordering::Acquire) {
            self.metrics.record_dropped();
            return;
        }

        let record = format::render(entry, &self.timestamp_format);
        self.dispatch(record);
    }

    fn dispatch(&self, record: String) {
        if let Some(sender) = self.sender.read().as_ref() {
            match sender.try_send(record) {
                Ok(()) => {}
                Err(TrySendError::Full(record)) => {
                    self.metrics.record_block();
                    if sender.send(record).is_err() {
                        Self::record_failure(&self.metrics, &LoggerError::ChannelSendError);
                    }
                }
                Err(TrySendError::Disconnected(_)) => {
                    Self::record_failure(&self.metrics, &LoggerError::ChannelSendError);
                }
            }
            return;
        }

        // Sender already taken by close; the writer thread owns the sink
        if self.queued {
            Self::record_failure(&self.metrics, &LoggerError::ChannelSendError);
            return;
        }

        let mut sink = self.sink.lock();
        match sink.append(&record) {
            Ok(()) => {
                self.metrics.record_logged();
            }
            Err(e) => Self::record_failure(&self.metrics, &e),
        }
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Flush the sink's buffer. Records still queued are not waited for.
    pub fn flush(&self) -> Result<()> {
        self.sink.lock().flush()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn sink_state(&self) -> SinkState {
        self.sink.lock().state()
    }

    /// Drain, flush and close the sink, waiting at most `timeout` for the writer
    ///
    /// Only the first call does any work; later calls return `Ok(())`.
    pub fn close_with_timeout(&self, timeout: Duration) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        // Dropping the only sender lets the writer finish the queue and exit
        drop(self.sender.write().take());

        let mut drained = true;
        if let Some(handle) = self.worker.lock().take() {
            let start = Instant::now();
            loop {
                if handle.is_finished() {
                    if handle.join().is_err() {
                        eprintln!("[LOGGER ERROR] Writer thread panicked during shutdown");
                        drained = false;
                    }
                    break;
                }
                if start.elapsed() >= timeout {
                    drained = false;
                    break;
                }
                thread::sleep(Duration::from_millis(5));
            }
        }

        self.sink.lock().close()?;

        if drained {
            Ok(())
        } else {
            Err(LoggerError::other(format!(
                "writer thread did not finish within {:?}; queued records may be lost",
                timeout
            )))
        }
    }

    /// Close with [`DEFAULT_SHUTDOWN_TIMEOUT`]
    pub fn close(&self) -> Result<()> {
        self.close_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT)
    }

    /// Close and report problems on stderr instead of returning them
    ///
    /// Returns `true` if everything logged before the call reached the file.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        match self.close_with_timeout(timeout) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("[LOGGER ERROR] Shutdown incomplete: {}", e);
                false
            }
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);

        let dropped = self.metrics.dropped_count();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shut down with {} dropped records (drop rate: {:.2}%)",
                dropped,
                self.metrics.drop_rate()
            );
        }
    }
}

/// Builder for constructing a [`Logger`]
///
/// # Example
/// ```no_run
/// use bridge_logger::prelude::*;
///
/// let logger = Logger::builder()
///     .min_level(LogLevel::Debug)
///     .path("/tmp/task-bridge-server.log")
///     .queued(1024)
///     .build()
///     .expect("log file must be writable");
/// ```
pub struct LoggerBuilder {
    min_level: LogLevel,
    path: Option<PathBuf>,
    sink: Option<Box<dyn Sink>>,
    queue_capacity: Option<usize>,
    timestamp_format: TimestampFormat,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Info,
            path: None,
            sink: None,
            queue_capacity: None,
            timestamp_format: TimestampFormat::default(),
        }
    }

    /// Set the threshold; it cannot change once the logger is built
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Write to a file, truncated when the logger is built
    #[must_use = "builder methods return a new value"]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Write to a custom sink; takes precedence over [`path`](Self::path)
    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Route records through a writer thread with a bounded queue
    ///
    /// If not called, callers append directly under the sink lock.
    #[must_use = "builder methods return a new value"]
    pub fn queued(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Build the logger, opening the sink
    ///
    /// Failing to open the log file is a startup error.
    pub fn build(self) -> Result<Logger> {
        if self.queue_capacity == Some(0) {
            return Err(LoggerError::config(
                "LoggerBuilder",
                "queue capacity must be at least 1",
            ));
        }

        let sink: Box<dyn Sink> = match (self.sink, self.path) {
            (Some(sink), _) => sink,
            (None, Some(path)) => Box::new(FileSink::open(path)?),
            (None, None) => {
                return Err(LoggerError::config(
                    "LoggerBuilder",
                    "no log file path or sink configured",
                ))
            }
        };

        let logger = Logger::new(
            self.min_level,
            self.timestamp_format,
            sink,
            self.queue_capacity.is_some(),
        );
        if let Some(capacity) = self.queue_capacity {
            logger.start_writer(capacity)?;
        }
        Ok(logger)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
