//! Append-only record destinations
//!
//! A sink is written by exactly one logical writer: the [`Logger`] owns it
//! behind a mutex (or hands it to its writer thread in queued mode), so the
//! methods here take `&mut self` and never see concurrent calls.
//!
//! [`Logger`]: super::logger::Logger

use super::error::{LoggerError, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Lifecycle of a sink; there is no way back to `Open`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    Uninitialized,
    Open,
    Closing,
    Closed,
}

pub trait Sink: Send {
    /// Write one record; a trailing newline is added if missing
    fn append(&mut self, record: &str) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    /// Flush and release the destination. Closing a closed sink is a no-op.
    fn close(&mut self) -> Result<()>;
    fn state(&self) -> SinkState;
    fn name(&self) -> &str;
}

/// Sink bound to one file for the life of the process
///
/// The file is truncated on open so every run starts a fresh log.
pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    state: SinkState,
}

impl FileSink {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let mut sink = Self {
            path: path.into(),
            writer: None,
            state: SinkState::Uninitialized,
        };
        sink.open_file()?;
        Ok(sink)
    }

    fn open_file(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| LoggerError::sink_open(&self.path, e))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| LoggerError::sink_open(&self.path, e))?;

        self.writer = Some(BufWriter::new(file));
        self.state = SinkState::Open;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn append(&mut self, record: &str) -> Result<()> {
        if self.state != SinkState::Open {
            return Err(LoggerError::SinkClosed);
        }
        let writer = self.writer.as_mut().ok_or(LoggerError::SinkClosed)?;

        writer.write_all(record.as_bytes())?;
        if !record.ends_with('\n') {
            writer.write_all(b"\n")?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.state == SinkState::Closed {
            return Ok(());
        }

        self.state = SinkState::Closing;
        let result = match self.writer.take() {
            Some(mut writer) => writer
                .flush()
                .and_then(|()| writer.get_ref().sync_all())
                .map_err(LoggerError::from),
            None => Ok(()),
        };
        self.state = SinkState::Closed;
        result
    }

    fn state(&self) -> SinkState {
        self.state
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Ensure all buffered data reaches the file
        let _ = self.close();
    }
}

/// Shared view of what a [`MemorySink`] has received
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    inner: Arc<Mutex<String>>,
}

impl MemoryBuffer {
    pub fn contents(&self) -> String {
        self.inner.lock().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.inner.lock().lines().map(String::from).collect()
    }
}

/// In-memory sink, handy for tests and for hosts that inspect their own output
pub struct MemorySink {
    buffer: MemoryBuffer,
    state: SinkState,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            buffer: MemoryBuffer::default(),
            state: SinkState::Open,
        }
    }

    /// Handle that keeps reading the buffer after the sink moves into a logger
    pub fn buffer(&self) -> MemoryBuffer {
        self.buffer.clone()
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for MemorySink {
    fn append(&mut self, record: &str) -> Result<()> {
        if self.state != SinkState::Open {
            return Err(LoggerError::SinkClosed);
        }
        let mut buffer = self.buffer.inner.lock();
        buffer.push_str(record);
        if !record.ends_with('\n') {
            buffer.push('\n');
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.state = SinkState::Closed;
        Ok(())
    }

    fn state(&self) -> SinkState {
        self.state
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_truncates_previous_run() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("bridge.log");
        std::fs::write(&path, "old run\n").expect("Failed to seed file");

        let mut sink = FileSink::open(&path).expect("Failed to open sink");
        assert_eq!(sink.state(), SinkState::Open);
        sink.append("new run").expect("append");
        sink.close().expect("close");

        let content = std::fs::read_to_string(&path).expect("Failed to read log");
        assert_eq!(content, "new run\n");
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nested/deeper/bridge.log");

        let sink = FileSink::open(&path).expect("Failed to open sink");
        assert_eq!(sink.path(), path.as_path());
        assert!(path.exists());
    }

    #[test]
    fn test_open_failure_is_reported() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        // a directory cannot be opened as the log file
        let result = FileSink::open(temp_dir.path());
        assert!(matches!(result, Err(LoggerError::SinkOpen { .. })));
    }

    #[test]
    fn test_records_are_newline_terminated_once() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("bridge.log");

        let mut sink = FileSink::open(&path).expect("Failed to open sink");
        sink.append("first").expect("append");
        sink.append("second\n").expect("append");
        sink.flush().expect("flush");

        let content = std::fs::read_to_string(&path).expect("Failed to read log");
        assert_eq!(content, "first\nsecond\n");
    }

    #[test]
    fn test_close_is_idempotent() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut sink = FileSink::open(temp_dir.path().join("bridge.log")).expect("open");

        sink.close().expect("first close");
        assert_eq!(sink.state(), SinkState::Closed);
        sink.close().expect("second close is a no-op");
        assert_eq!(sink.state(), SinkState::Closed);
    }

    #[test]
    fn test_append_after_close_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut sink = FileSink::open(temp_dir.path().join("bridge.log")).expect("open");
        sink.close().expect("close");

        assert!(matches!(sink.append("late"), Err(LoggerError::SinkClosed)));
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::new();
        let buffer = sink.buffer();

        sink.append("one").expect("append");
        sink.append("two\nthree").expect("append");
        assert_eq!(buffer.lines(), vec!["one", "two", "three"]);

        sink.close().expect("close");
        assert!(sink.append("four").is_err());
        assert_eq!(buffer.contents(), "one\ntwo\nthree\n");
    }
}
