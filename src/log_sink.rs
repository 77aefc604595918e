//! Append-only diagnostic log.
//!
//! Each message becomes one `ISO8601-timestamp | message` line in a per-run
//! file and is mirrored to the tracing console. Write failures are dropped.

use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::{info, trace};

use crate::timestamp::Timestamp;

pub const LOG_FILE_PREFIX: &str = "ConsoleFaces";

#[cfg_attr(test, mockall::automock)]
pub trait LineWriter: Send + Sync {
    fn write_line(&self, line: &str) -> io::Result<()>;
}

/// Opens the file in append mode for every line.
pub struct FileLineWriter {
    path: PathBuf,
}

impl FileLineWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LineWriter for FileLineWriter {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)
    }
}

struct NullLineWriter;

impl LineWriter for NullLineWriter {
    fn write_line(&self, _line: &str) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct LogSink {
    writer: Arc<dyn LineWriter>,
    path: Option<PathBuf>,
}

impl LogSink {
    /// A sink writing to `<dir>/ConsoleFaces_<yyyyMMdd_HHmmss>.log`.
    pub fn per_run(dir: &Path, started: &Timestamp) -> Self {
        if let Err(e) = std::fs::create_dir_all(dir) {
            trace!("Could not create log dir {}: {}", dir.display(), e);
        }
        let path = dir.join(format!("{}_{}.log", LOG_FILE_PREFIX, started.file_stamp()));
        Self {
            writer: Arc::new(FileLineWriter::new(path.clone())),
            path: Some(path),
        }
    }

    pub fn with_writer(writer: Arc<dyn LineWriter>) -> Self {
        Self { writer, path: None }
    }

    /// Console-only sink.
    pub fn console_only() -> Self {
        Self::with_writer(Arc::new(NullLineWriter))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn write(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        let line = format_line(&Timestamp::now(), message);
        if let Err(e) = self.writer.write_line(&line) {
            trace!("Dropped log line: {}", e);
        }
        info!("[{}] {}", LOG_FILE_PREFIX, message);
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink").field("path", &self.path).finish()
    }
}

pub fn format_line(timestamp: &Timestamp, message: &str) -> String {
    format!("{} | {}", timestamp, message)
}
