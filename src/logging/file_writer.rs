//! File-based logging with tracing integration
//!
//! Sets up file logging with timestamped filenames.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Local;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Prefix shared by every log file this crate writes
pub(crate) const LOG_FILE_PREFIX: &str = "focusflow-";

/// Information about the current log file
#[derive(Debug, Clone)]
pub struct LogFileInfo {
    /// Full path to the log file
    pub path: PathBuf,
}

/// Generate a timestamped log file path
pub fn create_log_file_path(logs_dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    logs_dir.join(format!("{}{}.log", LOG_FILE_PREFIX, timestamp))
}

/// Writer handed to the fmt layer for each event
struct SharedFileWriter {
    file: Arc<Mutex<File>>,
}

impl Write for SharedFileWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(mut file) = self.file.lock() {
            file.write_all(buf)?;
            file.flush()?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if let Ok(mut file) = self.file.lock() {
            file.flush()
        } else {
            Ok(())
        }
    }
}

/// Writer factory for tracing-subscriber
struct SharedFileWriterMaker {
    file: Arc<Mutex<File>>,
}

impl<'a> MakeWriter<'a> for SharedFileWriterMaker {
    type Writer = SharedFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SharedFileWriter {
            file: Arc::clone(&self.file),
        }
    }
}

/// Guard that keeps the logging system alive
pub struct LoggingGuard {
    _file: Arc<Mutex<File>>,
}

/// Initialize file logging
///
/// Returns the log file info and a guard that must be kept alive for the duration of logging.
pub fn init_file_logging(logs_dir: PathBuf) -> Result<(LogFileInfo, LoggingGuard)> {
    fs::create_dir_all(&logs_dir).context("Failed to create logs directory")?;

    let log_path = create_log_file_path(&logs_dir);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context("Failed to open log file")?;

    let file = Arc::new(Mutex::new(file));

    let writer = SharedFileWriterMaker {
        file: Arc::clone(&file),
    };

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "focusflow=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    let info = LogFileInfo { path: log_path };
    let guard = LoggingGuard { _file: file };

    Ok((info, guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_log_file_path() {
        let logs_dir = PathBuf::from("/tmp/focusflow/logs");
        let path = create_log_file_path(&logs_dir);
        assert!(path.starts_with(&logs_dir));
        assert!(path.to_string_lossy().contains("focusflow-"));
        assert!(path.to_string_lossy().ends_with(".log"));
    }

    #[test]
    fn test_shared_writer_appends_to_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("out.log");
        let file = File::create(&path).unwrap();
        let maker = SharedFileWriterMaker {
            file: Arc::new(Mutex::new(file)),
        };

        maker.make_writer().write_all(b"first\n").unwrap();
        maker.make_writer().write_all(b"second\n").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }
}
