//! Logging system for focusflow
//!
//! Provides file-based logging with retention. The terminal is reserved for the
//! timer display, so tracing output never goes to stdout.

mod file_writer;
mod retention;

pub use file_writer::{init_file_logging, LogFileInfo, LoggingGuard};
pub use retention::cleanup_old_logs;
