//! # Scopelog
//!
//! Leveled, scoped logging facade with pluggable reporters.
//!
//! ## Features
//!
//! - **Mode Filtering**: a shared, runtime-adjustable verbosity gate checked
//!   before any formatting happens
//! - **Scoped Views**: `with_scope` binds a tag without copying the mode
//! - **Timers**: start/stop stopwatches that report elapsed milliseconds
//! - **File Reporter**: per-(level, scope) files with size-based rotation and
//!   numbered backups
//! - **Stream Reporter**: FIFO batching to any sink, flushed on count or timeout
//! - **Console Reporter**: plain stdout/stderr passthrough
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scopelog::{FileReporter, FileReporterOptions, LogMode, Logger, Reporter};
//! use std::sync::Arc;
//!
//! fn main() -> scopelog::Result<()> {
//!     let file = FileReporter::new(FileReporterOptions::default())?;
//!     let logger = Logger::new(LogMode::Info, vec![Arc::new(file) as Arc<dyn Reporter>]);
//!
//!     logger.info("Application started", None)?;
//!     logger.with_scope("db").warn("slow query")?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod format;
pub mod level;
pub mod logger;
pub mod record;
pub mod reporter;
pub mod timer;


pub use config::{ConsoleConfig, FileConfig, LoggerConfig};
pub use format::{default_message_formatter, default_time_format, MessageFormatter, TimeFormat};
pub use level::{passes, LogLevel, LogMode};
pub use logger::{Logger, ScopedLogger};
pub use record::{LogRecord, Message, NormalizedError, RecordLevel};
pub use reporter::{
    ConsoleReporter, FileReporter, FileReporterOptions, LogSink, Reporter, StreamReporter,
    StreamReporterOptions, WriterSink,
};
pub use timer::Timer;

/// Result type for logging operations
pub type Result<T> = std::result::Result<T, Error>;

/// Logging errors
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Log rotation error: {message}")]
    Rotation { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Reporter error: {message}")]
    Reporter { message: String },
}
