//! Standard output reporter

use super::Reporter;
use crate::format::{default_message_formatter, MessageFormatter, TimeFormat};
use crate::level::LogLevel;
use crate::record::{LogRecord, RecordLevel};
use crate::Result;
use std::io::{self, Write};

/// Writes each record to stdout, or stderr for warnings and errors
pub struct ConsoleReporter {
    time_format: TimeFormat,
    formatter: MessageFormatter,
}

impl ConsoleReporter {
    pub fn new(time_format: TimeFormat) -> Self {
        Self {
            time_format,
            formatter: default_message_formatter(),
        }
    }

    pub fn with_formatter(mut self, formatter: MessageFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    fn uses_stderr(level: RecordLevel) -> bool {
        matches!(
            level,
            RecordLevel::Log(LogLevel::Warn) | RecordLevel::Log(LogLevel::Error)
        )
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, record: &LogRecord) -> Result<()> {
        let line = (self.formatter)(record, &self.time_format);
        if Self::uses_stderr(record.level) {
            writeln!(io::stderr().lock(), "{}", line)?;
        } else {
            writeln!(io::stdout().lock(), "{}", line)?;
        }
        Ok(())
    }
}
