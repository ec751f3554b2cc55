//! Reporter sinks that receive accepted log records

pub mod console;
pub mod file;
pub mod stream;

pub use console::ConsoleReporter;
pub use file::{FileNameFn, FileReporter, FileReporterOptions};
pub use stream::{LogSink, StreamReporter, StreamReporterOptions, WriterSink};

use crate::record::LogRecord;
use crate::Result;

/// A sink for accepted records
///
/// Reporters are invoked synchronously, in registration order, on the
/// caller's thread. Any state they keep is their own.
pub trait Reporter: Send + Sync {
    fn report(&self, record: &LogRecord) -> Result<()>;
}

impl<F> Reporter for F
where
    F: Fn(&LogRecord) -> Result<()> + Send + Sync,
{
    fn report(&self, record: &LogRecord) -> Result<()> {
        self(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LogLevel;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_closure_is_reporter() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reporter = move |record: &LogRecord| -> Result<()> {
            sink.lock().unwrap().push(record.message.to_string());
            Ok(())
        };

        let record = LogRecord::new(LogLevel::Info.into(), "ping".into(), None, None);
        reporter.report(&record).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["ping".to_string()]);
    }
}
