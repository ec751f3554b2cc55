//! Stopwatch that reports elapsed time as a log record

use crate::logger::Dispatch;
use crate::record::{LogRecord, Message, RecordLevel};
use crate::Result;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A started stopwatch
///
/// Each call to [`Timer::stop`] measures from the original start and reports
/// a new record; nothing prevents stopping twice.
#[derive(Clone)]
pub struct Timer {
    dispatch: Arc<Dispatch>,
    label: String,
    start: Instant,
}

impl Timer {
    pub(crate) fn start(dispatch: Arc<Dispatch>, label: String) -> Self {
        Self {
            dispatch,
            label,
            start: Instant::now(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Time since start, without reporting
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Report the elapsed time at the timer level, scoped to the label
    ///
    /// Timer records are not subject to the logger's mode.
    pub fn stop(&self) -> Result<Duration> {
        let elapsed = self.elapsed();
        let record = LogRecord::new(
            RecordLevel::Timer,
            Message::Text(format_elapsed(elapsed)),
            Some(&self.label),
            None,
        );
        self.dispatch.emit(&record)?;
        Ok(elapsed)
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("label", &self.label)
            .field("elapsed", &self.elapsed())
            .finish()
    }
}

/// Milliseconds with two decimals, `12.34ms`
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2}ms", elapsed.as_secs_f64() * 1000.0)
}
