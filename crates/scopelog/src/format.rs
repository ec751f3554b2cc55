//! Text formatting for log records

use crate::record::LogRecord;
use chrono::{DateTime, Local, SecondsFormat, Utc};
use std::sync::Arc;

/// Renders a record timestamp
pub type TimeFormat = Arc<dyn Fn(&DateTime<Utc>) -> String + Send + Sync>;

/// Renders a whole record (without trailing newline)
pub type MessageFormatter = Arc<dyn Fn(&LogRecord, &TimeFormat) -> String + Send + Sync>;

/// Wrap a closure as a [`TimeFormat`]
pub fn time_format<F>(f: F) -> TimeFormat
where
    F: Fn(&DateTime<Utc>) -> String + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure as a [`MessageFormatter`]
pub fn message_formatter<F>(f: F) -> MessageFormatter
where
    F: Fn(&LogRecord, &TimeFormat) -> String + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Local wall-clock time, `2024-01-01 12:00:00`
pub fn default_time_format() -> TimeFormat {
    time_format(|date| {
        date.with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    })
}

/// UTC RFC 3339 with milliseconds, `2024-01-01T12:00:00.000Z`
pub fn iso_time_format() -> TimeFormat {
    time_format(|date| date.to_rfc3339_opts(SecondsFormat::Millis, true))
}

pub fn default_message_formatter() -> MessageFormatter {
    Arc::new(format_record)
}

/// `<time> | <LEVEL> | <scope or default> | <message>`, followed by the
/// error message and stack on their own lines when an error is attached
pub fn format_record(record: &LogRecord, time_format: &TimeFormat) -> String {
    let mut line = format!(
        "{} | {:<5} | {} | {}",
        time_format(&record.timestamp),
        record.level.label(),
        record.scope().unwrap_or("default"),
        record.message.display(),
    );

    if let Some(ref err) = record.error {
        line.push('\n');
        line.push_str(&err.message);
        line.push('\n');
        line.push_str(&err.stack);
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LogLevel;
    use crate::record::{NormalizedError, RecordLevel};
    use chrono::TimeZone;

    fn mock_time() -> TimeFormat {
        time_format(|_| "mock-date".to_string())
    }

    #[test]
    fn test_format_simple_record() {
        let record = LogRecord::new(
            LogLevel::Info.into(),
            "hello world".into(),
            Some("test"),
            None,
        );
        assert_eq!(
            format_record(&record, &mock_time()),
            "mock-date | INFO  | test | hello world"
        );
    }

    #[test]
    fn test_format_default_scope() {
        let record = LogRecord::new(LogLevel::Debug.into(), "x".into(), None, None);
        assert_eq!(
            format_record(&record, &mock_time()),
            "mock-date | DEBUG | default | x"
        );
    }

    #[test]
    fn test_format_with_error() {
        let err = NormalizedError::new("Error", "test error", "mock stack trace");
        let record = LogRecord::new(
            LogLevel::Error.into(),
            "an error occurred".into(),
            Some("app"),
            Some(err),
        );
        assert_eq!(
            format_record(&record, &mock_time()),
            "mock-date | ERROR | app | an error occurred\ntest error\nmock stack trace"
        );
    }

    #[test]
    fn test_format_timer_record() {
        let record = LogRecord::new(RecordLevel::Timer, "12.50ms".into(), Some("load"), None);
        assert_eq!(
            format_record(&record, &mock_time()),
            "mock-date | TIMER | load | 12.50ms"
        );
    }

    #[test]
    fn test_iso_time_format() {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(iso_time_format()(&date), "2024-01-01T12:00:00.000Z");
    }

    #[test]
    fn test_default_time_format_shape() {
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let rendered = default_time_format()(&date);
        assert_eq!(rendered.len(), "2024-01-01 12:00:00".len());
    }
}
