//! The dispatcher and its scoped views

use crate::level::{passes, LogLevel, LogMode};
use crate::record::{LogRecord, Message, NormalizedError};
use crate::reporter::Reporter;
use crate::timer::Timer;
use crate::Result;
use std::error::Error as StdError;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Mode cell and reporter list shared by a logger and every view derived
/// from it
pub(crate) struct Dispatch {
    mode: AtomicU8,
    reporters: Vec<Arc<dyn Reporter>>,
}

impl Dispatch {
    fn mode(&self) -> LogMode {
        LogMode::from_u8(self.mode.load(Ordering::Relaxed))
    }

    fn set_mode(&self, mode: LogMode) {
        self.mode.store(mode as u8, Ordering::Relaxed);
    }

    fn log<M>(
        &self,
        level: LogLevel,
        msg: M,
        scope: Option<&str>,
        err: Option<&(dyn StdError + 'static)>,
    ) -> Result<()>
    where
        M: Into<Message>,
    {
        if !passes(self.mode(), level) {
            return Ok(());
        }

        let err = err.map(NormalizedError::from_dyn);
        let record = LogRecord::new(level.into(), msg.into(), scope, err);
        self.emit(&record)
    }

    /// Hand a record to every reporter in registration order; the first
    /// failure stops the fan-out and is returned
    pub(crate) fn emit(&self, record: &LogRecord) -> Result<()> {
        for reporter in &self.reporters {
            reporter.report(record)?;
        }
        Ok(())
    }
}

/// Leveled, scoped logger
///
/// Cloning is cheap; clones and scoped views share the same mode, so
/// [`Logger::set_mode`] on any of them affects all.
#[derive(Clone)]
pub struct Logger {
    dispatch: Arc<Dispatch>,
}

impl Logger {
    pub fn new(mode: LogMode, reporters: Vec<Arc<dyn Reporter>>) -> Self {
        Self {
            dispatch: Arc::new(Dispatch {
                mode: AtomicU8::new(mode as u8),
                reporters,
            }),
        }
    }

    pub fn debug(&self, msg: impl Into<Message>, scope: Option<&str>) -> Result<()> {
        self.dispatch.log(LogLevel::Debug, msg, scope, None)
    }

    pub fn info(&self, msg: impl Into<Message>, scope: Option<&str>) -> Result<()> {
        self.dispatch.log(LogLevel::Info, msg, scope, None)
    }

    pub fn warn(&self, msg: impl Into<Message>, scope: Option<&str>) -> Result<()> {
        self.dispatch.log(LogLevel::Warn, msg, scope, None)
    }

    /// Log at error level; `err` is normalized only if the call passes the
    /// mode filter
    pub fn error(
        &self,
        msg: impl Into<Message>,
        err: Option<&(dyn StdError + 'static)>,
        scope: Option<&str>,
    ) -> Result<()> {
        self.dispatch.log(LogLevel::Error, msg, scope, err)
    }

    /// Log at an explicit level
    pub fn log(
        &self,
        level: LogLevel,
        msg: impl Into<Message>,
        scope: Option<&str>,
        err: Option<&(dyn StdError + 'static)>,
    ) -> Result<()> {
        self.dispatch.log(level, msg, scope, err)
    }

    pub fn mode(&self) -> LogMode {
        self.dispatch.mode()
    }

    pub fn set_mode(&self, mode: LogMode) {
        self.dispatch.set_mode(mode);
    }

    /// Whether a call at `level` would currently reach the reporters
    pub fn enabled(&self, level: LogLevel) -> bool {
        passes(self.mode(), level)
    }

    /// Start a stopwatch; stopping it reports the elapsed time with the
    /// label as scope
    pub fn timer(&self, label: impl Into<String>) -> Timer {
        Timer::start(Arc::clone(&self.dispatch), label.into())
    }

    pub fn with_scope(&self, scope: impl Into<String>) -> ScopedLogger {
        ScopedLogger {
            dispatch: Arc::clone(&self.dispatch),
            scope: scope.into(),
        }
    }

    pub fn reporter_count(&self) -> usize {
        self.dispatch.reporters.len()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("mode", &self.mode())
            .field("reporters", &self.reporter_count())
            .finish()
    }
}

/// A logger view with a fixed scope
#[derive(Clone)]
pub struct ScopedLogger {
    dispatch: Arc<Dispatch>,
    scope: String,
}

impl ScopedLogger {
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn debug(&self, msg: impl Into<Message>) -> Result<()> {
        self.dispatch.log(LogLevel::Debug, msg, Some(&self.scope), None)
    }

    pub fn info(&self, msg: impl Into<Message>) -> Result<()> {
        self.dispatch.log(LogLevel::Info, msg, Some(&self.scope), None)
    }

    pub fn warn(&self, msg: impl Into<Message>) -> Result<()> {
        self.dispatch.log(LogLevel::Warn, msg, Some(&self.scope), None)
    }

    pub fn error(
        &self,
        msg: impl Into<Message>,
        err: Option<&(dyn StdError + 'static)>,
    ) -> Result<()> {
        self.dispatch.log(LogLevel::Error, msg, Some(&self.scope), err)
    }

    pub fn mode(&self) -> LogMode {
        self.dispatch.mode()
    }

    pub fn set_mode(&self, mode: LogMode) {
        self.dispatch.set_mode(mode);
    }

    pub fn timer(&self, label: impl Into<String>) -> Timer {
        Timer::start(Arc::clone(&self.dispatch), label.into())
    }
}

impl fmt::Debug for ScopedLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedLogger")
            .field("scope", &self.scope)
            .field("mode", &self.mode())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordLevel;
    use crate::Error;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Collects every record it receives
    #[derive(Default)]
    struct Collector {
        records: Mutex<Vec<LogRecord>>,
    }

    impl Collector {
        fn messages(&self) -> Vec<String> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.message.to_string())
                .collect()
        }
    }

    impl Reporter for Collector {
        fn report(&self, record: &LogRecord) -> Result<()> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn logger_with(mode: LogMode) -> (Logger, Arc<Collector>) {
        let collector = Arc::new(Collector::default());
        let logger = Logger::new(mode, vec![collector.clone() as Arc<dyn Reporter>]);
        (logger, collector)
    }

    #[test]
    fn test_info_mode_scenario() {
        let (logger, collector) = logger_with(LogMode::Info);

        logger.debug("x", None).unwrap();
        logger.info("y", None).unwrap();
        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        logger.error("z", Some(&err), None).unwrap();

        assert_eq!(collector.messages(), vec!["y", "z"]);
        let records = collector.records.lock().unwrap();
        let normalized = records[1].error.as_ref().unwrap();
        assert_eq!(normalized.message, "boom");
        assert_eq!(records[1].level, RecordLevel::Log(LogLevel::Error));
    }

    #[test]
    fn test_disabled_mode_skips_conversion() {
        struct Expensive<'a>(&'a AtomicUsize);

        impl From<Expensive<'_>> for Message {
            fn from(value: Expensive<'_>) -> Self {
                value.0.fetch_add(1, Ordering::SeqCst);
                Message::Text("expensive".to_string())
            }
        }

        #[derive(Debug)]
        struct CountingError(Arc<AtomicUsize>);

        impl fmt::Display for CountingError {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fetch_add(1, Ordering::SeqCst);
                f.write_str("costly")
            }
        }

        impl StdError for CountingError {}

        let (logger, collector) = logger_with(LogMode::Disable);
        let conversions = AtomicUsize::new(0);
        let renders = Arc::new(AtomicUsize::new(0));
        let err = CountingError(Arc::clone(&renders));

        logger.error(Expensive(&conversions), Some(&err), None).unwrap();
        logger.with_scope("db").error("x", Some(&err)).unwrap();
        assert_eq!(conversions.load(Ordering::SeqCst), 0);
        assert_eq!(renders.load(Ordering::SeqCst), 0);
        assert!(collector.messages().is_empty());

        logger.set_mode(LogMode::Error);
        logger.error(Expensive(&conversions), Some(&err), None).unwrap();
        assert_eq!(conversions.load(Ordering::SeqCst), 1);
        assert_eq!(renders.load(Ordering::SeqCst), 1);

        let records = collector.records.lock().unwrap();
        let normalized = records[0].error.as_ref().unwrap();
        assert_eq!(normalized.message, "costly");
    }

    #[test]
    fn test_error_accepts_prebuilt_normalized_error() {
        let (logger, collector) = logger_with(LogMode::Info);
        let err = NormalizedError::from_anyhow(&anyhow::anyhow!("disk full").context("saving"));

        logger.error("save failed", Some(&err), Some("store")).unwrap();

        let records = collector.records.lock().unwrap();
        assert_eq!(records[0].error.as_ref(), Some(&err));
        assert_eq!(records[0].scope(), Some("store"));
    }

    #[test]
    fn test_mode_is_shared_with_scoped_views() {
        let (logger, collector) = logger_with(LogMode::Info);
        let scoped = logger.with_scope("db");

        scoped.debug("hidden").unwrap();
        logger.set_mode(LogMode::Debug);
        scoped.debug("visible").unwrap();

        scoped.set_mode(LogMode::Error);
        assert_eq!(logger.mode(), LogMode::Error);
        logger.warn("hidden too", None).unwrap();

        assert_eq!(collector.messages(), vec!["visible"]);
    }

    #[test]
    fn test_scoped_view_matches_explicit_scope() {
        let (logger, collector) = logger_with(LogMode::Debug);
        let scoped = logger.with_scope("net");

        scoped.warn("retrying").unwrap();
        logger.warn("retrying", Some("net")).unwrap();

        let records = collector.records.lock().unwrap();
        assert_eq!(records[0].scope(), Some("net"));
        assert_eq!(records[0].scope, records[1].scope);
        assert_eq!(records[0].level, records[1].level);
        assert_eq!(records[0].message, records[1].message);
    }

    #[test]
    fn test_reporters_run_in_order_and_errors_propagate() {
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let order = Arc::clone(&order);
            move |_: &LogRecord| -> Result<()> {
                order.lock().unwrap().push("first");
                Ok(())
            }
        };
        let failing = {
            let order = Arc::clone(&order);
            move |_: &LogRecord| -> Result<()> {
                order.lock().unwrap().push("failing");
                Err(Error::Reporter {
                    message: "sink gone".to_string(),
                })
            }
        };
        let last = {
            let order = Arc::clone(&order);
            move |_: &LogRecord| -> Result<()> {
                order.lock().unwrap().push("last");
                Ok(())
            }
        };

        let reporters: Vec<Arc<dyn Reporter>> = vec![
            Arc::new(first) as Arc<dyn Reporter>,
            Arc::new(failing) as Arc<dyn Reporter>,
            Arc::new(last) as Arc<dyn Reporter>,
        ];
        let logger = Logger::new(LogMode::Info, reporters);

        let result = logger.info("hello", None);
        assert!(matches!(result, Err(Error::Reporter { .. })));
        assert_eq!(*order.lock().unwrap(), vec!["first", "failing"]);
    }

    #[test]
    fn test_log_with_explicit_level() {
        let (logger, collector) = logger_with(LogMode::Info);
        logger.log(LogLevel::Warn, 42u64, Some("metrics"), None).unwrap();
        logger.log(LogLevel::Debug, "dropped", None, None).unwrap();

        assert_eq!(collector.messages(), vec!["42"]);
        assert!(logger.enabled(LogLevel::Warn));
        assert!(!logger.enabled(LogLevel::Debug));
    }

    #[test]
    fn test_clone_shares_state() {
        let (logger, _collector) = logger_with(LogMode::Info);
        let clone = logger.clone();
        clone.set_mode(LogMode::Disable);
        assert_eq!(logger.mode(), LogMode::Disable);
        assert_eq!(logger.reporter_count(), 1);
    }

    #[test]
    fn test_logger_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Logger>();
        assert_send_sync::<ScopedLogger>();
        assert_send_sync::<Timer>();
    }
}
