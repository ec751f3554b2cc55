//! Batched stream reporter

use super::Reporter;
use crate::format::{default_message_formatter, default_time_format, MessageFormatter, TimeFormat};
use crate::record::LogRecord;
use crate::{Error, Result};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Destination for batched log lines
pub trait LogSink: Send {
    /// Whether the sink can accept a write right now
    fn is_writable(&self) -> bool {
        true
    }

    /// Write one batch of newline-terminated lines
    fn write_batch(&mut self, batch: &str) -> io::Result<()>;
}

/// Adapts any [`io::Write`] into a [`LogSink`]
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn write_batch(&mut self, batch: &str) -> io::Result<()> {
        self.writer.write_all(batch.as_bytes())?;
        self.writer.flush()
    }
}

/// Stream reporter configuration
pub struct StreamReporterOptions {
    pub sink: Box<dyn LogSink>,

    /// Flush as soon as this many lines are queued
    pub flush_count: usize,

    /// Flush queued lines this long after the first one arrives
    pub flush_timeout: Duration,

    pub formatter: MessageFormatter,

    pub time_format: TimeFormat,

    /// Runtime for scheduled flushes; defaults to the current one
    pub runtime: Option<Handle>,
}

impl StreamReporterOptions {
    pub fn new(sink: impl LogSink + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            flush_count: 100,
            flush_timeout: Duration::from_millis(1000),
            formatter: default_message_formatter(),
            time_format: default_time_format(),
            runtime: None,
        }
    }

    pub fn with_flush_count(mut self, flush_count: usize) -> Self {
        self.flush_count = flush_count;
        self
    }

    pub fn with_flush_timeout(mut self, flush_timeout: Duration) -> Self {
        self.flush_timeout = flush_timeout;
        self
    }

    pub fn with_formatter(mut self, formatter: MessageFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_time_format(mut self, time_format: TimeFormat) -> Self {
        self.time_format = time_format;
        self
    }

    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }
}

struct PendingFlush {
    id: u64,
    task: JoinHandle<()>,
}

struct StreamState {
    queue: Vec<String>,
    pending: Option<PendingFlush>,
    next_flush_id: u64,
    sink: Box<dyn LogSink>,
}

impl StreamState {
    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
        }
    }

    /// Forget a scheduled flush whose task ended without running, as happens
    /// when its runtime shuts down
    fn reap_pending(&mut self) {
        if self
            .pending
            .as_ref()
            .map_or(false, |pending| pending.task.is_finished())
        {
            self.pending = None;
        }
    }

    /// Write the whole queue as one batch if the sink accepts it
    fn drain(&mut self) -> io::Result<()> {
        if self.queue.is_empty() {
            return Ok(());
        }

        if !self.sink.is_writable() {
            debug!(
                scopelog.event = "stream_flush_deferred",
                queued = self.queue.len(),
                "Sink not writable, keeping queued lines"
            );
            return Ok(());
        }

        let batch = self.queue.concat();
        self.sink.write_batch(&batch)?;
        self.queue.clear();
        Ok(())
    }
}

struct StreamInner {
    state: Mutex<StreamState>,
    flush_count: usize,
    flush_timeout: Duration,
    formatter: MessageFormatter,
    time_format: TimeFormat,
    runtime: Handle,
}

impl StreamInner {
    fn lock_state(&self) -> MutexGuard<'_, StreamState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Called by the scheduled task; a stale id means a newer flush already ran
    fn flush_scheduled(&self, id: u64) {
        let mut state = self.lock_state();
        if state.pending.as_ref().map(|pending| pending.id) != Some(id) {
            return;
        }
        state.pending = None;

        if let Err(e) = state.drain() {
            warn!(
                scopelog.event = "stream_flush_failed",
                error = %e,
                queued = state.queue.len(),
                "Scheduled flush failed"
            );
        }
    }
}

impl Drop for StreamInner {
    fn drop(&mut self) {
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        state.cancel_pending();
        if let Err(e) = state.drain() {
            warn!(
                scopelog.event = "stream_flush_failed",
                error = %e,
                queued = state.queue.len(),
                "Final flush failed"
            );
        }
    }
}

/// Queues formatted lines and writes them to a sink in batches
///
/// A flush happens when `flush_count` lines are queued, or `flush_timeout`
/// after the first line that found no flush scheduled. At most one scheduled
/// flush is pending at any time, and every flush drains the whole queue in a
/// single write, so lines reach the sink in the order they were reported.
/// When the sink is not writable the lines stay queued until the next
/// trigger.
pub struct StreamReporter {
    inner: Arc<StreamInner>,
}

impl StreamReporter {
    /// Create the reporter; scheduled flushes run on the given or current
    /// tokio runtime
    pub fn new(options: StreamReporterOptions) -> Result<Self> {
        let runtime = match options.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|e| Error::Config {
                message: format!("Stream reporter needs a tokio runtime: {}", e),
            })?,
        };

        let inner = StreamInner {
            state: Mutex::new(StreamState {
                queue: Vec::new(),
                pending: None,
                next_flush_id: 0,
                sink: options.sink,
            }),
            flush_count: options.flush_count,
            flush_timeout: options.flush_timeout,
            formatter: options.formatter,
            time_format: options.time_format,
            runtime,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Cancel any scheduled flush and write everything queued
    pub fn flush(&self) -> Result<()> {
        let mut state = self.inner.lock_state();
        state.cancel_pending();
        state.drain()?;
        Ok(())
    }

    /// Number of lines waiting to be written
    pub fn pending_len(&self) -> usize {
        self.inner.lock_state().queue.len()
    }

    pub fn has_scheduled_flush(&self) -> bool {
        let mut state = self.inner.lock_state();
        state.reap_pending();
        state.pending.is_some()
    }

    fn schedule(&self, state: &mut StreamState) {
        let id = state.next_flush_id;
        state.next_flush_id += 1;

        let weak: Weak<StreamInner> = Arc::downgrade(&self.inner);
        let timeout = self.inner.flush_timeout;
        let task = self.inner.runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(inner) = weak.upgrade() {
                inner.flush_scheduled(id);
            }
        });

        state.pending = Some(PendingFlush { id, task });
    }
}

impl Reporter for StreamReporter {
    fn report(&self, record: &LogRecord) -> Result<()> {
        let mut line = (self.inner.formatter)(record, &self.inner.time_format);
        line.push('\n');

        let mut state = self.inner.lock_state();
        state.queue.push(line);

        state.reap_pending();

        if state.queue.len() >= self.inner.flush_count {
            state.cancel_pending();
            state.drain()?;
        } else if state.pending.is_none() {
            self.schedule(&mut state);
        }

        Ok(())
    }
}
