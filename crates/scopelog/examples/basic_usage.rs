//! Basic scopelog usage example
//!
//! Wires console, rotating file and batched stream reporters into one logger
//! and exercises scopes, mode changes, timers and error normalization.
//!
//! Run with: cargo run -p scopelog --example basic_usage [-- clean]

use scopelog::{
    format::iso_time_format, ConsoleReporter, FileReporter, FileReporterOptions, LogMode, Logger,
    Message, NormalizedError, Reporter, StreamReporter, StreamReporterOptions, WriterSink,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Print scopelog's own diagnostics (rotation, deferred flushes) to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scopelog=debug")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let clean = std::env::args().any(|arg| arg == "clean");
    let log_dir = PathBuf::from("./example_logs");

    let console = ConsoleReporter::new(iso_time_format());
    let file = FileReporter::new(
        FileReporterOptions::default()
            .with_log_dir(&log_dir)
            .with_max_size_mb(0.001)
            .with_max_backups(3)
            .with_file_name(|level, scope| match scope {
                Some(scope) => format!("{}-{}", scope, level),
                None => "app".to_string(),
            }),
    )?;
    let stream = StreamReporter::new(
        StreamReporterOptions::new(WriterSink::new(std::io::stderr()))
            .with_flush_count(5)
            .with_flush_timeout(Duration::from_millis(200)),
    )?;

    let logger = Logger::new(
        LogMode::Info,
        vec![
            Arc::new(console) as Arc<dyn Reporter>,
            Arc::new(file) as Arc<dyn Reporter>,
            Arc::new(stream) as Arc<dyn Reporter>,
        ],
    );

    let stop = logger.timer("log timer");

    logger.info("info", None)?;
    logger.warn("warn", None)?;
    logger.error("error", None, None)?;
    logger.debug("hidden in info mode", None)?;

    logger.set_mode(LogMode::Debug);
    logger.with_scope("with").debug("test with_scope")?;
    logger.info("test inline scope", Some("inline"))?;
    logger.info(json!({"a": {"b": {"c": 1}}}), Some("data"))?;

    let scoped = logger.with_scope("foo");
    scoped.warn("test change scope")?;

    let io_failure = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
    scoped.error("test error in file", Some(&io_failure))?;

    let failure = anyhow::anyhow!("disk unplugged").context("saving report");
    let normalized = NormalizedError::from_anyhow(&failure);
    scoped.error("test anyhow error", Some(&normalized))?;

    for i in 0..40 {
        logger.debug(format!("filler line {} to trigger rotation", i), Some("bulk"))?;
    }

    logger.set_mode(LogMode::Disable);
    logger.error(Message::from("never written"), None, None)?;

    let elapsed = stop.stop()?;
    println!("timer reported {:?}", elapsed);

    // Let the stream reporter's scheduled flush fire
    tokio::time::sleep(Duration::from_millis(300)).await;

    if clean {
        std::fs::remove_dir_all(&log_dir)?;
    }

    Ok(())
}
