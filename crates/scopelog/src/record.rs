//! Log records and the values they carry

use crate::level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// The level a reporter sees: a regular severity or the synthetic timer level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordLevel {
    Log(LogLevel),
    Timer,
}

impl RecordLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordLevel::Log(level) => level.as_str(),
            RecordLevel::Timer => "timer",
        }
    }

    /// Upper-case label used in text output
    pub fn label(self) -> &'static str {
        match self {
            RecordLevel::Log(LogLevel::Debug) => "DEBUG",
            RecordLevel::Log(LogLevel::Info) => "INFO",
            RecordLevel::Log(LogLevel::Warn) => "WARN",
            RecordLevel::Log(LogLevel::Error) => "ERROR",
            RecordLevel::Timer => "TIMER",
        }
    }

    pub fn is_timer(self) -> bool {
        matches!(self, RecordLevel::Timer)
    }
}

impl From<LogLevel> for RecordLevel {
    fn from(level: LogLevel) -> Self {
        RecordLevel::Log(level)
    }
}

impl fmt::Display for RecordLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error value reduced to name, message and a textual stack
///
/// The stack starts with `"<name>: <message>"` and lists one
/// `"    caused by: ..."` line per source error.
///
/// It is itself an error, so an already normalized value can be handed to
/// the logger wherever a `&dyn Error` is expected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct NormalizedError {
    pub name: String,
    pub message: String,
    pub stack: String,
}

impl NormalizedError {
    pub fn new(
        name: impl Into<String>,
        message: impl Into<String>,
        stack: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: stack.into(),
        }
    }

    /// Normalize any `std::error::Error`, walking its source chain
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let name = short_type_name(std::any::type_name::<E>());
        let message = err.to_string();
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self::with_causes(name, message, causes)
    }

    /// Normalize a type-erased error; a `NormalizedError` is returned as is
    pub fn from_dyn(err: &(dyn std::error::Error + 'static)) -> Self {
        match err.downcast_ref::<NormalizedError>() {
            Some(normalized) => normalized.clone(),
            None => Self::from_error(err),
        }
    }

    /// Normalize an `anyhow::Error` using its context chain
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = err.to_string();
        let causes = err.chain().skip(1).map(|cause| cause.to_string()).collect();
        Self::with_causes("Error".to_string(), message, causes)
    }

    /// Coerce a non-error value into the normalized shape
    pub fn from_display(value: impl fmt::Display) -> Self {
        Self::with_causes("Error".to_string(), value.to_string(), Vec::new())
    }

    fn with_causes(name: String, message: String, causes: Vec<String>) -> Self {
        let mut stack = format!("{}: {}", name, message);
        for cause in causes {
            stack.push_str("\n    caused by: ");
            stack.push_str(&cause);
        }
        Self {
            name,
            message,
            stack,
        }
    }
}

fn short_type_name(full: &str) -> String {
    if full.starts_with("dyn ") {
        return "Error".to_string();
    }
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// A log message, resolved once when the record is built
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Text(String),
    Structured(Value),
    Error(NormalizedError),
}

impl Message {
    /// Serialize an arbitrary value, falling back to its `Debug` form
    pub fn structured<T>(value: &T) -> Self
    where
        T: Serialize + fmt::Debug + ?Sized,
    {
        match serde_json::to_value(value) {
            Ok(Value::String(text)) => Message::Text(text),
            Ok(value) => Message::Structured(value),
            Err(_) => Message::Text(format!("{:?}", value)),
        }
    }

    /// Use an error as the message itself
    pub fn error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        Message::Error(NormalizedError::from_error(err))
    }

    /// Text shown by formatters
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            Message::Text(text) => Cow::Borrowed(text),
            Message::Structured(value) => Cow::Owned(value.to_string()),
            Message::Error(err) => Cow::Borrowed(&err.message),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<&String> for Message {
    fn from(text: &String) -> Self {
        Message::Text(text.clone())
    }
}

impl From<Value> for Message {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Message::Text(text),
            other => Message::Structured(other),
        }
    }
}

impl From<NormalizedError> for Message {
    fn from(err: NormalizedError) -> Self {
        Message::Error(err)
    }
}

macro_rules! message_from_primitive {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Message {
                fn from(value: $ty) -> Self {
                    Message::Structured(Value::from(value))
                }
            }
        )*
    };
}

message_from_primitive!(bool, i32, i64, u32, u64, usize, f64);

/// One accepted log call
///
/// Built once by the logger and shared by reference with every reporter.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub message: Message,
    pub level: RecordLevel,
    pub scope: Option<String>,
    pub error: Option<NormalizedError>,
}

impl LogRecord {
    /// Build a record stamped with the current time; an empty scope counts as none
    pub fn new(
        level: RecordLevel,
        message: Message,
        scope: Option<&str>,
        error: Option<NormalizedError>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            message,
            level,
            scope: scope.filter(|s| !s.is_empty()).map(str::to_string),
            error,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }
}
