//! Log levels, verbosity modes and the mode filter

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-call severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    /// Ordinal used by the mode filter
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide verbosity gate
///
/// There is deliberately no `Warn` mode: warnings pass under `Info` and
/// `Debug` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LogMode {
    Disable = 0,
    Error = 1,
    Info = 2,
    Debug = 3,
}

impl LogMode {
    pub const ALL: [LogMode; 4] = [
        LogMode::Disable,
        LogMode::Error,
        LogMode::Info,
        LogMode::Debug,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogMode::Disable => "disable",
            LogMode::Error => "error",
            LogMode::Info => "info",
            LogMode::Debug => "debug",
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            1 => LogMode::Error,
            2 => LogMode::Info,
            3 => LogMode::Debug,
            _ => LogMode::Disable,
        }
    }
}

impl Default for LogMode {
    fn default() -> Self {
        LogMode::Info
    }
}

impl fmt::Display for LogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disable" => Ok(LogMode::Disable),
            "error" => Ok(LogMode::Error),
            "info" => Ok(LogMode::Info),
            "debug" => Ok(LogMode::Debug),
            other => Err(Error::Config {
                message: format!("Unknown log mode '{}'", other),
            }),
        }
    }
}

/// Decide whether a call at `level` passes under `mode`
#[inline]
pub fn passes(mode: LogMode, level: LogLevel) -> bool {
    let l = level.ordinal();
    match mode {
        LogMode::Disable => false,
        LogMode::Error => l > 2,
        LogMode::Info => l > 0,
        LogMode::Debug => true,
    }
}
