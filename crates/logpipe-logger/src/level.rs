use std::fmt;
use std::str::FromStr;

use crate::error::{LoggerError, Result};

/// Severity of a log line. Ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    #[default]
    Info = 2,
    Warning = 3,
    Error = 4,
    /// Disables output entirely when set on a logger.
    None = 5,
}

impl LogLevel {
    /// Fixed-width (5 chars) name used in console output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO ",
            LogLevel::Warning => "WARN ",
            LogLevel::Error => "ERROR",
            LogLevel::None => "NONE ",
        }
    }

    /// Numeric value carried on the wire.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Trace,
            1 => LogLevel::Debug,
            2 => LogLevel::Info,
            3 => LogLevel::Warning,
            4 => LogLevel::Error,
            _ => LogLevel::None,
        }
    }
}

impl TryFrom<i32> for LogLevel {
    type Error = LoggerError;

    fn try_from(value: i32) -> Result<Self> {
        match u8::try_from(value) {
            Ok(level @ 0..=5) => Ok(LogLevel::from_u8(level)),
            _ => Err(LoggerError::InvalidLogLevel(value.to_string())),
        }
    }
}

impl FromStr for LogLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "NONE" => Ok(LogLevel::None),
            _ => Err(LoggerError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<tracing::Level> for LogLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => LogLevel::Trace,
            tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::WARN => LogLevel::Warning,
            tracing::Level::ERROR => LogLevel::Error,
        }
    }
}

/// Parse `MATCHING_STRING1:LEVEL1,MATCHING_STRING2:LEVEL2` into ordered rules.
///
/// `*` matches every logger; any other matching string selects loggers whose
/// name contains it. Rules are meant to be applied left to right, so
/// `*:INFO,p2p:ERROR,*:DEBUG,data:INFO` leaves `data` loggers on INFO and all
/// others on DEBUG.
pub fn parse_level_pattern(pattern: &str) -> Result<Vec<(String, LogLevel)>> {
    pattern
        .split(',')
        .map(|rule| {
            let mut parts = rule.split(':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(matching), Some(level), None) => {
                    Ok((matching.trim().to_string(), level.parse()?))
                }
                _ => Err(LoggerError::InvalidLogLevelPattern(rule.to_string())),
            }
        })
        .collect()
}
