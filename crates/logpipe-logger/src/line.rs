use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::correlation::Correlation;
use crate::display::{to_hex, ByteSliceDisplay};
use crate::error::Result;
use crate::level::LogLevel;

/// One argument of a log line. Arguments usually alternate key and value.
#[derive(Debug, Clone, PartialEq)]
pub enum LogArg {
    Text(String),
    Bytes(Vec<u8>),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for LogArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogArg::Text(text) => f.write_str(text),
            LogArg::Bytes(bytes) => f.write_str(&to_hex(bytes)),
            LogArg::Int(value) => write!(f, "{value}"),
            LogArg::Uint(value) => write!(f, "{value}"),
            LogArg::Float(value) => write!(f, "{value}"),
            LogArg::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl LogArg {
    /// Replace a byte-slice argument with its text as rendered by `display`.
    /// Other arguments are returned unchanged.
    pub fn rendered_with(&self, display: &ByteSliceDisplay) -> LogArg {
        match self {
            LogArg::Bytes(bytes) => LogArg::Text(display.display(bytes)),
            other => other.clone(),
        }
    }
}

impl From<&str> for LogArg {
    fn from(value: &str) -> Self {
        LogArg::Text(value.to_string())
    }
}

impl From<String> for LogArg {
    fn from(value: String) -> Self {
        LogArg::Text(value)
    }
}

impl From<&String> for LogArg {
    fn from(value: &String) -> Self {
        LogArg::Text(value.clone())
    }
}

impl From<&[u8]> for LogArg {
    fn from(value: &[u8]) -> Self {
        LogArg::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for LogArg {
    fn from(value: Vec<u8>) -> Self {
        LogArg::Bytes(value)
    }
}

impl From<bool> for LogArg {
    fn from(value: bool) -> Self {
        LogArg::Bool(value)
    }
}

impl From<f64> for LogArg {
    fn from(value: f64) -> Self {
        LogArg::Float(value)
    }
}

macro_rules! impl_from_int {
    ($variant:ident: $($ty:ty),*) => {
        $(
            impl From<$ty> for LogArg {
                fn from(value: $ty) -> Self {
                    LogArg::$variant(value as _)
                }
            }
        )*
    };
}

impl_from_int!(Int: i8, i16, i32, i64, isize);
impl_from_int!(Uint: u8, u16, u32, u64, usize);

/// A structured log record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub logger_name: String,
    pub correlation: Correlation,
    pub message: String,
    pub level: LogLevel,
    pub args: Vec<LogArg>,
    pub timestamp: SystemTime,
}

impl LogLine {
    /// Create a line stamped with the current time.
    pub fn new(
        logger_name: impl Into<String>,
        correlation: Correlation,
        message: impl Into<String>,
        level: LogLevel,
        args: Vec<LogArg>,
    ) -> Self {
        Self {
            logger_name: logger_name.into(),
            correlation,
            message: message.into(),
            level,
            args,
            timestamp: SystemTime::now(),
        }
    }

    /// Arguments rendered as strings, as they travel on the wire.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args.iter().map(ToString::to_string).collect()
    }
}

/// Wire representation of a [`LogLine`].
///
/// Arguments are stringified and the timestamp is carried as nanoseconds
/// since the Unix epoch. Every field defaults when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct LogLineWrapper {
    pub logger_name: String,
    pub correlation: Correlation,
    pub message: String,
    pub log_level: i32,
    pub args: Vec<String>,
    pub timestamp: i64,
}

impl From<&LogLine> for LogLineWrapper {
    fn from(line: &LogLine) -> Self {
        Self {
            logger_name: line.logger_name.clone(),
            correlation: line.correlation.clone(),
            message: line.message.clone(),
            log_level: line.level.as_i32(),
            args: line.arg_strings(),
            timestamp: unix_nanos(line.timestamp),
        }
    }
}

impl LogLineWrapper {
    /// Rebuild the domain line, field by field.
    ///
    /// Fails when the wire level is out of range.
    pub fn into_log_line(self) -> Result<LogLine> {
        Ok(LogLine {
            logger_name: self.logger_name,
            correlation: self.correlation,
            message: self.message,
            level: LogLevel::try_from(self.log_level)?,
            args: self.args.into_iter().map(LogArg::Text).collect(),
            timestamp: from_unix_nanos(self.timestamp),
        })
    }
}

/// Nanoseconds since the Unix epoch, saturating at the `i64` range.
pub fn unix_nanos(timestamp: SystemTime) -> i64 {
    match timestamp.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_nanos()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_nanos())
            .map(|nanos| -nanos)
            .unwrap_or(i64::MIN),
    }
}

/// Inverse of [`unix_nanos`].
pub fn from_unix_nanos(nanos: i64) -> SystemTime {
    let offset = Duration::from_nanos(nanos.unsigned_abs());
    if nanos >= 0 {
        UNIX_EPOCH + offset
    } else {
        UNIX_EPOCH - offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_line() -> LogLine {
        LogLine {
            logger_name: "process/sync".to_string(),
            correlation: Correlation {
                shard: "1".to_string(),
                epoch: 2,
                round: 3,
                sub_round: "start".to_string(),
            },
            message: "synced".to_string(),
            level: LogLevel::Debug,
            args: vec![
                "nonce".into(),
                42u64.into(),
                "hash".into(),
                LogArg::Bytes(vec![0xde, 0xad]),
                "ok".into(),
                true.into(),
            ],
            timestamp: from_unix_nanos(1_700_000_000_123_456_789),
        }
    }

    #[test]
    fn wrapper_stringifies_args_and_timestamp() {
        let wrapper = LogLineWrapper::from(&sample_line());

        assert_eq!(wrapper.logger_name, "process/sync");
        assert_eq!(wrapper.log_level, 1);
        assert_eq!(wrapper.args, vec!["nonce", "42", "hash", "dead", "ok", "true"]);
        assert_eq!(wrapper.timestamp, 1_700_000_000_123_456_789);
    }

    #[test]
    fn wrapper_rebuilds_line_with_text_args() {
        let line = sample_line();
        let rebuilt = LogLineWrapper::from(&line).into_log_line().unwrap();

        assert_eq!(rebuilt.logger_name, line.logger_name);
        assert_eq!(rebuilt.correlation, line.correlation);
        assert_eq!(rebuilt.level, line.level);
        assert_eq!(rebuilt.timestamp, line.timestamp);
        assert_eq!(rebuilt.args[1], LogArg::Text("42".to_string()));
    }

    #[test]
    fn rendered_args_use_the_byte_display() {
        let display = ByteSliceDisplay::default();
        display.set_handler(std::sync::Arc::new(|slice: &[u8]| format!("<{}>", slice.len())));

        let mut line = sample_line();
        line.args = line.args.iter().map(|arg| arg.rendered_with(&display)).collect();

        assert_eq!(line.args[3], LogArg::Text("<2>".to_string()));
        assert_eq!(line.args[1], LogArg::Uint(42));
        assert_eq!(
            LogLineWrapper::from(&line).args,
            vec!["nonce", "42", "hash", "<2>", "ok", "true"]
        );
    }

    #[test]
    fn out_of_range_level_is_rejected() {
        let wrapper = LogLineWrapper {
            log_level: 99,
            ..LogLineWrapper::default()
        };
        assert!(wrapper.into_log_line().is_err());
    }

    #[test]
    fn empty_json_decodes_to_default_wrapper() {
        let wrapper: LogLineWrapper = serde_json::from_str("{}").unwrap();
        assert_eq!(wrapper, LogLineWrapper::default());
    }

    #[test]
    fn nanos_conversion_handles_pre_epoch() {
        let before = from_unix_nanos(-1_500);
        assert_eq!(unix_nanos(before), -1_500);
        assert_eq!(from_unix_nanos(0), UNIX_EPOCH);
    }
}
