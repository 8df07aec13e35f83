/// Errors produced by the logging front end.
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// A level name is not one of TRACE, DEBUG, INFO, WARN, ERROR, NONE.
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    /// A level pattern rule is not of the form `MATCHING_STRING:LEVEL`.
    #[error("invalid log level pattern: {0}")]
    InvalidLogLevelPattern(String),

    /// A value could not be serialized.
    #[error("marshal failed: {0}")]
    Marshal(String),

    /// A payload could not be deserialized. Carries the offending payload.
    #[error("unmarshal failed for payload '{payload}': {reason}")]
    Unmarshal { payload: String, reason: String },
}

impl LoggerError {
    pub(crate) fn unmarshal(payload: &[u8], reason: impl std::fmt::Display) -> Self {
        LoggerError::Unmarshal {
            payload: String::from_utf8_lossy(payload).into_owned(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoggerError>;
