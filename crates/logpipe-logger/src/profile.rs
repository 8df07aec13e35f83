use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::LogContext;
use crate::error::Result;
use crate::marshal::JsonMarshalizer;

/// Shareable snapshot of a context's logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Profile {
    pub log_level_patterns: String,
    pub with_correlation: bool,
    pub with_logger_name: bool,
}

impl Profile {
    /// Snapshot the active configuration of `context`.
    pub fn current(context: &LogContext) -> Self {
        Self {
            log_level_patterns: context.log_level_pattern(),
            with_correlation: context.is_enabled_correlation(),
            with_logger_name: context.is_enabled_logger_name(),
        }
    }

    /// Make this profile the active configuration of `context`.
    ///
    /// Observers are not notified; call
    /// [`LogContext::notify_profile_change`] when the change should propagate.
    /// On an invalid pattern the toggles are left untouched.
    pub fn apply(&self, context: &LogContext) -> Result<()> {
        context.set_log_level(&self.log_level_patterns)?;
        context.toggle_correlation(self.with_correlation);
        context.toggle_logger_name(self.with_logger_name);
        Ok(())
    }

    pub fn marshal(&self) -> Result<Vec<u8>> {
        JsonMarshalizer::to_bytes(self)
    }

    pub fn unmarshal(payload: &[u8]) -> Result<Self> {
        JsonMarshalizer::from_bytes(payload)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "logger profile: pattern={}, with correlation={}, with logger name={}",
            self.log_level_patterns, self.with_correlation, self.with_logger_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoggerError;
    use crate::level::LogLevel;

    #[test]
    fn current_reflects_context() {
        let context = LogContext::new();
        context.set_log_level("*:DEBUG").unwrap();
        context.toggle_correlation(true);

        let profile = Profile::current(&context);
        assert_eq!(profile.log_level_patterns, "*:DEBUG");
        assert!(profile.with_correlation);
        assert!(!profile.with_logger_name);
    }

    #[test]
    fn apply_changes_levels_and_toggles() {
        let context = LogContext::new();
        let logger = context.get_or_create("storage");
        let profile = Profile {
            log_level_patterns: "*:ERROR,storage:TRACE".to_string(),
            with_correlation: false,
            with_logger_name: true,
        };

        profile.apply(&context).unwrap();

        assert_eq!(logger.level(), LogLevel::Trace);
        assert_eq!(context.get_or_create("other").level(), LogLevel::Error);
        assert!(context.is_enabled_logger_name());
        assert_eq!(Profile::current(&context), profile);
    }

    #[test]
    fn apply_rejects_bad_pattern() {
        let context = LogContext::new();
        let profile = Profile {
            log_level_patterns: "nonsense".to_string(),
            with_correlation: true,
            with_logger_name: true,
        };
        assert!(profile.apply(&context).is_err());
        assert!(!context.is_enabled_correlation());
    }

    #[test]
    fn wire_form_is_pascal_case_json() {
        let profile = Profile {
            log_level_patterns: "*:TRACE".to_string(),
            with_correlation: true,
            with_logger_name: false,
        };
        let bytes = profile.marshal().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "LogLevelPatterns": "*:TRACE",
                "WithCorrelation": true,
                "WithLoggerName": false
            })
        );
        assert_eq!(Profile::unmarshal(&bytes).unwrap(), profile);
    }

    #[test]
    fn unmarshal_error_carries_payload() {
        let err = Profile::unmarshal(b"{oops").unwrap_err();
        assert!(matches!(err, LoggerError::Unmarshal { ref payload, .. } if payload == "{oops"));
    }

    #[test]
    fn display_summarizes_profile() {
        let profile = Profile {
            log_level_patterns: "*:INFO".to_string(),
            ..Profile::default()
        };
        assert_eq!(
            profile.to_string(),
            "logger profile: pattern=*:INFO, with correlation=false, with logger name=false"
        );
    }
}
