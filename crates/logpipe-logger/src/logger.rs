use std::fmt::Display;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::correlation::Correlation;
use crate::display::ByteSliceDisplay;
use crate::level::LogLevel;
use crate::line::{LogArg, LogLine};
use crate::output::LogOutputSubject;

/// A named logger bound to a context's output and correlation.
///
/// Obtain loggers through [`crate::LogContext::get_or_create`] so that level
/// patterns apply to them.
pub struct Logger {
    name: String,
    level: AtomicU8,
    output: Arc<LogOutputSubject>,
    correlation: Arc<RwLock<Correlation>>,
    byte_display: Arc<ByteSliceDisplay>,
}

impl Logger {
    pub(crate) fn new(
        name: impl Into<String>,
        level: LogLevel,
        output: Arc<LogOutputSubject>,
        correlation: Arc<RwLock<Correlation>>,
        byte_display: Arc<ByteSliceDisplay>,
    ) -> Self {
        Self {
            name: name.into(),
            level: AtomicU8::new(level as u8),
            output,
            correlation,
            byte_display,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Acquire))
    }

    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::Release);
    }

    pub fn trace(&self, message: &str, args: &[LogArg]) {
        self.log_at(LogLevel::Trace, message, args);
    }

    pub fn debug(&self, message: &str, args: &[LogArg]) {
        self.log_at(LogLevel::Debug, message, args);
    }

    pub fn info(&self, message: &str, args: &[LogArg]) {
        self.log_at(LogLevel::Info, message, args);
    }

    pub fn warn(&self, message: &str, args: &[LogArg]) {
        self.log_at(LogLevel::Warning, message, args);
    }

    pub fn error(&self, message: &str, args: &[LogArg]) {
        self.log_at(LogLevel::Error, message, args);
    }

    /// Emit a line at `level` if the logger's level lets it through.
    ///
    /// Byte-slice arguments are rendered to text here, with the context's
    /// byte-slice display.
    pub fn log_at(&self, level: LogLevel, message: &str, args: &[LogArg]) {
        if level == LogLevel::None || level < self.level() {
            return;
        }
        let correlation = self
            .correlation
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        self.output.output(&LogLine::new(
            self.name.as_str(),
            correlation,
            message,
            level,
            args.iter()
                .map(|arg| arg.rendered_with(&self.byte_display))
                .collect(),
        ));
    }

    /// Forward a prebuilt line unconditionally, bypassing the level check.
    pub fn log(&self, line: &LogLine) {
        self.output.output(line);
    }

    /// Log `err` at error level with `message`, if there is one.
    pub fn log_if_error<E: Display>(&self, err: Option<&E>, message: &str, args: &[LogArg]) {
        let Some(err) = err else {
            return;
        };
        let mut args = args.to_vec();
        args.push("error".into());
        args.push(err.to_string().into());
        self.error(message, &args);
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::PlainFormatter;
    use crate::output::WriterSink;

    fn setup(level: LogLevel) -> (Logger, Arc<WriterSink<Vec<u8>>>) {
        let output = Arc::new(LogOutputSubject::new());
        let sink = Arc::new(WriterSink::new(Vec::new()));
        output.add_observer(sink.clone(), Arc::new(PlainFormatter));
        let logger = Logger::new(
            "node",
            level,
            output,
            Arc::new(RwLock::new(Correlation::default())),
            Arc::new(ByteSliceDisplay::default()),
        );
        (logger, sink)
    }

    fn captured(sink: &WriterSink<Vec<u8>>) -> String {
        sink.with_inner(|buf| String::from_utf8_lossy(buf).into_owned())
    }

    #[test]
    fn filters_below_logger_level() {
        let (logger, sink) = setup(LogLevel::Info);
        logger.debug("hidden", &[]);
        logger.info("shown", &["k".into(), 1i32.into()]);
        logger.error("also shown", &[]);

        let text = captured(&sink);
        assert!(!text.contains("hidden"));
        assert!(text.contains("INFO  [node] shown k = 1"));
        assert!(text.contains("also shown"));
    }

    #[test]
    fn byte_args_render_as_hex_by_default() {
        let (logger, sink) = setup(LogLevel::Info);
        logger.info("hash", &["root".into(), vec![0x0a, 0xff].into()]);
        assert!(captured(&sink).contains("hash root = 0aff"));
    }

    #[test]
    fn none_level_silences_everything() {
        let (logger, sink) = setup(LogLevel::None);
        logger.error("nope", &[]);
        assert!(captured(&sink).is_empty());
    }

    #[test]
    fn set_level_takes_effect() {
        let (logger, sink) = setup(LogLevel::Error);
        logger.set_level(LogLevel::Trace);
        assert_eq!(logger.level(), LogLevel::Trace);
        logger.trace("verbose", &[]);
        assert!(captured(&sink).contains("verbose"));
    }

    #[test]
    fn log_bypasses_level() {
        let (logger, sink) = setup(LogLevel::None);
        let line = LogLine::new("remote", Correlation::default(), "relayed", LogLevel::Trace, vec![]);
        logger.log(&line);
        assert!(captured(&sink).contains("TRACE [remote] relayed"));
    }

    #[test]
    fn log_if_error_appends_error_arg() {
        let (logger, sink) = setup(LogLevel::Info);
        logger.log_if_error::<std::io::Error>(None, "skipped", &[]);
        let err = std::io::Error::other("disk full");
        logger.log_if_error(Some(&err), "write failed", &["file".into(), "a.db".into()]);

        let text = captured(&sink);
        assert!(!text.contains("skipped"));
        assert!(text.contains("write failed file = a.db error = disk full"));
    }
}
