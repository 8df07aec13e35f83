use std::sync::Arc;

use crate::context::DisplayToggles;
use crate::display::{display_time, format_correlation, format_logger_name, format_message};
use crate::line::{LogLine, LogLineWrapper};
use crate::marshal::Marshalizer;

/// Turns a log line into the bytes handed to a sink.
///
/// Returning an empty buffer means "nothing to write".
pub trait Formatter: Send + Sync {
    fn output(&self, line: &LogLine) -> Vec<u8>;
}

/// Human-readable console output:
/// `LEVEL[timestamp] [name] [correlation] message key = value ...`.
///
/// Logger name and correlation columns follow the shared display toggles.
#[derive(Debug, Clone)]
pub struct ConsoleFormatter {
    toggles: Arc<DisplayToggles>,
}

impl ConsoleFormatter {
    pub fn new(toggles: Arc<DisplayToggles>) -> Self {
        Self { toggles }
    }
}

impl Formatter for ConsoleFormatter {
    fn output(&self, line: &LogLine) -> Vec<u8> {
        let logger_name = if self.toggles.is_enabled_logger_name() {
            format_logger_name(&line.logger_name)
        } else {
            String::new()
        };
        let correlation = if self.toggles.is_enabled_correlation() {
            format_correlation(&line.correlation)
        } else {
            String::new()
        };

        format!(
            "{}[{}] {} {} {} {}\n",
            line.level,
            display_time(line.timestamp),
            logger_name,
            correlation,
            format_message(&line.message),
            render_args(line),
        )
        .into_bytes()
    }
}

/// Compact output without timestamp or padding: `LEVEL [name] message key = value`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn output(&self, line: &LogLine) -> Vec<u8> {
        let args = render_args(line);
        let mut text = format!("{} [{}] {}", line.level, line.logger_name, line.message);
        if !args.is_empty() {
            text.push(' ');
            text.push_str(&args);
        }
        text.push('\n');
        text.into_bytes()
    }
}

/// Serializes each line into its wire form.
///
/// Marshal failures yield empty output, which the output subject skips.
#[derive(Clone)]
pub struct LogLineWrapperFormatter {
    marshalizer: Arc<dyn Marshalizer>,
}

impl LogLineWrapperFormatter {
    pub fn new(marshalizer: Arc<dyn Marshalizer>) -> Self {
        Self { marshalizer }
    }
}

impl Formatter for LogLineWrapperFormatter {
    fn output(&self, line: &LogLine) -> Vec<u8> {
        self.marshalizer
            .marshal(&LogLineWrapper::from(line))
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for LogLineWrapperFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogLineWrapperFormatter").finish_non_exhaustive()
    }
}

/// Render arguments as `key = value` pairs. A trailing unpaired key renders
/// with an empty value.
fn render_args(line: &LogLine) -> String {
    line.args
        .chunks(2)
        .map(|pair| match pair {
            [key, value] => format!("{key} = {value}"),
            [key] => format!("{key} = "),
            _ => String::new(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
