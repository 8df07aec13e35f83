//! Display helpers: hex, fixed-width columns, timestamps and the byte-slice hook.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::correlation::Correlation;

const BRACKETS_LENGTH: usize = "[]".len();
const LOGGER_NAME_FIXED_LENGTH: usize = 20;
const CORRELATION_FIXED_LENGTH: usize = 14;
const MESSAGE_FIXED_LENGTH: usize = 40;
const ELLIPSIS: &str = "..";

/// Lowercase hex of the whole slice.
pub fn to_hex(slice: &[u8]) -> String {
    slice.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Short-hand hex showing only the first and last 3 bytes (at most 14 chars).
pub fn to_hex_short(slice: &[u8]) -> String {
    if slice.len() < 6 {
        return to_hex(slice);
    }
    format!(
        "{}{ELLIPSIS}{}",
        to_hex(&slice[..3]),
        to_hex(&slice[slice.len() - 3..])
    )
}

/// Renders a byte-slice log argument.
pub type ByteSliceHandler = dyn Fn(&[u8]) -> String + Send + Sync;

/// Swappable byte-slice renderer shared by a context and its loggers.
///
/// Starts out as [`to_hex`].
pub struct ByteSliceDisplay {
    handler: RwLock<Arc<ByteSliceHandler>>,
}

impl Default for ByteSliceDisplay {
    fn default() -> Self {
        let handler: Arc<ByteSliceHandler> = Arc::new(to_hex);
        Self {
            handler: RwLock::new(handler),
        }
    }
}

impl ByteSliceDisplay {
    pub fn set_handler(&self, handler: Arc<ByteSliceHandler>) {
        *self.handler.write().unwrap_or_else(PoisonError::into_inner) = handler;
    }

    pub fn display(&self, slice: &[u8]) -> String {
        let handler = Arc::clone(&self.handler.read().unwrap_or_else(PoisonError::into_inner));
        handler(slice)
    }
}

impl fmt::Debug for ByteSliceDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteSliceDisplay").finish_non_exhaustive()
    }
}

/// Local time with millisecond precision.
pub fn display_time(timestamp: SystemTime) -> String {
    DateTime::<Local>::from(timestamp)
        .format("%Y-%m-%d %H:%M:%S%.3f")
        .to_string()
}

pub fn pad_right(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

/// Keep the tail of `text`, prefixed by an ellipsis, when it exceeds `max`.
pub fn truncate_prefix(text: &str, max: usize) -> String {
    let chars = text.chars().count();
    if chars <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let tail: String = text.chars().skip(chars - keep).collect();
    format!("{ELLIPSIS}{tail}")
}

pub fn format_logger_name(name: &str) -> String {
    let name = truncate_prefix(name, LOGGER_NAME_FIXED_LENGTH - BRACKETS_LENGTH);
    pad_right(&format!("[{name}]"), LOGGER_NAME_FIXED_LENGTH)
}

pub fn format_correlation(correlation: &Correlation) -> String {
    pad_right(&correlation.to_string(), CORRELATION_FIXED_LENGTH)
}

pub fn format_message(message: &str) -> String {
    pad_right(message, MESSAGE_FIXED_LENGTH)
}
