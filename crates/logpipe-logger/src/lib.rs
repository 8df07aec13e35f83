//! Structured logging front end.
//!
//! Loggers emit [`LogLine`]s into a [`LogOutputSubject`] that fans each line
//! out to every registered (sink, formatter) pair. All mutable state (the
//! logger registry, level patterns, correlation, display toggles, the output
//! fan-out and the profile-change subject) lives in an explicit
//! [`LogContext`] rather than in process globals.
//!
//! A [`Profile`] snapshots the shareable part of that state so it can be
//! marshalled, shipped to another process and applied there.

pub mod context;
pub mod correlation;
pub mod display;
pub mod error;
pub mod formatter;
pub mod level;
pub mod line;
pub mod logger;
pub mod marshal;
pub mod output;
pub mod profile;
pub mod profile_change;
pub mod tracing_bridge;

pub use context::{DisplayToggles, LogContext, DEFAULT_LOG_PATTERN};
pub use correlation::Correlation;
pub use display::{ByteSliceDisplay, ByteSliceHandler};
pub use error::{LoggerError, Result};
pub use formatter::{ConsoleFormatter, Formatter, LogLineWrapperFormatter, PlainFormatter};
pub use level::{parse_level_pattern, LogLevel};
pub use line::{LogArg, LogLine, LogLineWrapper};
pub use logger::Logger;
pub use marshal::{JsonMarshalizer, Marshalizer, MsgPackMarshalizer};
pub use output::{LogOutputSubject, LogSink, StdoutSink, WriterSink};
pub use profile::Profile;
pub use profile_change::{ProfileChangeObserver, ProfileChangeSubject};
pub use tracing_bridge::LogContextLayer;
