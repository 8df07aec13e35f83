use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::correlation::Correlation;
use crate::display::{ByteSliceDisplay, ByteSliceHandler};
use crate::error::Result;
use crate::formatter::ConsoleFormatter;
use crate::level::{parse_level_pattern, LogLevel};
use crate::logger::Logger;
use crate::output::{LogOutputSubject, StdoutSink};
use crate::profile_change::ProfileChangeSubject;

/// Pattern applied to a fresh context.
pub const DEFAULT_LOG_PATTERN: &str = "*:INFO";

const MATCH_ALL: &str = "*";

/// Console column switches shared between a context and its console formatters.
#[derive(Debug, Default)]
pub struct DisplayToggles {
    with_logger_name: AtomicBool,
    with_correlation: AtomicBool,
}

impl DisplayToggles {
    pub fn toggle_logger_name(&self, enabled: bool) {
        self.with_logger_name.store(enabled, Ordering::Release);
    }

    pub fn is_enabled_logger_name(&self) -> bool {
        self.with_logger_name.load(Ordering::Acquire)
    }

    pub fn toggle_correlation(&self, enabled: bool) {
        self.with_correlation.store(enabled, Ordering::Release);
    }

    pub fn is_enabled_correlation(&self) -> bool {
        self.with_correlation.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
struct Registry {
    loggers: HashMap<String, Arc<Logger>>,
    default_level: LogLevel,
    pattern: String,
}

/// Owns all mutable logging state of a process.
///
/// Components receive an `Arc<LogContext>` at construction instead of
/// reaching for globals. [`LogContext::global`] exists for binaries that want
/// a single process-wide instance.
#[derive(Debug)]
pub struct LogContext {
    registry: RwLock<Registry>,
    output: Arc<LogOutputSubject>,
    correlation: Arc<RwLock<Correlation>>,
    toggles: Arc<DisplayToggles>,
    byte_display: Arc<ByteSliceDisplay>,
    profile_change: ProfileChangeSubject,
}

static GLOBAL: LazyLock<Arc<LogContext>> = LazyLock::new(|| Arc::new(LogContext::with_console()));

impl Default for LogContext {
    fn default() -> Self {
        Self::new()
    }
}

impl LogContext {
    /// A context with no output observers and the default pattern.
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(Registry {
                loggers: HashMap::new(),
                default_level: LogLevel::Info,
                pattern: DEFAULT_LOG_PATTERN.to_string(),
            }),
            output: Arc::new(LogOutputSubject::new()),
            correlation: Arc::new(RwLock::new(Correlation::default())),
            toggles: Arc::new(DisplayToggles::default()),
            byte_display: Arc::new(ByteSliceDisplay::default()),
            profile_change: ProfileChangeSubject::new(),
        }
    }

    /// A context that prints to stdout through a [`ConsoleFormatter`].
    pub fn with_console() -> Self {
        let context = Self::new();
        context
            .output
            .add_observer(Arc::new(StdoutSink), Arc::new(context.console_formatter()));
        context
    }

    /// The lazily created process-wide console context.
    pub fn global() -> Arc<LogContext> {
        Arc::clone(&GLOBAL)
    }

    /// Return the logger named `name`, creating it at the current default
    /// level if needed. Repeated calls return the same instance.
    pub fn get_or_create(&self, name: &str) -> Arc<Logger> {
        if let Some(logger) = self.read_registry().loggers.get(name) {
            return Arc::clone(logger);
        }

        let mut registry = self.write_registry();
        let default_level = registry.default_level;
        let logger = registry.loggers.entry(name.to_string()).or_insert_with(|| {
            Arc::new(Logger::new(
                name,
                default_level,
                Arc::clone(&self.output),
                Arc::clone(&self.correlation),
                Arc::clone(&self.byte_display),
            ))
        });
        Arc::clone(logger)
    }

    /// Apply a `MATCHING_STRING:LEVEL,...` pattern.
    ///
    /// Rules apply left to right. `*` sets every existing logger and the
    /// default for loggers created later; any other matching string sets the
    /// loggers whose name contains it. An invalid pattern changes nothing.
    pub fn set_log_level(&self, pattern: &str) -> Result<()> {
        let rules = parse_level_pattern(pattern)?;

        let mut registry = self.write_registry();
        for (matching, level) in &rules {
            if matching == MATCH_ALL {
                registry.default_level = *level;
                for logger in registry.loggers.values() {
                    logger.set_level(*level);
                }
                continue;
            }
            for (name, logger) in &registry.loggers {
                if name.contains(matching.as_str()) {
                    logger.set_level(*level);
                }
            }
        }
        registry.pattern = pattern.to_string();
        tracing::debug!(pattern, "log level pattern applied");
        Ok(())
    }

    /// The last successfully applied pattern.
    pub fn log_level_pattern(&self) -> String {
        self.read_registry().pattern.clone()
    }

    /// Level of the logger `name`, or [`LogLevel::None`] if no such logger
    /// has been created.
    pub fn logger_level(&self, name: &str) -> LogLevel {
        self.read_registry()
            .loggers
            .get(name)
            .map_or(LogLevel::None, |logger| logger.level())
    }

    pub fn toggle_logger_name(&self, enabled: bool) {
        self.toggles.toggle_logger_name(enabled);
    }

    pub fn is_enabled_logger_name(&self) -> bool {
        self.toggles.is_enabled_logger_name()
    }

    pub fn toggle_correlation(&self, enabled: bool) {
        self.toggles.toggle_correlation(enabled);
    }

    pub fn is_enabled_correlation(&self) -> bool {
        self.toggles.is_enabled_correlation()
    }

    pub fn toggles(&self) -> Arc<DisplayToggles> {
        Arc::clone(&self.toggles)
    }

    /// Change how byte-slice arguments are rendered by every logger of this
    /// context. Lines already emitted are unaffected.
    pub fn set_display_byte_slice(&self, handler: Arc<ByteSliceHandler>) {
        self.byte_display.set_handler(handler);
    }

    /// Render `slice` with the current byte-slice handler.
    pub fn display_byte_slice(&self, slice: &[u8]) -> String {
        self.byte_display.display(slice)
    }

    /// A console formatter bound to this context's toggles.
    pub fn console_formatter(&self) -> ConsoleFormatter {
        ConsoleFormatter::new(Arc::clone(&self.toggles))
    }

    pub fn correlation(&self) -> Correlation {
        self.correlation
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_correlation_shard(&self, shard: impl Into<String>) {
        self.update_correlation(|c| c.shard = shard.into());
    }

    pub fn set_correlation_epoch(&self, epoch: u32) {
        self.update_correlation(|c| c.epoch = epoch);
    }

    pub fn set_correlation_round(&self, round: i64) {
        self.update_correlation(|c| c.round = round);
    }

    pub fn set_correlation_subround(&self, sub_round: impl Into<String>) {
        self.update_correlation(|c| c.sub_round = sub_round.into());
    }

    /// The fan-out every logger of this context writes to.
    pub fn output(&self) -> &Arc<LogOutputSubject> {
        &self.output
    }

    pub fn profile_change(&self) -> &ProfileChangeSubject {
        &self.profile_change
    }

    /// Tell every profile-change observer that the active profile changed.
    pub fn notify_profile_change(&self) {
        self.profile_change.notify_all();
    }

    fn update_correlation(&self, f: impl FnOnce(&mut Correlation)) {
        f(&mut self
            .correlation
            .write()
            .unwrap_or_else(PoisonError::into_inner));
    }

    fn read_registry(&self) -> std::sync::RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_registry(&self) -> std::sync::RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}
