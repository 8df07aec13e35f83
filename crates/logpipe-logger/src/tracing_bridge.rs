//! Routes `tracing` events into a [`LogContext`].
//!
//! Installing [`LogContextLayer`] in a child process means code instrumented
//! with `tracing` ends up in the same fan-out as direct [`crate::Logger`]
//! calls, and therefore gets shipped to the parent too.

use std::fmt;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::context::LogContext;
use crate::level::LogLevel;
use crate::line::LogArg;

/// Targets under this prefix are our own diagnostics. Forwarding them would
/// loop back into the pipes they describe.
const INTERNAL_TARGET_PREFIX: &str = "logpipe";

/// A layer that emits each event through the logger named after its target.
#[derive(Debug, Clone)]
pub struct LogContextLayer {
    context: Arc<LogContext>,
}

impl LogContextLayer {
    pub fn new(context: Arc<LogContext>) -> Self {
        Self { context }
    }
}

impl<S> Layer<S> for LogContextLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let target = metadata.target();
        if target.starts_with(INTERNAL_TARGET_PREFIX) {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        self.context.get_or_create(target).log_at(
            LogLevel::from(*metadata.level()),
            &visitor.message,
            &visitor.args,
        );
    }
}

/// Collects the `message` field and turns every other field into a key/value
/// argument pair.
#[derive(Default)]
struct EventVisitor {
    message: String,
    args: Vec<LogArg>,
}

impl EventVisitor {
    fn push(&mut self, field: &Field, value: LogArg) {
        if field.name() == "message" {
            self.message = value.to_string();
            return;
        }
        self.args.push(field.name().into());
        self.args.push(value);
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{value:?}").into());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.into());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, value.into());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, value.into());
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;
    use crate::formatter::PlainFormatter;
    use crate::output::WriterSink;

    fn capture(context: &LogContext) -> Arc<WriterSink<Vec<u8>>> {
        let sink = Arc::new(WriterSink::new(Vec::new()));
        context.output().add_observer(sink.clone(), Arc::new(PlainFormatter));
        sink
    }

    #[test]
    fn events_become_log_lines() {
        let context = Arc::new(LogContext::new());
        let sink = capture(&context);
        let subscriber =
            tracing_subscriber::registry().with(LogContextLayer::new(Arc::clone(&context)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "app/db", table = "users", rows = 3u64, "slow query");
            tracing::debug!(target: "app/db", "filtered by level");
        });

        let text = sink.with_inner(|buf| String::from_utf8_lossy(buf).into_owned());
        assert_eq!(text, "WARN  [app/db] slow query table = users rows = 3\n");
    }

    #[test]
    fn internal_targets_are_skipped() {
        let context = Arc::new(LogContext::new());
        let sink = capture(&context);
        let subscriber =
            tracing_subscriber::registry().with(LogContextLayer::new(Arc::clone(&context)));

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(target: "logpipe_pipes::child_part", "internal");
        });

        assert!(sink.with_inner(|buf| buf.is_empty()));
    }
}
