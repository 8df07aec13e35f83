use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::formatter::Formatter;
use crate::line::LogLine;

/// Destination of formatted log output.
///
/// Sinks are identified by `Arc` identity when removed from a
/// [`LogOutputSubject`].
pub trait LogSink: Send + Sync {
    /// Write one formatted line. Returns the number of bytes accepted.
    fn write(&self, data: &[u8]) -> io::Result<usize>;
}

/// Writes to the process's standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write(&self, data: &[u8]) -> io::Result<usize> {
        let mut out = io::stdout().lock();
        out.write_all(data)?;
        out.flush()?;
        Ok(data.len())
    }
}

/// Adapts any `Write` into a sink.
#[derive(Debug)]
pub struct WriterSink<W> {
    inner: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Consume the sink and return the writer.
    pub fn into_inner(self) -> W {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with the writer borrowed.
    pub fn with_inner<T>(&self, f: impl FnOnce(&W) -> T) -> T {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn write(&self, data: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.write_all(data)?;
        Ok(data.len())
    }
}

struct Observer {
    sink: Arc<dyn LogSink>,
    formatter: Arc<dyn Formatter>,
}

/// Fans every log line out to the registered (sink, formatter) pairs.
///
/// The observer list is guarded by a read-write lock: registration takes the
/// write lock, [`LogOutputSubject::output`] only the read lock, so any number
/// of threads may log concurrently. Observers are visited in registration
/// order.
#[derive(Default)]
pub struct LogOutputSubject {
    observers: RwLock<Vec<Observer>>,
}

impl LogOutputSubject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Format `line` once per observer and write it to that observer's sink.
    ///
    /// Empty formatter output is skipped. Sink write errors are ignored so a
    /// failing sink cannot keep the others from receiving the line.
    pub fn output(&self, line: &LogLine) {
        let observers = self.observers.read().unwrap_or_else(PoisonError::into_inner);
        for observer in observers.iter() {
            let formatted = observer.formatter.output(line);
            if formatted.is_empty() {
                continue;
            }
            let _ = observer.sink.write(&formatted);
        }
    }

    /// Register a new (sink, formatter) pair.
    pub fn add_observer(&self, sink: Arc<dyn LogSink>, formatter: Arc<dyn Formatter>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Observer { sink, formatter });
    }

    /// Remove every observer whose sink is `sink`. Returns whether any was removed.
    pub fn remove_observer(&self, sink: &Arc<dyn LogSink>) -> bool {
        let mut observers = self
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|observer| !same_sink(&observer.sink, sink));
        observers.len() != before
    }

    /// Remove all observers.
    pub fn clear_observers(&self) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl std::fmt::Debug for LogOutputSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogOutputSubject")
            .field("observers", &self.observer_count())
            .finish()
    }
}

fn same_sink(a: &Arc<dyn LogSink>, b: &Arc<dyn LogSink>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::correlation::Correlation;
    use crate::formatter::PlainFormatter;
    use crate::level::LogLevel;

    fn line(message: &str) -> LogLine {
        LogLine::new("test", Correlation::default(), message, LogLevel::Info, vec![])
    }

    fn buffer_sink() -> Arc<WriterSink<Vec<u8>>> {
        Arc::new(WriterSink::new(Vec::new()))
    }

    fn text_of(sink: &WriterSink<Vec<u8>>) -> String {
        sink.with_inner(|buf| String::from_utf8_lossy(buf).into_owned())
    }

    struct FailingSink;

    impl LogSink for FailingSink {
        fn write(&self, _data: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    struct SilentFormatter;

    impl Formatter for SilentFormatter {
        fn output(&self, _line: &LogLine) -> Vec<u8> {
            Vec::new()
        }
    }

    #[test]
    fn output_reaches_every_observer() {
        let subject = LogOutputSubject::new();
        let first = buffer_sink();
        let second = buffer_sink();
        subject.add_observer(first.clone(), Arc::new(PlainFormatter));
        subject.add_observer(second.clone(), Arc::new(PlainFormatter));

        subject.output(&line("hello"));

        assert!(text_of(&first).contains("hello"));
        assert!(text_of(&second).contains("hello"));
    }

    #[test]
    fn failing_sink_does_not_block_others() {
        let subject = LogOutputSubject::new();
        let good = buffer_sink();
        subject.add_observer(Arc::new(FailingSink), Arc::new(PlainFormatter));
        subject.add_observer(good.clone(), Arc::new(PlainFormatter));

        subject.output(&line("still here"));
        assert!(text_of(&good).contains("still here"));
    }

    #[test]
    fn empty_formatter_output_is_not_written() {
        let subject = LogOutputSubject::new();
        let sink = buffer_sink();
        subject.add_observer(sink.clone(), Arc::new(SilentFormatter));

        subject.output(&line("dropped"));
        assert!(text_of(&sink).is_empty());
    }

    #[test]
    fn remove_observer_by_identity() {
        let subject = LogOutputSubject::new();
        let kept = buffer_sink();
        let removed: Arc<dyn LogSink> = buffer_sink();
        subject.add_observer(kept.clone(), Arc::new(PlainFormatter));
        subject.add_observer(removed.clone(), Arc::new(PlainFormatter));

        assert!(subject.remove_observer(&removed));
        assert!(!subject.remove_observer(&removed));
        assert_eq!(subject.observer_count(), 1);

        let other: Arc<dyn LogSink> = buffer_sink();
        assert!(!subject.remove_observer(&other));
    }

    #[test]
    fn clear_observers_empties_the_list() {
        let subject = LogOutputSubject::new();
        subject.add_observer(buffer_sink(), Arc::new(PlainFormatter));
        subject.add_observer(buffer_sink(), Arc::new(PlainFormatter));

        subject.clear_observers();
        assert_eq!(subject.observer_count(), 0);
    }

    #[test]
    fn concurrent_output_keeps_lines_whole() {
        let subject = Arc::new(LogOutputSubject::new());
        let sink = buffer_sink();
        subject.add_observer(sink.clone(), Arc::new(PlainFormatter));

        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let subject = Arc::clone(&subject);
                thread::spawn(move || {
                    for i in 0..100 {
                        subject.output(&line(&format!("worker-{worker}-line-{i}")));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let text = text_of(&sink);
        assert_eq!(text.lines().count(), 400);
        assert!(text.lines().all(|l| l.contains("worker-")));
    }
}
