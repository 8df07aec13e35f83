use std::fs::File;
use std::io;
use std::sync::Arc;

use logpipe_logger::{Formatter, LogContext, LogLineWrapperFormatter, LogSink, Marshalizer};
use logpipe_transport::{InterruptiblePipeReader, ReaderCloser};
use tracing::{debug, warn};

use crate::child_messenger::ChildMessenger;
use crate::config::PipesConfig;
use crate::error::{PipesError, Result};
use crate::loop_state::LoopState;
use crate::worker::LoopWorkers;

type Messenger = ChildMessenger<InterruptiblePipeReader, File>;

const PROFILE_READER_THREAD: &str = "logpipe-profile-reader";

/// Runs inside the monitored process.
///
/// While running it is the only observer of the context's log output, so
/// every line logged in the process is marshalled and shipped to the parent
/// instead of being printed. Profiles pushed by the parent are applied to the
/// same context.
pub struct ChildPart {
    messenger: Arc<Messenger>,
    sink: Arc<dyn LogSink>,
    formatter: Arc<dyn Formatter>,
    loop_state: Arc<LoopState>,
    context: Arc<LogContext>,
    closer: ReaderCloser,
}

/// Log sink that forwards each marshalled line to the parent.
///
/// Writes block while the parent is not draining the pipe; nothing is
/// buffered or dropped.
struct LogLineShipper {
    messenger: Arc<Messenger>,
}

impl LogSink for LogLineShipper {
    fn write(&self, data: &[u8]) -> io::Result<usize> {
        self.messenger.send_log_line(data).map_err(|err| match err {
            PipesError::Frame(err) => io::Error::from(err),
            other => io::Error::other(other),
        })
    }
}

impl ChildPart {
    /// Build a child part over the profile read end and the log write end
    /// received from the parent.
    pub fn new(
        profile_reader: File,
        logs_writer: File,
        marshalizer: Arc<dyn Marshalizer>,
        context: Arc<LogContext>,
    ) -> Result<Self> {
        Self::with_config(
            profile_reader,
            logs_writer,
            marshalizer,
            context,
            PipesConfig::default(),
        )
    }

    pub fn with_config(
        profile_reader: File,
        logs_writer: File,
        marshalizer: Arc<dyn Marshalizer>,
        context: Arc<LogContext>,
        config: PipesConfig,
    ) -> Result<Self> {
        let profile_reader = InterruptiblePipeReader::new(profile_reader)?;
        let closer = profile_reader.closer();
        let messenger = Arc::new(ChildMessenger::with_config(
            profile_reader,
            logs_writer,
            config.frame,
        ));

        Ok(Self {
            sink: Arc::new(LogLineShipper {
                messenger: Arc::clone(&messenger),
            }),
            messenger,
            formatter: Arc::new(LogLineWrapperFormatter::new(marshalizer)),
            loop_state: Arc::new(LoopState::new()),
            context,
            closer,
        })
    }

    /// Become the sole log observer and start applying incoming profiles.
    ///
    /// Fails with `InvalidLoopState` unless the part is fresh.
    pub fn start_loop(&self) -> Result<LoopWorkers> {
        self.loop_state.try_start()?;

        let output = self.context.output();
        output.clear_observers();
        output.add_observer(Arc::clone(&self.sink), Arc::clone(&self.formatter));

        let messenger = Arc::clone(&self.messenger);
        let loop_state = Arc::clone(&self.loop_state);
        let context = Arc::clone(&self.context);

        let mut workers = LoopWorkers::default();
        workers.spawn(PROFILE_READER_THREAD, move || {
            read_profiles(&messenger, &loop_state, &context);
        })?;
        debug!("child part loop started");
        Ok(workers)
    }

    /// Stop shipping log lines and stop the profile reader. Idempotent.
    pub fn stop_loop(&self) {
        self.loop_state.set_stopped();
        self.context.output().remove_observer(&self.sink);
        self.closer.close();
    }

    pub fn loop_state(&self) -> &LoopState {
        &self.loop_state
    }
}

impl std::fmt::Debug for ChildPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildPart")
            .field("loop_state", &self.loop_state.get())
            .finish_non_exhaustive()
    }
}

fn read_profiles(messenger: &Messenger, loop_state: &LoopState, context: &LogContext) {
    while loop_state.is_running() {
        let profile = match messenger.read_profile() {
            Ok(profile) => profile,
            Err(err) => {
                debug!(error = %err, "profile reader stopped");
                break;
            }
        };

        // A rejected profile leaves the previous configuration active.
        match profile.apply(context) {
            Ok(()) => debug!(%profile, "profile change applied"),
            Err(err) => warn!(%profile, error = %err, "profile change rejected"),
        }
    }
}
