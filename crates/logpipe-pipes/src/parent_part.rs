use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::os::fd::{AsRawFd, RawFd};
use std::process::Command;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use logpipe_logger::{LogContext, Logger, Marshalizer, Profile, ProfileChangeObserver};
use logpipe_transport::{
    map_inherited_fds, pipe, InterruptiblePipeReader, ReaderCloser, CHILD_LOGS_WRITER_FD,
    CHILD_PROFILE_READER_FD,
};
use tracing::debug;

use crate::config::PipesConfig;
use crate::error::{PipesError, Result};
use crate::loop_state::LoopState;
use crate::parent_messenger::ParentMessenger;
use crate::worker::LoopWorkers;

type Messenger = ParentMessenger<InterruptiblePipeReader, File>;

const LOG_RELAY_THREAD: &str = "logpipe-log-relay";
const STDOUT_RELAY_THREAD: &str = "logpipe-stdout-relay";
const STDERR_RELAY_THREAD: &str = "logpipe-stderr-relay";

/// Pipe ends meant for the child process.
#[derive(Debug)]
pub struct ChildPipes {
    /// Read end of the profile pipe.
    pub profile_reader: File,
    /// Write end of the log pipe.
    pub logs_writer: File,
}

/// Runs in the supervising process.
///
/// Owns both pipe pairs of one child: log lines flow child → parent, profiles
/// flow parent → child. While running it relays the child's log lines and
/// its stdout/stderr text into the parent's own log output, and pushes the
/// current profile to the child on every profile-change notification.
pub struct ParentPart {
    shared: Arc<Shared>,
    observer: Arc<dyn ProfileChangeObserver>,
}

struct Shared {
    child_name: String,
    messenger: Messenger,
    logs_closer: ReaderCloser,
    child_pipes: Mutex<Option<ChildPipes>>,
    loop_state: LoopState,
    context: Arc<LogContext>,
    log_lines_sink: Arc<Logger>,
    text_output_sink: Arc<Logger>,
}

/// Forwards profile-change notifications to a live part. Holds the part
/// weakly so a subscription cannot keep it alive.
struct ProfileForwarder {
    shared: Weak<Shared>,
}

impl ProfileChangeObserver for ProfileForwarder {
    fn on_profile_changed(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.forward_profile();
        }
    }
}

impl ParentPart {
    /// Create both pipe pairs for a child named `child_name`.
    pub fn new(
        child_name: impl Into<String>,
        marshalizer: Arc<dyn Marshalizer>,
        context: Arc<LogContext>,
    ) -> Result<Self> {
        Self::with_config(child_name, marshalizer, context, PipesConfig::default())
    }

    pub fn with_config(
        child_name: impl Into<String>,
        marshalizer: Arc<dyn Marshalizer>,
        context: Arc<LogContext>,
        config: PipesConfig,
    ) -> Result<Self> {
        let (logs_reader, logs_writer) = pipe()?;
        let (profile_reader, profile_writer) = pipe()?;

        let logs_reader = InterruptiblePipeReader::new(logs_reader)?;
        let logs_closer = logs_reader.closer();

        let shared = Arc::new(Shared {
            child_name: child_name.into(),
            messenger: ParentMessenger::with_config(
                logs_reader,
                profile_writer,
                marshalizer,
                config.frame,
            ),
            logs_closer,
            child_pipes: Mutex::new(Some(ChildPipes {
                profile_reader,
                logs_writer,
            })),
            loop_state: LoopState::new(),
            log_lines_sink: context.get_or_create(&config.log_lines_sink_name),
            text_output_sink: context.get_or_create(&config.text_output_sink_name),
            context,
        });
        let observer: Arc<dyn ProfileChangeObserver> = Arc::new(ProfileForwarder {
            shared: Arc::downgrade(&shared),
        });

        Ok(Self { shared, observer })
    }

    pub fn child_name(&self) -> &str {
        &self.shared.child_name
    }

    /// Raw descriptors of the child-facing ends as (profile reader, logs
    /// writer), while this part still holds them.
    pub fn child_fds(&self) -> Option<(RawFd, RawFd)> {
        self.lock_child_pipes()
            .as_ref()
            .map(|pipes| (pipes.profile_reader.as_raw_fd(), pipes.logs_writer.as_raw_fd()))
    }

    /// Arrange for `command` to receive the child-facing ends as descriptors
    /// 3 (profile reader) and 4 (logs writer).
    ///
    /// The ends stay open in this process until [`ParentPart::release_child_pipes`]
    /// or [`ParentPart::stop_loop`], so spawn before releasing them.
    pub fn configure_command(&self, command: &mut Command) -> Result<()> {
        let (profile_reader, logs_writer) = self.child_fds().ok_or(PipesError::ChildPipesTaken)?;
        map_inherited_fds(
            command,
            &[
                (profile_reader, CHILD_PROFILE_READER_FD),
                (logs_writer, CHILD_LOGS_WRITER_FD),
            ],
        );
        Ok(())
    }

    /// Hand the child-facing ends over to the caller, e.g. to run the child
    /// side in-process.
    pub fn take_child_pipes(&self) -> Result<ChildPipes> {
        self.lock_child_pipes()
            .take()
            .ok_or(PipesError::ChildPipesTaken)
    }

    /// Close this process's copies of the child-facing ends.
    ///
    /// Call after spawning the child: the log relay then sees end of stream
    /// as soon as the child (and anything it passed descriptor 4 on to) exits.
    pub fn release_child_pipes(&self) {
        drop(self.lock_child_pipes().take());
    }

    /// Start relaying and forwarding.
    ///
    /// Subscribes to profile changes, pushes the current profile once, then
    /// spawns the log, stdout and stderr relay threads. Fails with
    /// `InvalidLoopState` unless the part is fresh.
    pub fn start_loop<O, E>(&self, child_stdout: O, child_stderr: E) -> Result<LoopWorkers>
    where
        O: Read + Send + 'static,
        E: Read + Send + 'static,
    {
        self.shared.loop_state.try_start()?;

        self.shared
            .context
            .profile_change()
            .subscribe(Arc::clone(&self.observer));
        self.shared.forward_profile();

        let mut workers = LoopWorkers::default();

        let shared = Arc::clone(&self.shared);
        workers.spawn(LOG_RELAY_THREAD, move || shared.relay_log_lines())?;

        let shared = Arc::clone(&self.shared);
        workers.spawn(STDOUT_RELAY_THREAD, move || {
            shared.relay_text(child_stdout, |sink, name, line| {
                sink.trace(name, &["line".into(), line.into()]);
            });
        })?;

        let shared = Arc::clone(&self.shared);
        workers.spawn(STDERR_RELAY_THREAD, move || {
            shared.relay_text(child_stderr, |sink, name, line| {
                sink.error(name, &["line".into(), line.into()]);
            });
        })?;

        debug!(child = %self.shared.child_name, "parent part loop started");
        Ok(workers)
    }

    /// Stop relaying and close every pipe end this part owns. Idempotent.
    ///
    /// Blocked log reads fail right away and the child's profile reader sees
    /// end of stream. Stdout/stderr relays end when those streams close.
    pub fn stop_loop(&self) {
        self.shared.loop_state.set_stopped();
        self.shared.context.profile_change().unsubscribe(&self.observer);
        self.shared.messenger.shutdown_writer();
        self.release_child_pipes();
        self.shared.logs_closer.close();
        debug!(child = %self.shared.child_name, "parent part loop stopped");
    }

    pub fn loop_state(&self) -> &LoopState {
        &self.shared.loop_state
    }

    fn lock_child_pipes(&self) -> std::sync::MutexGuard<'_, Option<ChildPipes>> {
        self.shared
            .child_pipes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ParentPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParentPart")
            .field("child_name", &self.shared.child_name)
            .field("loop_state", &self.shared.loop_state.get())
            .finish_non_exhaustive()
    }
}

impl Shared {
    fn forward_profile(&self) {
        let profile = Profile::current(&self.context);
        if let Err(err) = self.messenger.send_profile(&profile) {
            debug!(child = %self.child_name, error = %err, "profile not forwarded");
        }
    }

    fn relay_log_lines(&self) {
        while self.loop_state.is_running() {
            match self.messenger.read_log_line() {
                Ok(line) => self.log_lines_sink.log(&line),
                Err(err) => {
                    debug!(child = %self.child_name, error = %err, "log relay stopped");
                    break;
                }
            }
        }
    }

    /// Relay `stream` line by line. Lines are split on raw bytes and decoded
    /// lossily, so non-UTF-8 output never ends the relay.
    fn relay_text<R: Read>(&self, stream: R, emit: impl Fn(&Logger, &str, &str)) {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        while self.loop_state.is_running() {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buf);
                    emit(&self.text_output_sink, &self.child_name, text.trim());
                }
                Err(err) => {
                    debug!(child = %self.child_name, error = %err, "text relay stopped");
                    break;
                }
            }
        }
    }
}
