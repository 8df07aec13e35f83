use std::io::{Read, Write};
use std::sync::Arc;

use logpipe_frame::{FrameConfig, Messenger};
use logpipe_logger::{LogLine, Marshalizer, Profile};

use crate::error::{PipesError, Result};

/// Parent side of the channel: reads log lines, sends profiles.
pub struct ParentMessenger<R, W> {
    messenger: Messenger<R, W>,
    marshalizer: Arc<dyn Marshalizer>,
}

impl<R, W> ParentMessenger<R, W>
where
    for<'a> &'a R: Read,
    W: Write,
{
    pub fn new(logs_reader: R, profile_writer: W, marshalizer: Arc<dyn Marshalizer>) -> Self {
        Self::with_config(logs_reader, profile_writer, marshalizer, FrameConfig::default())
    }

    pub fn with_config(
        logs_reader: R,
        profile_writer: W,
        marshalizer: Arc<dyn Marshalizer>,
        config: FrameConfig,
    ) -> Self {
        Self {
            messenger: Messenger::with_config(logs_reader, profile_writer, config),
            marshalizer,
        }
    }

    /// Block until the next log line arrives and rebuild it.
    pub fn read_log_line(&self) -> Result<LogLine> {
        let payload = self.messenger.read_message()?;
        self.marshalizer
            .unmarshal(&payload)
            .and_then(|wrapper| wrapper.into_log_line())
            .map_err(PipesError::Decode)
    }

    /// Send `profile` as one frame.
    pub fn send_profile(&self, profile: &Profile) -> Result<usize> {
        let payload = profile.marshal().map_err(PipesError::Encode)?;
        Ok(self.messenger.send_message(&payload)?)
    }
}

impl<R, W> ParentMessenger<R, W> {
    /// Close the profile stream; the child's profile reader sees end of stream.
    pub fn shutdown_writer(&self) {
        self.messenger.shutdown_writer();
    }

    pub fn reader(&self) -> &R {
        self.messenger.reader()
    }
}

impl<R, W> std::fmt::Debug for ParentMessenger<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParentMessenger")
            .field("messenger", &self.messenger)
            .finish_non_exhaustive()
    }
}
