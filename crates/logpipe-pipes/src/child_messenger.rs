use std::io::{Read, Write};

use logpipe_frame::{FrameConfig, Messenger};
use logpipe_logger::Profile;

use crate::error::{PipesError, Result};

/// Child side of the channel: reads profiles, sends marshalled log lines.
#[derive(Debug)]
pub struct ChildMessenger<R, W> {
    messenger: Messenger<R, W>,
}

impl<R, W> ChildMessenger<R, W>
where
    for<'a> &'a R: Read,
    W: Write,
{
    pub fn new(profile_reader: R, logs_writer: W) -> Self {
        Self::with_config(profile_reader, logs_writer, FrameConfig::default())
    }

    pub fn with_config(profile_reader: R, logs_writer: W, config: FrameConfig) -> Self {
        Self {
            messenger: Messenger::with_config(profile_reader, logs_writer, config),
        }
    }

    /// Block until the next profile arrives.
    pub fn read_profile(&self) -> Result<Profile> {
        let payload = self.messenger.read_message()?;
        Profile::unmarshal(&payload).map_err(PipesError::Decode)
    }

    /// Send one already marshalled log line as a frame.
    pub fn send_log_line(&self, line: &[u8]) -> Result<usize> {
        Ok(self.messenger.send_message(line)?)
    }
}
