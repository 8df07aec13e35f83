//! Parent/child pipe transport.
//!
//! Provides the OS-level plumbing everything else builds on:
//! - anonymous one-directional pipes
//! - pipe readers whose blocked reads can be interrupted from another thread
//! - descriptor inheritance helpers for the launching and the launched process
//!
//! Only Unix is supported; the channel is strictly parent/child.

pub mod error;

#[cfg(unix)]
pub mod inherit;
#[cfg(unix)]
pub mod pipe;

pub use error::{Result, TransportError};

#[cfg(unix)]
pub use inherit::{
    inherited_file, map_inherited_fds, CHILD_LOGS_WRITER_FD, CHILD_PROFILE_READER_FD,
};
#[cfg(unix)]
pub use pipe::{pipe, InterruptiblePipeReader, ReaderCloser};
