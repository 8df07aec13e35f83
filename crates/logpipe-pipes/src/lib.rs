//! Cross-process log transport between a supervising parent and its child.
//!
//! The child runs a [`ChildPart`]: it becomes the only observer of its log
//! output and ships every line, marshalled, over a pipe. The parent runs a
//! [`ParentPart`]: it owns both pipe pairs, re-emits shipped lines and the
//! child's stdout/stderr through its own loggers, and pushes its current
//! [`logpipe_logger::Profile`] to the child whenever the profile changes.
//!
//! ```text
//!   parent                                   child
//!   ParentMessenger.read_log_line  <-- logs pipe ---   ChildMessenger.send_log_line
//!   ParentMessenger.send_profile   --- profile pipe -> ChildMessenger.read_profile
//! ```
//!
//! By convention the child receives the profile read end as descriptor 3 and
//! the logs write end as descriptor 4.

pub mod child_messenger;
pub mod config;
pub mod error;
pub mod loop_state;
pub mod parent_messenger;
pub mod worker;

#[cfg(unix)]
pub mod child_part;
#[cfg(unix)]
pub mod parent_part;

pub use child_messenger::ChildMessenger;
pub use config::{PipesConfig, LOG_LINES_SINK_NAME, TEXT_OUTPUT_SINK_NAME};
pub use error::{PipesError, Result};
pub use loop_state::{LoopState, LoopStateKind};
pub use parent_messenger::ParentMessenger;
pub use worker::LoopWorkers;

#[cfg(unix)]
pub use child_part::ChildPart;
#[cfg(unix)]
pub use parent_part::{ChildPipes, ParentPart};
