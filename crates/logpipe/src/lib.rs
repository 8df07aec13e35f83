//! Capture a child process's structured logs over pipes.
//!
//! A supervising process spawns a child with two extra pipes. The child ships
//! every log line it emits over one of them; the parent pushes logging
//! profiles (level patterns and display toggles) over the other.
//!
//! # Crate Structure
//!
//! - [`transport`] - Anonymous pipes, interruptible readers, inherited descriptors
//! - [`frame`] - Length-prefixed message framing
//! - [`logger`] - Logging front end, profiles, profile-change notifications
//! - [`pipes`] - Child and parent parts that run the transport loops

/// Re-export transport types.
pub mod transport {
    pub use logpipe_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use logpipe_frame::*;
}

/// Re-export logger types.
pub mod logger {
    pub use logpipe_logger::*;
}

/// Re-export pipes types.
pub mod pipes {
    pub use logpipe_pipes::*;
}
