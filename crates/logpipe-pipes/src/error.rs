use logpipe_logger::LoggerError;

/// Errors produced by the parent and child parts.
#[derive(Debug, thiserror::Error)]
pub enum PipesError {
    /// A loop was started while not in its initial state.
    #[error("invalid operation given state of loop")]
    InvalidLoopState,

    /// Pipe creation or descriptor handling failed.
    #[error("transport error: {0}")]
    Transport(#[from] logpipe_transport::TransportError),

    /// A frame could not be sent or read.
    #[error("frame error: {0}")]
    Frame(#[from] logpipe_frame::FrameError),

    /// Frame bytes do not decode into the expected value.
    #[error("decode error: {0}")]
    Decode(#[source] LoggerError),

    /// A value could not be encoded for sending.
    #[error("encode error: {0}")]
    Encode(#[source] LoggerError),

    /// The operating system refused to start a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The child-facing pipe ends were already handed out.
    #[error("child pipe ends already taken")]
    ChildPipesTaken,
}

impl PipesError {
    /// Whether the error only means the other side went away.
    pub fn is_closed(&self) -> bool {
        matches!(self, PipesError::Frame(err) if err.is_closed())
    }
}

pub type Result<T> = std::result::Result<T, PipesError>;
