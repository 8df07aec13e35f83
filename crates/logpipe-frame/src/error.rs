/// Errors that can occur while sending or reading frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,

    /// The write stream has been shut down locally.
    #[error("writer closed")]
    WriterClosed,
}

impl FrameError {
    /// Whether the error means the peer or the local side closed the stream.
    pub fn is_closed(&self) -> bool {
        match self {
            FrameError::ConnectionClosed | FrameError::WriterClosed => true,
            FrameError::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::UnexpectedEof
            ),
            FrameError::PayloadTooLarge { .. } => false,
        }
    }
}

impl From<FrameError> for std::io::Error {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(source) => source,
            FrameError::ConnectionClosed | FrameError::WriterClosed => {
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, err)
            }
            FrameError::PayloadTooLarge { .. } => {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, err)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
