use std::os::raw::c_int;

/// Errors that can occur in pipe transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The OS refused to create a pipe.
    #[error("failed to create pipe: {0}")]
    Pipe(std::io::Error),

    /// An inherited descriptor is not open in this process.
    #[error("descriptor {fd} is not open: {source}")]
    BadDescriptor { fd: c_int, source: std::io::Error },

    /// An I/O error occurred on a pipe endpoint.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
