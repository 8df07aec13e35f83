use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::os::fd::{AsRawFd, FromRawFd, RawFd};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::error::{Result, TransportError};

/// Create an anonymous pipe, returning `(reader, writer)`.
///
/// Both ends are close-on-exec. Ends meant for a child process are handed
/// over explicitly with [`crate::map_inherited_fds`].
pub fn pipe() -> Result<(File, File)> {
    let mut fds: [libc::c_int; 2] = [-1, -1];

    // SAFETY: `fds` is a valid writable array of two descriptors.
    #[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
    let rc = unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) };

    // SAFETY: `fds` is a valid writable array of two descriptors.
    #[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
    let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };

    if rc != 0 {
        return Err(TransportError::Pipe(io::Error::last_os_error()));
    }

    // SAFETY: `pipe` just returned two fresh descriptors that nothing else owns.
    let (reader, writer) = unsafe { (File::from_raw_fd(fds[0]), File::from_raw_fd(fds[1])) };

    #[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
    {
        set_cloexec(reader.as_raw_fd()).map_err(TransportError::Pipe)?;
        set_cloexec(writer.as_raw_fd()).map_err(TransportError::Pipe)?;
    }

    debug!(
        reader_fd = reader.as_raw_fd(),
        writer_fd = writer.as_raw_fd(),
        "created pipe"
    );
    Ok((reader, writer))
}

pub(crate) fn set_cloexec(fd: RawFd) -> io::Result<()> {
    // SAFETY: F_GETFD/F_SETFD only touch descriptor flags of `fd`.
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFD);
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        if libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC) < 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Read end of a pipe whose blocked reads can be aborted from another thread.
///
/// A plain `File` cannot be closed while another thread is blocked reading
/// it. This reader waits on the data descriptor and on a private wake pipe;
/// once [`ReaderCloser::close`] drops the wake pipe's write end, every pending
/// and future read fails with [`ErrorKind::ConnectionAborted`].
///
/// Reads go through `&InterruptiblePipeReader`, so a shared reference is
/// enough to read. Callers must keep a single reader at a time.
#[derive(Debug)]
pub struct InterruptiblePipeReader {
    file: File,
    wake_reader: File,
    wake_writer: Arc<Mutex<Option<File>>>,
}

/// Handle that aborts reads on its [`InterruptiblePipeReader`].
#[derive(Debug, Clone)]
pub struct ReaderCloser {
    wake_writer: Arc<Mutex<Option<File>>>,
}

impl InterruptiblePipeReader {
    /// Wrap the read end of a pipe.
    pub fn new(file: File) -> Result<Self> {
        let (wake_reader, wake_writer) = pipe()?;
        Ok(Self {
            file,
            wake_reader,
            wake_writer: Arc::new(Mutex::new(Some(wake_writer))),
        })
    }

    /// Handle that can abort reads from any thread.
    pub fn closer(&self) -> ReaderCloser {
        ReaderCloser {
            wake_writer: Arc::clone(&self.wake_writer),
        }
    }

    /// Whether [`ReaderCloser::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closer().is_closed()
    }

    /// Raw descriptor of the data end.
    pub fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    fn wait_readable(&self) -> io::Result<()> {
        loop {
            let mut fds = [
                libc::pollfd {
                    fd: self.file.as_raw_fd(),
                    events: libc::POLLIN,
                    revents: 0,
                },
                libc::pollfd {
                    fd: self.wake_reader.as_raw_fd(),
                    events: libc::POLLIN,
                    revents: 0,
                },
            ];

            // SAFETY: `fds` is a valid array of two initialized pollfd entries.
            let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, -1) };
            if rc < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }

            if fds[1].revents != 0 {
                return Err(io::Error::new(
                    ErrorKind::ConnectionAborted,
                    "pipe reader closed",
                ));
            }
            if fds[0].revents != 0 {
                return Ok(());
            }
        }
    }
}

impl Read for &InterruptiblePipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.wait_readable()?;
        (&self.file).read(buf)
    }
}

impl Read for InterruptiblePipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self).read(buf)
    }
}

impl ReaderCloser {
    /// Abort pending and future reads. Idempotent.
    pub fn close(&self) {
        let closed = self
            .wake_writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if closed.is_some() {
            debug!("pipe reader closed");
        }
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.wake_writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}
