use std::io::{ErrorKind, Read, Write};
use std::sync::{Mutex, PoisonError};

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::codec::{decode_length, encode_frame, FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Exchanges framed messages over a read stream and a write stream.
///
/// The two streams need not be ends of the same pipe: a duplex channel is
/// usually built from two independent one-directional pipes.
///
/// Sending is serialized by an internal lock, so any number of threads may
/// call [`Messenger::send_message`] concurrently without interleaving frames.
/// Reading takes no lock: there must be exactly one reader at a time.
pub struct Messenger<R, W> {
    reader: R,
    writer: Mutex<Option<W>>,
    config: FrameConfig,
}

impl<R, W> Messenger<R, W>
where
    for<'a> &'a R: Read,
    W: Write,
{
    /// Create a messenger with default configuration.
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_config(reader, writer, FrameConfig::default())
    }

    /// Create a messenger with explicit configuration.
    pub fn with_config(reader: R, writer: W, config: FrameConfig) -> Self {
        Self {
            reader,
            writer: Mutex::new(Some(writer)),
            config,
        }
    }

    /// Send one message as a single frame (blocking).
    ///
    /// Returns the payload length.
    pub fn send_message(&self, payload: &[u8]) -> Result<usize> {
        if payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        let mut wire = BytesMut::with_capacity(HEADER_SIZE + payload.len());
        encode_frame(payload, &mut wire)?;

        let mut guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let writer = guard.as_mut().ok_or(FrameError::WriterClosed)?;

        let mut offset = 0usize;
        while offset < wire.len() {
            match writer.write(&wire[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        loop {
            match writer.flush() {
                Ok(()) => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        Ok(payload.len())
    }

    /// Read the next complete message (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when the stream ends,
    /// whether cleanly between frames or in the middle of one.
    pub fn read_message(&self) -> Result<Bytes> {
        let mut header = [0u8; HEADER_SIZE];
        self.read_full(&mut header)?;

        let length = decode_length(header);
        if length > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: length,
                max: self.config.max_payload_size,
            });
        }

        let mut payload = vec![0u8; length];
        self.read_full(&mut payload)?;
        trace!(length, "read frame");

        Ok(Bytes::from(payload))
    }

    fn read_full(&self, buf: &mut [u8]) -> Result<()> {
        let mut reader = &self.reader;
        let mut filled = 0usize;
        while filled < buf.len() {
            match reader.read(&mut buf[filled..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }
}

impl<R, W> Messenger<R, W> {
    /// Drop the write stream, closing this side of the outgoing pipe.
    ///
    /// Later sends fail with [`FrameError::WriterClosed`]. Idempotent.
    pub fn shutdown_writer(&self) {
        let writer = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(writer);
    }

    /// Whether [`Messenger::shutdown_writer`] has been called.
    pub fn is_writer_closed(&self) -> bool {
        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Borrow the read stream.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Current configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<R, W> std::fmt::Debug for Messenger<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Messenger")
            .field("writer_closed", &self.is_writer_closed())
            .field("config", &self.config)
            .finish()
    }
}
