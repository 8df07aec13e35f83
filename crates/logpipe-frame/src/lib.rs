//! Length-prefixed message framing over one-directional byte streams.
//!
//! Every message is framed with a 4-byte little-endian payload length
//! followed by exactly that many payload bytes. There is no magic number and
//! no terminator; a reader that has consumed a length prefix either gets the
//! whole payload or an error.
//!
//! [`Messenger`] pairs a read stream with a write stream (usually the ends of
//! two different pipes) into one bidirectional message channel.

pub mod codec;
pub mod error;
pub mod messenger;

pub use codec::{decode_length, encode_frame, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
pub use error::{FrameError, Result};
pub use messenger::Messenger;
