//! Length-prefixed frame format for the daemon protocol.
//!
//! Frame layout (4-byte prefix + payload):
//!
//! ```text
//! +-------------+-------------------+
//! | payload_len | payload           |
//! |   4 bytes   | payload_len bytes |
//! +-------------+-------------------+
//! ```
//!
//! The length prefix is a `u32` in the **native byte order** of the sending
//! process: the daemon writes and reads it with a raw in-memory cast, so the
//! prefix is not in network byte order. The frame is only portable between
//! hosts of matching endianness; changing this would break every deployed
//! daemon, so it is kept as-is.

use crate::error::ProtocolError;
use crate::MAX_PAYLOAD_SIZE;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// A parsed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame payload (JSON data).
    pub payload: Bytes,
}

impl Frame {
    /// Creates a new frame with the given payload.
    pub fn new(payload: Bytes) -> Self {
        Self { payload }
    }

    /// Creates a new frame from a JSON-serializable value.
    pub fn from_json<T: serde::Serialize>(value: &T) -> Result<Self, ProtocolError> {
        let payload = serde_json::to_vec(value)?;
        Ok(Self::new(Bytes::from(payload)))
    }

    /// Encodes the frame into bytes.
    pub fn encode(&self) -> Result<BytesMut, ProtocolError> {
        let payload_len = self.payload.len() as u32;
        if payload_len > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: payload_len,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + self.payload.len());

        // Payload length (4 bytes, native byte order)
        buf.put_slice(&payload_len.to_ne_bytes());

        // Payload
        buf.put_slice(&self.payload);

        Ok(buf)
    }

    /// Decodes a frame from bytes.
    ///
    /// Returns `Ok(Some(frame))` if a complete frame was decoded,
    /// `Ok(None)` if more data is needed, or `Err` on protocol errors.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Self>, ProtocolError> {
        if buf.len() < LENGTH_PREFIX_SIZE {
            return Ok(None);
        }

        // Peek at the prefix without consuming
        let prefix: [u8; 4] = buf[0..LENGTH_PREFIX_SIZE].try_into().unwrap();
        let payload_len = u32::from_ne_bytes(prefix) as usize;

        if payload_len > MAX_PAYLOAD_SIZE as usize {
            return Err(ProtocolError::FrameTooLarge {
                size: payload_len as u32,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        if buf.len() < LENGTH_PREFIX_SIZE + payload_len {
            return Ok(None);
        }

        // Consume prefix
        buf.advance(LENGTH_PREFIX_SIZE);

        // Read payload
        let payload = buf.split_to(payload_len).freeze();

        Ok(Some(Self { payload }))
    }

    /// Returns how many bytes are still missing before `buf` holds one
    /// complete frame, or `None` if no frame is in progress.
    ///
    /// Used to report truncation precisely when the stream ends mid-frame.
    pub fn bytes_needed(buf: &BytesMut) -> Option<usize> {
        if buf.is_empty() {
            return None;
        }
        if buf.len() < LENGTH_PREFIX_SIZE {
            return Some(LENGTH_PREFIX_SIZE - buf.len());
        }
        let prefix: [u8; 4] = buf[0..LENGTH_PREFIX_SIZE].try_into().unwrap();
        let total = LENGTH_PREFIX_SIZE + u32::from_ne_bytes(prefix) as usize;
        if buf.len() < total {
            Some(total - buf.len())
        } else {
            None
        }
    }
}
