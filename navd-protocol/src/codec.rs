//! Encoder and decoder for framed daemon messages.

use crate::error::ProtocolError;
use crate::frame::Frame;
use bytes::BytesMut;
use serde::de::DeserializeOwned;

/// Encodes messages into frames.
pub struct Encoder;

impl Encoder {
    /// Encodes any JSON-serializable message into a frame.
    pub fn encode_message<T: serde::Serialize>(value: &T) -> Result<BytesMut, ProtocolError> {
        let frame = Frame::from_json(value)?;
        frame.encode()
    }
}

/// Decodes frames into messages from an incrementally filled buffer.
///
/// Which message type a frame holds is implied by its position in the
/// exchange (envelope, then command body, then result), so decoding is
/// generic over the expected type.
pub struct Decoder {
    buffer: BytesMut,
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(8192),
        }
    }

    /// Appends data to the internal buffer.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Attempts to decode the next frame from the buffer.
    pub fn decode_frame(&mut self) -> Result<Option<Frame>, ProtocolError> {
        Frame::decode(&mut self.buffer)
    }

    /// Attempts to decode the next message from the buffer.
    ///
    /// Returns `Ok(None)` until a complete frame has been buffered.
    pub fn decode_message<T: DeserializeOwned>(&mut self) -> Result<Option<T>, ProtocolError> {
        match self.decode_frame()? {
            Some(frame) => {
                let payload =
                    std::str::from_utf8(&frame.payload).map_err(|_| ProtocolError::InvalidUtf8)?;
                let message: T = serde_json::from_str(payload)?;
                Ok(Some(message))
            }
            None => Ok(None),
        }
    }

    /// Returns how many bytes are still missing for the partially buffered
    /// frame, or `None` if no frame is in progress.
    pub fn needed(&self) -> Option<usize> {
        Frame::bytes_needed(&self.buffer)
    }

    /// Returns the number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
