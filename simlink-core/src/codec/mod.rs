//! Length-prefixed framing for the simulator command channel.
//!
//! ```text
//! +------------------+---------------------------+
//! | Length (4B, u32) | UTF-8 JSON payload        |
//! +------------------+---------------------------+
//! ```
//!
//! The prefix byte order comes from [`WireFormat`](crate::config::WireFormat)
//! and is the same for both directions. A frame is only yielded once the
//! full payload has been buffered; partial reads simply wait for more data.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::config::ByteOrder;
use crate::error::SimError;

/// Size of the length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Largest payload accepted in either direction (64 MiB).
pub const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// `tokio_util` codec turning a byte stream into payload frames.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    order: ByteOrder,
    max_frame_size: usize,
}

impl FrameCodec {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }

    pub fn with_max_frame_size(mut self, max: usize) -> Self {
        self.max_frame_size = max;
        self
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(ByteOrder::default())
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = SimError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LENGTH_PREFIX_SIZE {
            return Ok(None);
        }

        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        prefix.copy_from_slice(&src[..LENGTH_PREFIX_SIZE]);
        let len = self.order.read_len(prefix) as usize;
        if len > self.max_frame_size {
            return Err(SimError::FrameTooLarge {
                size: len,
                max: self.max_frame_size,
            });
        }

        if src.len() < LENGTH_PREFIX_SIZE + len {
            src.reserve(LENGTH_PREFIX_SIZE + len - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_PREFIX_SIZE);
        Ok(Some(src.split_to(len).freeze()))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(frame) => Ok(Some(frame)),
            // EOF with a partial header or payload buffered.
            None if !buf.is_empty() => Err(SimError::ConnectionClosed),
            None => Ok(None),
        }
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = SimError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.len() > self.max_frame_size {
            return Err(SimError::FrameTooLarge {
                size: item.len(),
                max: self.max_frame_size,
            });
        }
        dst.reserve(LENGTH_PREFIX_SIZE + item.len());
        dst.put_slice(&self.order.write_len(item.len() as u32));
        dst.put_slice(&item);
        Ok(())
    }
}

/// Encode one payload into a complete frame.
pub fn encode_frame(order: ByteOrder, payload: &[u8]) -> Result<Bytes, SimError> {
    let mut dst = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    FrameCodec::new(order).encode(Bytes::copy_from_slice(payload), &mut dst)?;
    Ok(dst.freeze())
}
