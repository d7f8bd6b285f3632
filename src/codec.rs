use std::env;
use std::io::Cursor;
use std::sync::OnceLock;

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{trace, warn};

use crate::frame::{self, Frame};
use crate::Error;

const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

pub struct FrameCodec;

impl FrameCodec {
    // Read and parsed once; an unparsable value falls back to the default
    // rather than taking down live connections from the decode path.
    fn max_frame_size() -> usize {
        static MAX_FRAME_SIZE: OnceLock<usize> = OnceLock::new();

        *MAX_FRAME_SIZE.get_or_init(|| match env::var("MAX_FRAME_SIZE") {
            Ok(value) => value.parse().unwrap_or_else(|_| {
                warn!("MAX_FRAME_SIZE is not a number, using the default");
                DEFAULT_MAX_FRAME_SIZE
            }),
            Err(_) => DEFAULT_MAX_FRAME_SIZE,
        })
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Bound the amount of buffered input a single frame may claim.
        if src.len() > FrameCodec::max_frame_size() {
            return Err("frame size exceeds limit".into());
        }

        let mut cursor = Cursor::new(&src[..]);
        let frame = match Frame::parse(&mut cursor) {
            Ok(frame) => frame,
            Err(frame::Error::Incomplete) => return Ok(None), // Not enough data to parse a frame.
            Err(err) => return Err(err.into()),
        };

        let position: usize = cursor
            .position()
            .try_into()
            .expect("Cursor position is too large");

        trace!("decoded frame of {} bytes", position);

        // Remove the parsed frame from the buffer.
        src.advance(position);

        Ok(Some(frame))
    }

    // A clean end of stream between frames signals orderly connection closure.
    // Leftover bytes that never became a whole frame mean the peer went away
    // mid-frame.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(frame::Error::Truncated.into()),
        }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&frame.serialize());
        Ok(())
    }
}
