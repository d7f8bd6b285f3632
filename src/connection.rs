use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use uuid::Uuid;

use crate::codec::FrameCodec;
use crate::frame::Frame;
use crate::Result;

/// A single client connection. Frames are read from and written to the socket
/// through `FrameCodec`, which buffers partial input until a whole frame is
/// available.
pub struct Connection {
    pub id: Uuid,
    framed: Framed<TcpStream, FrameCodec>,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            framed: Framed::new(stream, FrameCodec),
        }
    }

    /// Reads the next frame from the socket. Returns `Ok(None)` when the peer
    /// closed the connection cleanly between frames; a close in the middle of
    /// a frame surfaces as an error.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>> {
        self.framed.next().await.transpose()
    }

    /// Serializes `frame` and writes it out, flushing the socket.
    pub async fn write_frame(&mut self, frame: Frame) -> Result<()> {
        self.framed.send(frame).await
    }
}
