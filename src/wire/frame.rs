use crate::wire::{Envelope, NodeAddress};
use bytes::{BufMut, BytesMut};
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Upper bound on one frame. A FOLLOW_OK snapshot of any realistic store
/// fits well under this; anything larger is treated as garbage.
const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("socket failure: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("frame of {0} bytes exceeds the 16 MiB limit")]
    FrameTooLarge(usize),

    /// The peer closed the connection before writing a frame. A node that
    /// cannot route a request answers this way on purpose.
    #[error("peer closed the connection without a payload")]
    ClosedWithoutPayload,
}

/// Writes one length-prefixed frame: a 4-byte big-endian payload length
/// followed by the JSON-encoded envelope. The explicit prefix makes
/// end-of-message deterministic; reading until a short recv would deadlock
/// whenever a payload lands exactly on a buffer boundary.
pub async fn write_frame(stream: &mut TcpStream, envelope: &Envelope) -> Result<(), WireError> {
    let payload = serde_json::to_vec(envelope).map_err(WireError::Encode)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge(payload.len()));
    }

    let mut frame = BytesMut::with_capacity(4 + payload.len());
    frame.put_u32(payload.len() as u32);
    frame.put_slice(&payload);

    stream.write_all(&frame).await?;
    Ok(())
}

/// Reads exactly one frame. Blocks without timeout, like every network
/// operation in this system.
pub async fn read_frame(stream: &mut TcpStream) -> Result<Envelope, WireError> {
    let mut len_buf = [0u8; 4];
    if let Err(e) = stream.read_exact(&mut len_buf).await {
        return Err(match e.kind() {
            io::ErrorKind::UnexpectedEof => WireError::ClosedWithoutPayload,
            _ => WireError::Io(e),
        });
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(WireError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await?;

    serde_json::from_slice(&payload).map_err(WireError::Decode)
}

/// One-shot exchange: open a fresh connection to `target`, send the
/// envelope, wait for the single reply. Connections are never reused.
pub async fn request(target: &NodeAddress, envelope: Envelope) -> Result<Envelope, WireError> {
    let mut stream = TcpStream::connect((target.ip.as_str(), target.port)).await?;
    write_frame(&mut stream, &envelope).await?;
    read_frame(&mut stream).await
}
