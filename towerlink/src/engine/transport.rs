//! The two TCP channels to the engine and frame-level reads and writes.
//!
//! Frame reads are not cancel-safe (a partial read inside `select!` would
//! corrupt the stream), so each channel gets a dedicated reader task that
//! forwards whole frames over an in-process queue. The client task selects
//! over those queues instead of the sockets.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::protocol::{Frame, ProtocolError, MAX_PART_LEN};

use super::{EngineConfig, EngineError};

/// Queue depth between a frame reader and the client task.
const READER_QUEUE_DEPTH: usize = 64;

/// The established engine connections, split for the client task.
pub struct EngineChannels {
    pub event_reader: OwnedReadHalf,
    pub event_writer: OwnedWriteHalf,
    pub stream_reader: OwnedReadHalf,
}

impl EngineChannels {
    /// Open both channels. Each TCP connect is bounded by the configured
    /// connect timeout.
    pub async fn connect(config: &EngineConfig) -> Result<Self, EngineError> {
        tracing::info!(
            host = %config.host,
            event_port = config.event_port,
            stream_port = config.stream_port,
            "connecting to engine"
        );

        let event = connect_one(config, config.event_port).await?;
        // Command frames are small; don't let Nagle hold them back.
        event.set_nodelay(true)?;
        let stream = connect_one(config, config.stream_port).await?;

        let (event_reader, event_writer) = event.into_split();
        // The stream channel is read-only on our side.
        let (stream_reader, _) = stream.into_split();

        Ok(Self {
            event_reader,
            event_writer,
            stream_reader,
        })
    }
}

async fn connect_one(config: &EngineConfig, port: u16) -> Result<TcpStream, EngineError> {
    let attempt = TcpStream::connect((config.host.as_str(), port));
    match tokio::time::timeout(config.connect_timeout, attempt).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(EngineError::ConnectTimeout(config.connect_timeout)),
    }
}

/// Read one multipart frame: `part_count:u8`, then `len:u32 LE` + bytes per
/// part. Oversized parts are rejected before allocation.
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame, EngineError>
where
    R: AsyncRead + Unpin,
{
    let part_count = reader.read_u8().await?;
    if part_count == 0 {
        return Err(EngineError::Protocol(ProtocolError::EmptyFrame));
    }

    let mut parts = Vec::with_capacity(part_count as usize);
    for _ in 0..part_count {
        let len = reader.read_u32_le().await? as usize;
        Frame::check_part_len(len)?;
        let mut body = vec![0u8; len];
        reader.read_exact(&mut body).await?;
        parts.push(Bytes::from(body));
    }

    Ok(Frame::from_parts(parts)?)
}

/// Write one frame and flush it.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<(), EngineError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&frame.encode()).await?;
    writer.flush().await?;
    Ok(())
}

/// Spawn a reader task feeding whole frames into a queue.
///
/// The task stops on cancellation, when the queue's receiver is dropped, or
/// after forwarding the first error (a transport error ends the stream; the
/// client task decides what it means).
pub fn spawn_frame_reader<R>(
    mut reader: R,
    channel: &'static str,
    cancel: CancellationToken,
) -> mpsc::Receiver<Result<Frame, EngineError>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(READER_QUEUE_DEPTH);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = read_frame(&mut reader) => {
                    let failed = result.is_err();
                    if tx.send(result).await.is_err() {
                        break;
                    }
                    if failed {
                        break;
                    }
                }
            }
        }
        tracing::debug!(channel, "frame reader stopped");
    });

    rx
}
