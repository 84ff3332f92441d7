//! One till connection: read requests, synthesize replies, write them back.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::codec::{DecodeError, EncodeError, decode, encode};
use crate::message::Message;
use crate::terminal::Terminal;

/// Bytes pulled off the socket per read.
pub const READ_BUFFER_SIZE: usize = 1024;

/// Errors that end a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
}

/// Read one message, accumulating into `buf` until the bytes decode.
///
/// The declared field lengths are the only framing, so a decode that
/// fails with [`DecodeError::is_incomplete`] just means the rest is
/// still in flight. On success `buf` is left holding the raw bytes so
/// the caller can log them; clearing it is the caller's job. A clean
/// close before any byte arrives returns `Ok(None)`; a close mid-message
/// surfaces the pending decode error.
pub async fn read_message<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> Result<Option<Message>, SessionError>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; READ_BUFFER_SIZE];
    loop {
        if !buf.is_empty() {
            match decode(buf) {
                Ok(message) => return Ok(Some(message)),
                Err(error) if error.is_incomplete() => {}
                Err(error) => return Err(error.into()),
            }
        }
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return if buf.is_empty() {
                Ok(None)
            } else {
                // EOF in the middle of a message, report what is wrong
                // with the bytes we did get.
                match decode(buf) {
                    Ok(message) => Ok(Some(message)),
                    Err(error) => Err(error.into()),
                }
            };
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// A terminal session over one accepted connection.
pub struct Session {
    terminal: Arc<Terminal>,
}

impl Session {
    pub fn new(terminal: Arc<Terminal>) -> Self {
        Session { terminal }
    }

    /// Serve requests until the till disconnects or the stream fails.
    ///
    /// Generic over the transport so tests can drive it with an
    /// in-memory pipe.
    pub async fn run<S>(&self, mut stream: S) -> Result<(), SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            let Some(request) = read_message(&mut stream, &mut buf).await? else {
                debug!("till closed the connection");
                return Ok(());
            };
            info!(
                raw = %String::from_utf8_lossy(&buf),
                fields = %request,
                "request received"
            );
            buf.clear();

            let reply = self.terminal.respond(&request);
            if let Some(delay) = reply.delay {
                if !wait_out_delay(&mut stream, &mut buf, delay).await? {
                    info!("till left during processing, dropping the reply");
                    return Ok(());
                }
            }

            let bytes = encode(&reply.message)?;
            stream.write_all(&bytes).await?;
            stream.flush().await?;
            info!(
                raw = %String::from_utf8_lossy(&bytes),
                fields = %reply.message,
                "reply sent"
            );
        }
    }
}

/// Pretend the cardholder is at the terminal for `delay`.
///
/// Watches the stream while sleeping: EOF abandons the reply (returns
/// `false`), anything the till pipelines early is stashed in `buf` for
/// the next message and the watch stops.
async fn wait_out_delay<S>(
    stream: &mut S,
    buf: &mut Vec<u8>,
    delay: Duration,
) -> Result<bool, SessionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    let mut chunk = [0u8; READ_BUFFER_SIZE];
    let mut watching = true;
    loop {
        tokio::select! {
            () = &mut sleep => return Ok(true),
            read = stream.read(&mut chunk), if watching => {
                let n = read?;
                if n == 0 {
                    return Ok(false);
                }
                buf.extend_from_slice(&chunk[..n]);
                watching = false;
            }
        }
    }
}
