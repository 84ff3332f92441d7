//! Till-side round trip to a payment terminal.

use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

use crate::codec::{DecodeError, EncodeError, decode, encode};
use crate::message::Message;
use crate::session::{self, SessionError};

/// How long the till waits for the terminal before giving up.
///
/// Covers the whole round trip, a cardholder fumbling for a card
/// included.
pub const ROUND_TRIP_TIMEOUT: Duration = Duration::from_secs(180);

/// Errors raised by a till round trip.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("terminal did not answer in time")]
    Timeout,

    #[error("terminal closed the connection without answering")]
    ClosedWithoutAnswer,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
}

impl From<SessionError> for ClientError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::Io(e) => ClientError::Io(e),
            SessionError::Decode(e) => ClientError::Decode(e),
            SessionError::Encode(e) => ClientError::Encode(e),
        }
    }
}

/// Raw bytes of one completed round trip.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub sent: Vec<u8>,
    pub received: Vec<u8>,
}

impl Exchange {
    /// The terminal's answer, decoded.
    pub fn response(&self) -> Result<Message, DecodeError> {
        decode(&self.received)
    }
}

/// One transaction: connect, send the request, wait for the answer.
pub async fn exchange(host: &str, port: u16, request: &Message) -> Result<Exchange, ClientError> {
    exchange_within(host, port, request, ROUND_TRIP_TIMEOUT).await
}

/// Same round trip under a caller-chosen time limit.
pub async fn exchange_within(
    host: &str,
    port: u16,
    request: &Message,
    limit: Duration,
) -> Result<Exchange, ClientError> {
    tokio::time::timeout(limit, round_trip(host, port, request))
        .await
        .map_err(|_| ClientError::Timeout)?
}

async fn round_trip(host: &str, port: u16, request: &Message) -> Result<Exchange, ClientError> {
    let sent = encode(request)?;
    let mut stream = TcpStream::connect((host, port)).await?;
    debug!(peer = %stream.peer_addr()?, "connected");
    stream.write_all(&sent).await?;
    stream.flush().await?;

    let mut received = Vec::new();
    match session::read_message(&mut stream, &mut received).await? {
        Some(_) => Ok(Exchange { sent, received }),
        None => Err(ClientError::ClosedWithoutAnswer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::PaymentRequest;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn request() -> Message {
        PaymentRequest::new(112.45, "978", 2).into_message().unwrap()
    }

    async fn local_listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    /// Accept one till and swallow `expected` request bytes.
    async fn accept_and_drain(listener: &TcpListener, expected: usize) -> TcpStream {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut taken = 0;
        let mut chunk = [0u8; 256];
        while taken < expected {
            let n = stream.read(&mut chunk).await.unwrap();
            assert_ne!(n, 0, "till closed early");
            taken += n;
        }
        stream
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_on_a_silent_terminal() {
        let (listener, port) = local_listener().await;
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            std::future::pending::<()>().await;
        });

        let error = exchange_within("127.0.0.1", port, &request(), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(error, ClientError::Timeout));
    }

    #[tokio::test]
    async fn reports_a_close_without_answer() {
        let (listener, port) = local_listener().await;
        let sent_len = encode(&request()).unwrap().len();
        tokio::spawn(async move {
            let stream = accept_and_drain(&listener, sent_len).await;
            drop(stream);
        });

        let error = exchange("127.0.0.1", port, &request()).await.unwrap_err();
        assert!(matches!(error, ClientError::ClosedWithoutAnswer));
    }

    #[tokio::test]
    async fn surfaces_a_truncated_answer() {
        let (listener, port) = local_listener().await;
        let sent_len = encode(&request()).unwrap().len();
        tokio::spawn(async move {
            let mut stream = accept_and_drain(&listener, sent_len).await;
            stream.write_all(b"AE002").await.unwrap();
        });

        let error = exchange("127.0.0.1", port, &request()).await.unwrap_err();
        assert!(matches!(
            error,
            ClientError::Decode(DecodeError::Truncated { .. })
        ));
    }

    #[tokio::test]
    async fn refused_connection_is_an_io_error() {
        let (listener, port) = local_listener().await;
        drop(listener);

        let error = exchange("127.0.0.1", port, &request()).await.unwrap_err();
        assert!(matches!(error, ClientError::Io(_)));
    }
}
