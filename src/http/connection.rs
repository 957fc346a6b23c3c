use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::server::TlsStream;

use crate::http::parser::ByteSource;

const READ_CHUNK: usize = 4096;

/// Plain TCP or TLS over TCP.
pub enum Stream {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl AsyncRead for Stream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            Stream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Stream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            Stream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            Stream::Plain(s) => Pin::new(s).poll_flush(cx),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            Stream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            Stream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Byte-level I/O over one accepted socket, encrypted or not.
///
/// `stream` is `None` once the connection has been torn down (or a handshake
/// consumed it); every operation then fails without touching the socket.
pub struct Connection {
    stream: Option<Stream>,
    peer: SocketAddr,
    buffer: BytesMut,
    read_timeout: Option<Duration>,
}

impl Connection {
    pub fn new(socket: TcpStream, peer: SocketAddr) -> Self {
        Self {
            stream: Some(Stream::Plain(socket)),
            peer,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            read_timeout: None,
        }
    }

    /// Bounds every blocking read; `None` waits forever.
    pub fn with_read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Performs the TLS handshake when an acceptor is given.
    ///
    /// On failure the socket is already released and the caller must not
    /// attempt further I/O.
    pub async fn setup(&mut self, tls: Option<&TlsAcceptor>) -> bool {
        let Some(acceptor) = tls else {
            return self.stream.is_some();
        };

        let socket = match self.stream.take() {
            Some(Stream::Plain(socket)) => socket,
            Some(tls @ Stream::Tls(_)) => {
                self.stream = Some(tls);
                return true;
            }
            None => return false,
        };

        match acceptor.accept(socket).await {
            Ok(tls) => {
                self.stream = Some(Stream::Tls(Box::new(tls)));
                true
            }
            Err(e) => {
                tracing::warn!(peer = %self.peer, error = %e, "TLS handshake failed");
                false
            }
        }
    }

    /// Writes the whole buffer, or fails.
    pub async fn write_string(&mut self, data: &[u8]) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };

        match stream.write_all(data).await {
            Ok(()) => stream.flush().await.is_ok(),
            Err(e) => {
                tracing::debug!(peer = %self.peer, error = %e, "write failed");
                false
            }
        }
    }

    /// Streams exactly `size` bytes of `file`.
    pub async fn send_file(&mut self, file: File, size: u64) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };

        let mut limited = file.take(size);
        match tokio::io::copy(&mut limited, stream).await {
            Ok(sent) if sent == size => stream.flush().await.is_ok(),
            Ok(sent) => {
                tracing::debug!(peer = %self.peer, sent, size, "file shorter than announced");
                false
            }
            Err(e) => {
                tracing::debug!(peer = %self.peer, error = %e, "sending file failed");
                false
            }
        }
    }

    /// Shuts the transport down and releases the socket. Idempotent.
    pub async fn teardown(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            return;
        };

        if let Err(e) = stream.shutdown().await {
            tracing::trace!(peer = %self.peer, error = %e, "shutdown on teardown failed");
        }
        self.buffer.clear();
    }

    async fn fill(&mut self) -> bool {
        let Some(stream) = self.stream.as_mut() else {
            return false;
        };

        let read = stream.read_buf(&mut self.buffer);
        let result = match self.read_timeout {
            Some(limit) => match timeout(limit, read).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::debug!(peer = %self.peer, "read timed out");
                    return false;
                }
            },
            None => read.await,
        };

        match result {
            Ok(0) => false,
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(peer = %self.peer, error = %e, "read failed");
                false
            }
        }
    }
}

impl ByteSource for Connection {
    async fn read_byte(&mut self) -> Option<u8> {
        if !self.buffer.has_remaining() {
            if self.buffer.capacity() < READ_CHUNK {
                self.buffer.reserve(READ_CHUNK);
            }
            if !self.fill().await {
                return None;
            }
        }
        Some(self.buffer.get_u8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn pair() -> (Connection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, peer) = listener.accept().await.unwrap();
        (Connection::new(server, peer), client)
    }

    #[tokio::test]
    async fn reads_bytes_in_order() {
        let (mut conn, mut client) = pair().await;
        client.write_all(b"GET").await.unwrap();

        assert!(conn.setup(None).await);
        assert_eq!(conn.read_byte().await, Some(b'G'));
        assert_eq!(conn.read_byte().await, Some(b'E'));
        assert_eq!(conn.read_byte().await, Some(b'T'));

        drop(client);
        assert_eq!(conn.read_byte().await, None);
    }

    #[tokio::test]
    async fn teardown_is_idempotent() {
        let (mut conn, mut client) = pair().await;

        conn.teardown().await;
        conn.teardown().await;

        assert!(conn.is_closed());
        assert!(!conn.write_string(b"x").await);
        assert_eq!(conn.read_byte().await, None);

        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn read_timeout_yields_no_byte() {
        let (conn, _client) = pair().await;
        let mut conn = conn.with_read_timeout(Some(Duration::from_millis(20)));

        assert_eq!(conn.read_byte().await, None);
    }
}
