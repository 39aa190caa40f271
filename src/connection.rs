//! Socket ownership and line framing.
//!
//! The protocol is one UTF-8 line per message, so the connection exposes a
//! line-granular read and a write-then-flush send. [`LineReader`] does the
//! re-framing: the peer may deliver half a line or several lines in one
//! read, and complete lines must be served from the buffer before the
//! socket is touched again. It is generic over the byte source so tests can
//! feed it scripted chunks without a real socket.

use std::io;

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
};

const LINE_ENDINGS: &[char] = &['\n', '\r'];

/// Reassembles newline-delimited lines from a continuous byte stream.
pub struct LineReader<R> {
    inner: BufReader<R>,
    line: String,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            inner: BufReader::new(source),
            line: String::new(),
        }
    }

    /// Returns the next complete line with its terminator stripped, or
    /// `Ok(None)` once the peer has closed and the buffer is drained.
    /// Blank lines carry no protocol meaning and are skipped here.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            self.line.clear();
            let bytes = self.inner.read_line(&mut self.line).await?;
            if bytes == 0 {
                return Ok(None);
            }
            let trimmed = self.line.trim_end_matches(LINE_ENDINGS);
            if trimmed.is_empty() {
                continue;
            }
            return Ok(Some(trimmed.to_string()));
        }
    }
}

/// The read side of a split [`Connection`], owned by the receive task.
pub type ReceiveHalf = LineReader<OwnedReadHalf>;

/// The write side of a split [`Connection`], owned by the send task.
pub struct SendHalf {
    writer: OwnedWriteHalf,
}

impl SendHalf {
    /// Writes the whole line and flushes. Partial writes are retried until
    /// every byte is on the wire or the stream errors; bytes already sent
    /// are not rolled back.
    pub async fn send(&mut self, line: &str) -> io::Result<()> {
        send_all(&mut self.writer, line).await
    }

    /// Half-closes the stream: flushes, then signals the peer that no more
    /// data follows. Reads on the other half resolve to end-of-stream once
    /// the peer closes in response.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.writer.shutdown().await
    }
}

/// One live TCP connection to the chat server.
///
/// Used whole during the login handshake, then split into its two halves so
/// the receive and send tasks can run concurrently. Dropping the halves
/// releases the socket.
pub struct Connection {
    reader: LineReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Connection {
    pub async fn connect(address: &str, port: u16) -> io::Result<Self> {
        let stream = TcpStream::connect((address, port)).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: LineReader::new(reader),
            writer,
        })
    }

    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        self.reader.next_line().await
    }

    pub async fn send(&mut self, line: &str) -> io::Result<()> {
        send_all(&mut self.writer, line).await
    }

    pub fn into_split(self) -> (ReceiveHalf, SendHalf) {
        let Connection { reader, writer } = self;
        (reader, SendHalf { writer })
    }
}

async fn send_all<W>(writer: &mut W, line: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}
