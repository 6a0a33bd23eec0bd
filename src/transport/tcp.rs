use std::io;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::config::{DEFAULT_MAX_LINE_LEN, DEFAULT_WRITE_TIMEOUT};
use crate::protocol::ServerMessage;
use crate::transport::{Inbound, Outbound};

/// Newline-framed text over a TCP stream.
pub struct TcpTransport {
    stream: TcpStream,
    max_line_len: usize,
    write_timeout: Duration,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self::with_config(stream, DEFAULT_MAX_LINE_LEN, DEFAULT_WRITE_TIMEOUT)
    }

    pub fn with_config(stream: TcpStream, max_line_len: usize, write_timeout: Duration) -> Self {
        Self {
            stream,
            max_line_len,
            write_timeout,
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }

    /// Split into independently owned reading and writing halves.
    pub fn into_split(self) -> (TcpReader, TcpWriter) {
        let (read, write) = self.stream.into_split();
        (
            TcpReader {
                reader: BufReader::new(read),
                max_line_len: self.max_line_len,
            },
            TcpWriter {
                half: write,
                write_timeout: self.write_timeout,
            },
        )
    }
}

fn read_error(e: io::Error) -> anyhow::Error {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => anyhow::anyhow!("Connection closed by peer"),
        io::ErrorKind::ConnectionReset => anyhow::anyhow!("Connection reset by peer"),
        _ => anyhow::anyhow!("Read error: {}", e),
    }
}

fn write_error(e: io::Error) -> anyhow::Error {
    match e.kind() {
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset => {
            anyhow::anyhow!("Connection closed by peer")
        }
        _ => anyhow::anyhow!("Write error: {}", e),
    }
}

pub struct TcpReader {
    reader: BufReader<OwnedReadHalf>,
    max_line_len: usize,
}

#[async_trait::async_trait]
impl Inbound for TcpReader {
    async fn recv_line(&mut self) -> anyhow::Result<Option<String>> {
        let mut buf = Vec::new();
        // The limit counts payload only; leave room for a CR LF terminator.
        let limit = self.max_line_len as u64 + 2;
        let n = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut buf)
            .await
            .map_err(read_error)?;
        if n == 0 {
            return Ok(None);
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        if buf.len() > self.max_line_len {
            return Err(anyhow::anyhow!(
                "Message too large: more than {} bytes",
                self.max_line_len
            ));
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}

pub struct TcpWriter {
    half: OwnedWriteHalf,
    write_timeout: Duration,
}

impl TcpWriter {
    /// Write one raw line, appending the terminator.
    pub async fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
        let mut data = String::with_capacity(line.len() + 1);
        data.push_str(line);
        data.push('\n');
        timeout(self.write_timeout, self.half.write_all(data.as_bytes()))
            .await
            .map_err(|_| anyhow::anyhow!("Send timeout after {:?}", self.write_timeout))?
            .map_err(write_error)
    }
}

#[async_trait::async_trait]
impl Outbound for TcpWriter {
    async fn send(&mut self, msg: &ServerMessage) -> anyhow::Result<()> {
        self.send_line(&msg.to_string()).await
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        timeout(self.write_timeout, self.half.shutdown())
            .await
            .map_err(|_| anyhow::anyhow!("Shutdown timeout after {:?}", self.write_timeout))?
            .map_err(write_error)
    }
}
