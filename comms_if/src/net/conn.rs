//! Connected links and line framing

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use std::{
    fmt,
    io::{self, Read, Write},
    net::{Shutdown, TcpStream},
    time::Duration
};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Identifier of a connected link, unique for the lifetime of a reactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(pub(crate) u64);

/// Splits a byte stream into newline-terminated lines.
#[derive(Debug)]
pub(crate) struct LineBuffer {
    buf: Vec<u8>,
    max_line_len: usize
}

/// A connected link owned by the reactor.
pub(crate) struct Connection<T> {
    pub id: ConnId,
    pub tag: T,

    /// Address dialled to open the link, `None` for accepted links
    pub dial_addr: Option<String>,

    /// Delay before redialling if the link drops
    pub reconnect: Option<Duration>,

    /// Set once the link should be closed after its pending output is flushed
    pub closing: bool,

    /// Set once a line was refused because the peer is not reading fast enough
    pub overflowed: bool,

    stream: TcpStream,
    send_buf: Vec<u8>,
    max_send_buf: usize,
    recv_buf: LineBuffer
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Reasons a link was closed.
#[derive(Debug, Error)]
pub enum ConnError {
    #[error("Connection closed by peer")]
    PeerClosed,

    #[error("Connection closed locally")]
    LocalClose,

    #[error("Line exceeds the maximum length of {0} bytes")]
    LineTooLong(usize),

    #[error("More than {0} bytes of output are waiting to be sent")]
    SendBufferFull(usize),

    #[error("Socket error: {0}")]
    Io(io::Error)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl LineBuffer {
    pub fn new(max_line_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_line_len
        }
    }

    /// Append received bytes and return every line they completed.
    ///
    /// Line terminators (`\n` or `\r\n`) are stripped. Lines which are not valid UTF-8 are
    /// dropped. If the unterminated remainder grows past the maximum line length the stream is
    /// no longer framed and an error is returned.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<String>, ConnError> {
        self.buf.extend_from_slice(data);

        let mut lines = Vec::new();

        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let mut raw: Vec<u8> = self.buf.drain(..=pos).collect();
            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }

            match String::from_utf8(raw) {
                Ok(s) => lines.push(s),
                Err(e) => warn!("Dropping line which is not valid UTF-8: {}", e)
            }
        }

        if self.buf.len() > self.max_line_len {
            return Err(ConnError::LineTooLong(self.max_line_len))
        }

        Ok(lines)
    }
}

impl<T> Connection<T> {
    pub fn new(
        id: ConnId,
        tag: T,
        stream: TcpStream,
        dial_addr: Option<String>,
        reconnect: Option<Duration>,
        max_line_len: usize,
        max_send_buf: usize
    ) -> io::Result<Self> {
        stream.set_nonblocking(true)?;

        // Lines are small and latency sensitive
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Could not disable Nagle on link {}: {}", id, e);
        }

        Ok(Self {
            id,
            tag,
            dial_addr,
            reconnect,
            closing: false,
            overflowed: false,
            stream,
            send_buf: Vec::new(),
            max_send_buf,
            recv_buf: LineBuffer::new(max_line_len)
        })
    }

    /// Queue a line for sending, appending the newline.
    ///
    /// A line which would take the pending output past the limit is refused and the link marked
    /// as overflowed, it is then closed by the reactor.
    pub fn queue_line(&mut self, line: &str) -> Result<(), ConnError> {
        if self.overflowed || self.send_buf.len() + line.len() + 1 > self.max_send_buf {
            self.overflowed = true;
            return Err(ConnError::SendBufferFull(self.max_send_buf))
        }

        self.send_buf.extend_from_slice(line.as_bytes());
        self.send_buf.push(b'\n');
        Ok(())
    }

    /// True if lines can still be queued on the link.
    pub fn accepts_output(&self) -> bool {
        !self.closing && !self.overflowed
    }

    /// Number of bytes waiting to be written.
    pub fn pending_output(&self) -> usize {
        self.send_buf.len()
    }

    /// True if the link is closing and all its output has been written.
    pub fn ready_to_close(&self) -> bool {
        self.closing && self.send_buf.is_empty()
    }

    /// Perform one non-blocking read.
    ///
    /// Returns `Ok(None)` if there was nothing to read, otherwise the complete lines received.
    pub fn read_once(&mut self, scratch: &mut [u8]) -> Result<Option<Vec<String>>, ConnError> {
        match self.stream.read(scratch) {
            Ok(0) => Err(ConnError::PeerClosed),
            Ok(n) => self.recv_buf.push(&scratch[..n]).map(Some),
            Err(e) if would_block(&e) => Ok(None),
            Err(e) => Err(ConnError::Io(e))
        }
    }

    /// Perform one non-blocking write of pending output.
    ///
    /// Returns true if any bytes were written.
    pub fn flush_once(&mut self) -> Result<bool, ConnError> {
        if self.send_buf.is_empty() {
            return Ok(false)
        }

        match self.stream.write(&self.send_buf) {
            Ok(0) => Err(ConnError::Io(io::ErrorKind::WriteZero.into())),
            Ok(n) => {
                self.send_buf.drain(..n);
                Ok(true)
            },
            Err(e) if would_block(&e) => Ok(false),
            Err(e) => Err(ConnError::Io(e))
        }
    }

    /// Discard any pending output and shut the socket down.
    pub fn shutdown(&mut self) {
        self.send_buf.clear();
        self.stream.shutdown(Shutdown::Both).ok();
    }

    /// Write out all pending output, blocking for at most `timeout` per write, then shut the
    /// socket down. A zero timeout discards the output.
    pub fn flush_and_shutdown(&mut self, timeout: Duration) {
        if !self.send_buf.is_empty() && timeout > Duration::from_millis(0) {
            let res = self.stream.set_nonblocking(false)
                .and_then(|_| self.stream.set_write_timeout(Some(timeout)))
                .and_then(|_| self.stream.write_all(&self.send_buf));

            if let Err(e) = res {
                warn!("Could not flush {} bytes on link {}: {}", self.send_buf.len(), self.id, e);
            }
            self.send_buf.clear();
        }

        self.stream.shutdown(Shutdown::Both).ok();
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn would_block(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_line_buffer_partial() {
        let mut buf = LineBuffer::new(64);

        assert_eq!(buf.push(b"[\"set\", ").unwrap(), Vec::<String>::new());
        assert_eq!(buf.push(b"1]\n[2").unwrap(), vec!["[\"set\", 1]".to_string()]);
        assert_eq!(buf.push(b"]\r\n\n").unwrap(), vec!["[2]".to_string(), String::new()]);
    }

    #[test]
    fn test_line_buffer_invalid_utf8() {
        let mut buf = LineBuffer::new(64);

        assert_eq!(
            buf.push(b"ok\n\xff\xfe\nafter\n").unwrap(),
            vec!["ok".to_string(), "after".to_string()]
        );
    }

    #[test]
    fn test_send_buffer_limit() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let stream = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let mut conn = Connection::new(ConnId(0), (), stream, None, None, 64, 16).unwrap();

        assert!(conn.queue_line("0123456789").is_ok());
        assert_eq!(conn.pending_output(), 11);
        assert!(conn.accepts_output());

        match conn.queue_line("0123") {
            Err(ConnError::SendBufferFull(16)) => (),
            r => panic!("Expected the send buffer to be full, got {:?}", r)
        }
        assert!(!conn.accepts_output());

        // Once overflowed nothing more is queued, even lines that would fit
        assert!(conn.queue_line("").is_err());
        assert_eq!(conn.pending_output(), 11);
    }

    #[test]
    fn test_shutdown_discards_output() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let stream = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (mut peer, _) = listener.accept().unwrap();
        peer.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

        let mut conn = Connection::new(ConnId(1), (), stream, None, None, 64, 1024).unwrap();
        conn.queue_line("never sent").unwrap();
        conn.shutdown();
        assert_eq!(conn.pending_output(), 0);

        let mut received = String::new();
        peer.read_to_string(&mut received).unwrap();
        assert_eq!(received, "");
    }

    #[test]
    fn test_line_buffer_too_long() {
        let mut buf = LineBuffer::new(8);

        // Complete lines are never limited, only an unterminated remainder
        assert!(buf.push(b"0123456789abcdef\n").is_ok());

        match buf.push(b"0123456789") {
            Err(ConnError::LineTooLong(8)) => (),
            r => panic!("Expected a framing error, got {:?}", r)
        }
    }
}
