//! A DNS over TCP exchange.
//!
//! RFC 1035, section 4.2.2 and RFC 7766 describe DNS over TCP: each message
//! is preceded by a two octet length field in network byte order. This
//! module provides the framing for any blocking byte stream via
//! [`write_framed`] and [`read_framed`] as well as a complete exchange of
//! one query and one reply over a fresh TCP connection via [`exchange`].

use super::conf::{ExchangePolicy, Protocol};
use super::error::Error;
use super::reply::Reply;
use super::request::EncodeError;
use bytes::{BufMut, Bytes, BytesMut};
use socket2::{Domain, Socket, Type};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

//------------ exchange ------------------------------------------------------

/// Sends a query to a name server over TCP and waits for the reply.
///
/// A new connection is established for the exchange and closed again
/// before the function returns. Connecting, sending the query, and
/// receiving the complete reply all have to happen within the policy’s
/// timeout.
pub fn exchange(
    addr: SocketAddr,
    query: &[u8],
    policy: &ExchangePolicy,
) -> Result<Reply, Error> {
    check_frame_len(query.len())?;

    let start = Instant::now();
    let deadline = start + policy.timeout();
    let sock = connect(addr, policy.timeout())?;
    let mut stream = DeadlineStream::new(&sock, deadline);

    write_framed(&mut stream, query)?;
    trace!(%addr, len = query.len(), "TCP query sent");

    let message = read_framed(&mut stream)?;
    let reply = Reply::new(message, addr, Protocol::Tcp, start.elapsed())?;
    trace!(
        %addr,
        len = reply.len(),
        elapsed = ?reply.elapsed(),
        "TCP reply received"
    );
    Ok(reply)
}

//------------ connect -------------------------------------------------------

/// Establishes a TCP connection to `addr` within `timeout`.
///
/// The socket’s address family follows that of `addr`.
pub(crate) fn connect(
    addr: SocketAddr,
    timeout: Duration,
) -> Result<TcpStream, Error> {
    let sock = Socket::new(
        Domain::for_address(addr),
        Type::STREAM,
        Some(socket2::Protocol::TCP),
    )
    .map_err(|err| Error::SocketCreate(Arc::new(err)))?;
    sock.connect_timeout(&addr.into(), timeout).map_err(|err| {
        debug!(%addr, "TCP connect failed: {}", err);
        Error::connect(err)
    })?;
    sock.set_nodelay(true)
        .map_err(|err| Error::Connect(Arc::new(err)))?;
    Ok(sock.into())
}

//------------ Framing -------------------------------------------------------

/// Writes a length-prefixed message to a stream.
///
/// The length and the message are written as one buffer. Partial writes
/// are continued until all octets have been written. A write that does not
/// accept any octets is a short send.
pub fn write_framed<W: Write>(
    stream: &mut W,
    message: &[u8],
) -> Result<(), Error> {
    let len = check_frame_len(message.len())?;
    let mut frame = BytesMut::with_capacity(message.len() + 2);
    frame.put_u16(len);
    frame.put_slice(message);

    let mut pos = 0;
    while pos < frame.len() {
        match stream.write(&frame[pos..]) {
            Ok(0) => return Err(Error::ShortSend),
            Ok(n) => pos += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(Error::send(err)),
        }
    }
    stream.flush().map_err(Error::send)
}

/// Reads a length-prefixed message from a stream.
///
/// Partial reads are continued until the whole message has been read. If
/// the stream ends before that, the read fails with
/// [`Error::UnexpectedEndOfData`].
pub fn read_framed<R: Read>(stream: &mut R) -> Result<Bytes, Error> {
    let mut len = [0u8; 2];
    read_full(stream, &mut len)?;
    let mut buf = BytesMut::zeroed(usize::from(u16::from_be_bytes(len)));
    read_full(stream, &mut buf)?;
    Ok(buf.freeze())
}

/// Fills `buf` from `stream` or fails.
fn read_full<R: Read>(stream: &mut R, buf: &mut [u8]) -> Result<(), Error> {
    let mut pos = 0;
    while pos < buf.len() {
        match stream.read(&mut buf[pos..]) {
            Ok(0) => return Err(Error::UnexpectedEndOfData),
            Ok(n) => pos += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(Error::receive(err)),
        }
    }
    Ok(())
}

/// Checks that a message fits the two octet length prefix.
fn check_frame_len(len: usize) -> Result<u16, Error> {
    u16::try_from(len).map_err(|_| Error::Encode(EncodeError::LongMessage))
}

//------------ DeadlineStream ------------------------------------------------

/// A TCP stream that has to finish all reads and writes before a deadline.
///
/// Before each operation, the socket’s timeout is set to the time remaining
/// until the deadline.
struct DeadlineStream<'a> {
    /// The underlying socket.
    sock: &'a TcpStream,

    /// The point in time when everything has to be done.
    deadline: Instant,
}

impl<'a> DeadlineStream<'a> {
    fn new(sock: &'a TcpStream, deadline: Instant) -> Self {
        DeadlineStream { sock, deadline }
    }

    fn remaining(&self) -> io::Result<Duration> {
        let remain = self.deadline.saturating_duration_since(Instant::now());
        if remain.is_zero() {
            Err(io::ErrorKind::TimedOut.into())
        } else {
            Ok(remain)
        }
    }
}

impl<'a> Read for DeadlineStream<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.sock.set_read_timeout(Some(self.remaining()?))?;
        (&mut &*self.sock).read(buf)
    }
}

impl<'a> Write for DeadlineStream<'a> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sock.set_write_timeout(Some(self.remaining()?))?;
        (&mut &*self.sock).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&mut &*self.sock).flush()
    }
}

//============ Testing =======================================================
