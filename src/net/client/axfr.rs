//! Zone transfers over TCP.
//!
//! A full zone transfer as described in RFC 5936 returns the zone as a
//! sequence of messages on a single TCP connection. The answer sections of
//! these messages, taken together, start with the zone’s SOA record,
//! followed by all the other records of the zone, and end with the SOA
//! record again.
//!
//! [`AxfrStream`] reads these messages one by one as an iterator. It only
//! looks at the record types of the answer sections in order to find the
//! closing SOA record. Once that has been seen, the stream ends and the
//! connection is closed. If the connection breaks down before, the stream
//! ends with an [`Error::IncompleteTransfer`].

use super::conf::ExchangePolicy;
use super::error::Error;
use super::tcp::{self, read_framed, write_framed};
use crate::base::iana::Rtype;
use crate::base::wire::{answer_types, ParseError};
use bytes::Bytes;
use std::boxed::Box;
use std::io::Read;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::vec::Vec;
use tracing::{debug, trace};

//------------ connect -------------------------------------------------------

/// Starts a zone transfer with a name server.
///
/// Establishes a TCP connection to `addr` and sends the query. The returned
/// stream will read the reply messages. Each read, including the one for
/// the first message, has to succeed within the policy’s timeout.
pub fn connect(
    addr: SocketAddr,
    query: &[u8],
    policy: &ExchangePolicy,
) -> Result<AxfrStream, Error> {
    let mut sock = tcp::connect(addr, policy.timeout())?;
    sock.set_write_timeout(Some(policy.timeout()))
        .map_err(|err| Error::Send(Arc::new(err)))?;
    sock.set_read_timeout(Some(policy.timeout()))
        .map_err(|err| Error::Receive(Arc::new(err)))?;
    write_framed(&mut sock, query)?;
    trace!(%addr, len = query.len(), "AXFR query sent");
    Ok(AxfrStream::new(sock, addr))
}

//------------ AxfrStream ----------------------------------------------------

/// The messages of a zone transfer.
///
/// The stream is an iterator over the raw reply messages in the order they
/// were received. It ends after the message containing the closing SOA
/// record. If the transfer can’t be completed, the last item is an
/// [`Error::IncompleteTransfer`].
///
/// The stream owns the connection. It is closed when the stream ends or is
/// dropped.
#[derive(Debug)]
pub struct AxfrStream<S = TcpStream> {
    /// The connection, if it is still open.
    sock: Option<S>,

    /// The address of the name server.
    addr: SocketAddr,

    /// A message already read but not yet returned.
    pending: Option<Bytes>,

    /// The number of messages read so far.
    received: usize,

    /// The number of SOA records seen so far.
    soa_count: usize,
}

impl<S: Read> AxfrStream<S> {
    /// Creates a new stream reading from `sock`.
    ///
    /// The query has to have been sent already.
    pub fn new(sock: S, addr: SocketAddr) -> Self {
        AxfrStream {
            sock: Some(sock),
            addr,
            pending: None,
            received: 0,
            soa_count: 0,
        }
    }

    /// Returns the address of the name server.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the number of messages received so far.
    pub fn received(&self) -> usize {
        self.received
    }

    /// Returns whether the closing SOA record has been received.
    pub fn is_complete(&self) -> bool {
        self.soa_count >= 2
    }

    /// Reads the first message ahead of time.
    ///
    /// This makes sure the server actually started the transfer. The
    /// message is still returned as the first item of the iterator. Calling
    /// this method after the first message has been read does nothing.
    pub fn prime(&mut self) -> Result<(), Error> {
        if self.received == 0 && self.sock.is_some() {
            self.pending = Some(self.read_message()?);
        }
        Ok(())
    }

    /// Reads all remaining messages.
    pub fn collect_all(self) -> Result<Vec<Bytes>, Error> {
        self.collect()
    }

    /// Reads the next message from the connection.
    ///
    /// Any failure closes the connection and ends the transfer.
    fn read_message(&mut self) -> Result<Bytes, Error> {
        let Some(sock) = self.sock.as_mut() else {
            return Err(self.incomplete(Error::UnexpectedEndOfData));
        };
        let message = match read_framed(sock) {
            Ok(message) => message,
            Err(err) => {
                debug!(addr = %self.addr, "AXFR read failed: {}", err);
                return Err(self.incomplete(err));
            }
        };
        if let Err(err) = self.scan(&message) {
            debug!(addr = %self.addr, "malformed AXFR message: {}", err);
            return Err(self.incomplete(Error::MalformedReply(err)));
        }
        self.received += 1;
        trace!(
            addr = %self.addr,
            len = message.len(),
            received = self.received,
            "AXFR message received"
        );
        if self.is_complete() {
            debug!(addr = %self.addr, received = self.received, "AXFR done");
            self.sock = None;
        }
        Ok(message)
    }

    /// Counts the SOA records in the answer section of a message.
    fn scan(&mut self, message: &[u8]) -> Result<(), ParseError> {
        for (idx, rtype) in answer_types(message)?.enumerate() {
            let rtype = rtype?;
            if self.received == 0 && idx == 0 && rtype != Rtype::SOA {
                return Err(ParseError::form_error(
                    "zone transfer does not start with SOA",
                ));
            }
            if rtype == Rtype::SOA {
                self.soa_count += 1;
                if self.is_complete() {
                    break;
                }
            }
        }
        if self.received == 0 && self.soa_count == 0 {
            return Err(ParseError::form_error(
                "zone transfer does not start with SOA",
            ));
        }
        Ok(())
    }

    /// Closes the connection and wraps `err` as an incomplete transfer.
    fn incomplete(&mut self, err: Error) -> Error {
        self.sock = None;
        Error::IncompleteTransfer {
            received: self.received,
            source: Box::new(err),
        }
    }
}

impl<S: Read> Iterator for AxfrStream<S> {
    type Item = Result<Bytes, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(message) = self.pending.take() {
            return Some(Ok(message));
        }
        self.sock.as_ref()?;
        Some(self.read_message())
    }
}

//============ Testing =======================================================
