//! The reply to a query.

use super::conf::Protocol;
use super::error::Error;
use crate::base::Header;
use bytes::Bytes;
use core::ops;
use std::net::SocketAddr;
use std::time::Duration;

//------------ Reply ---------------------------------------------------------

/// A reply received from a name server.
///
/// This type wraps the raw octets of the reply message together with some
/// information on how it was obtained. The message is not parsed beyond
/// its header.
#[derive(Clone, Debug)]
pub struct Reply {
    /// The reply message in wire format.
    message: Bytes,

    /// A copy of the header of the message.
    header: Header,

    /// The name server the reply came from.
    addr: SocketAddr,

    /// The protocol the reply was received over.
    protocol: Protocol,

    /// The time between sending the query and receiving the reply.
    elapsed: Duration,
}

impl Reply {
    /// Creates a new reply from a received message.
    ///
    /// Returns an error if the message is too short to contain a header.
    pub fn new(
        message: Bytes,
        addr: SocketAddr,
        protocol: Protocol,
        elapsed: Duration,
    ) -> Result<Self, Error> {
        let header = Header::for_message_slice(&message)
            .map_err(Error::MalformedReply)?;
        Ok(Reply {
            message,
            header,
            addr,
            protocol,
            elapsed,
        })
    }

    /// Returns the header of the reply.
    pub fn header(&self) -> Header {
        self.header
    }

    /// Returns whether the reply was marked as truncated.
    pub fn is_truncated(&self) -> bool {
        self.header.tc()
    }

    /// Returns the reply message.
    pub fn message(&self) -> &Bytes {
        &self.message
    }

    /// Converts the reply into the reply message.
    pub fn into_message(self) -> Bytes {
        self.message
    }

    /// Returns the length of the reply message in octets.
    pub fn len(&self) -> usize {
        self.message.len()
    }

    /// Returns whether the reply message is empty.
    ///
    /// Since a reply always contains a header, this is always `false`.
    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }

    /// Returns the address of the name server that sent the reply.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the protocol the reply was received over.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Returns the time it took to receive the reply.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl ops::Deref for Reply {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.message.as_ref()
    }
}

impl AsRef<[u8]> for Reply {
    fn as_ref(&self) -> &[u8] {
        self.message.as_ref()
    }
}

impl From<Reply> for Bytes {
    fn from(reply: Reply) -> Self {
        reply.into_message()
    }
}
