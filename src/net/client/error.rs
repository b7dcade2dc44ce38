//! Error type for client transports.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use super::conf::Protocol;
use super::request::EncodeError;
use crate::base::wire::ParseError;
use std::boxed::Box;
use std::error;
use std::fmt::{self, Display, Formatter};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::vec::Vec;

//------------ Error ---------------------------------------------------------

/// Error type for client transports.
#[derive(Clone, Debug)]
pub enum Error {
    /// The query could not be produced.
    Encode(EncodeError),

    /// Creating or binding a socket gave an error.
    SocketCreate(Arc<io::Error>),

    /// Sending the query gave an error.
    Send(Arc<io::Error>),

    /// Sending over a socket gave a partial result.
    ShortSend,

    /// Writing the query to a stream took too long.
    SendTimeout,

    /// Connecting a stream socket gave an error.
    Connect(Arc<io::Error>),

    /// Connecting a stream socket took too long.
    ConnectTimeout,

    /// Receiving a reply gave an error.
    Receive(Arc<io::Error>),

    /// Timeout waiting for a reply.
    ReceiveTimeout,

    /// The connection was closed in the middle of a reply.
    UnexpectedEndOfData,

    /// The reply is not a DNS message.
    MalformedReply(ParseError),

    /// A zone transfer ended before its closing SOA record.
    IncompleteTransfer {
        /// The number of messages received before the failure.
        received: usize,

        /// What ended the transfer.
        source: Box<Error>,
    },

    /// No name server produced a reply.
    ///
    /// Contains one entry per name server tried, in the order they were
    /// tried.
    AllNameserversFailed(Vec<Failure>),
}

impl Error {
    /// Returns the kind of error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Encode(_) => ErrorKind::Encode,
            Error::SocketCreate(_) => ErrorKind::SocketCreate,
            Error::Send(_) | Error::ShortSend | Error::SendTimeout => {
                ErrorKind::Send
            }
            Error::Connect(_) | Error::ConnectTimeout => ErrorKind::Connect,
            Error::Receive(_)
            | Error::ReceiveTimeout
            | Error::UnexpectedEndOfData
            | Error::MalformedReply(_) => ErrorKind::Receive,
            Error::IncompleteTransfer { .. } => ErrorKind::IncompleteTransfer,
            Error::AllNameserversFailed(_) => {
                ErrorKind::AllNameserversFailed
            }
        }
    }

    /// Returns whether the error is caused by an expired timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::SendTimeout | Error::ConnectTimeout | Error::ReceiveTimeout
        )
    }

    /// Returns the per-server failures if all servers failed.
    pub fn failures(&self) -> Option<&[Failure]> {
        match self {
            Error::AllNameserversFailed(failures) => {
                Some(failures.as_slice())
            }
            _ => None,
        }
    }

    /// Converts a receive error, sorting out timeouts.
    pub(crate) fn receive(err: io::Error) -> Self {
        if is_timeout(&err) {
            Error::ReceiveTimeout
        } else {
            Error::Receive(Arc::new(err))
        }
    }

    /// Converts a send error, sorting out timeouts.
    pub(crate) fn send(err: io::Error) -> Self {
        if is_timeout(&err) {
            Error::SendTimeout
        } else {
            Error::Send(Arc::new(err))
        }
    }

    /// Converts a connect error, sorting out timeouts.
    pub(crate) fn connect(err: io::Error) -> Self {
        if is_timeout(&err) {
            Error::ConnectTimeout
        } else {
            Error::Connect(Arc::new(err))
        }
    }
}

/// Returns whether an I/O error signals an expired socket timeout.
///
/// Depending on the platform, an expired read or write timeout on a
/// blocking socket is reported either as `WouldBlock` or `TimedOut`.
fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

impl From<EncodeError> for Error {
    fn from(err: EncodeError) -> Self {
        Error::Encode(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Error::Encode(err) => write!(f, "cannot encode query: {}", err),
            Error::SocketCreate(err) => {
                write!(f, "error creating socket: {}", err)
            }
            Error::Send(err) => write!(f, "error sending query: {}", err),
            Error::ShortSend => write!(f, "partial send of query"),
            Error::SendTimeout => write!(f, "timeout sending query"),
            Error::Connect(err) => write!(f, "error connecting: {}", err),
            Error::ConnectTimeout => write!(f, "timeout connecting"),
            Error::Receive(err) => {
                write!(f, "error receiving reply: {}", err)
            }
            Error::ReceiveTimeout => {
                write!(f, "timeout waiting for response")
            }
            Error::UnexpectedEndOfData => {
                write!(f, "unexpected end of data")
            }
            Error::MalformedReply(err) => {
                write!(f, "malformed reply: {}", err)
            }
            Error::IncompleteTransfer { received, source } => write!(
                f,
                "incomplete zone transfer after {} messages: {}",
                received, source
            ),
            Error::AllNameserversFailed(failures) => {
                write!(f, "all name servers failed")?;
                for failure in failures {
                    write!(f, "; {}", failure)?;
                }
                Ok(())
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Encode(e) => Some(e),
            Error::SocketCreate(e) => Some(e),
            Error::Send(e) => Some(e),
            Error::ShortSend => None,
            Error::SendTimeout => None,
            Error::Connect(e) => Some(e),
            Error::ConnectTimeout => None,
            Error::Receive(e) => Some(e),
            Error::ReceiveTimeout => None,
            Error::UnexpectedEndOfData => None,
            Error::MalformedReply(e) => Some(e),
            Error::IncompleteTransfer { source, .. } => Some(source.as_ref()),
            Error::AllNameserversFailed(_) => None,
        }
    }
}

//------------ ErrorKind -----------------------------------------------------

/// The broad category of an [`Error`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// The query could not be produced. Nothing was sent.
    Encode,

    /// A socket could not be created.
    SocketCreate,

    /// The query could not be sent completely.
    Send,

    /// A stream connection could not be established.
    Connect,

    /// No complete reply was received.
    Receive,

    /// A zone transfer ended prematurely.
    IncompleteTransfer,

    /// No name server produced a reply.
    AllNameserversFailed,
}

//------------ Failure -------------------------------------------------------

/// The failure of a query with a single name server.
#[derive(Clone, Debug)]
pub struct Failure {
    /// The address of the name server.
    addr: SocketAddr,

    /// The protocol of the failed exchange.
    protocol: Protocol,

    /// What went wrong.
    error: Error,
}

impl Failure {
    /// Creates a new failure.
    pub fn new(addr: SocketAddr, protocol: Protocol, error: Error) -> Self {
        Failure {
            addr,
            protocol,
            error,
        }
    }

    /// Returns the address of the name server that failed.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the protocol of the last exchange with the server.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Returns the error of the last exchange with the server.
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Returns the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(
            f,
            "{} via {}: {}",
            self.addr,
            self.protocol.as_str(),
            self.error
        )
    }
}

//============ Testing =======================================================
