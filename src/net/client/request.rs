//! Producing the wire-format query to send.
//!
//! Building DNS messages is not the business of the transport. All it needs
//! is the finished message as an octet sequence. The [`ComposeQuery`] trait
//! is the point where a message encoder hands that over. Any failure to do
//! so is reported as an [`EncodeError`] before a single socket is opened.

use super::conf::MIN_MESSAGE_SIZE;
use bytes::{Bytes, BytesMut};
use std::error;
use std::fmt;
use std::sync::Arc;
use std::vec::Vec;

//------------ ComposeQuery --------------------------------------------------

/// A type that can produce a query message in wire format.
///
/// The trait is implemented for the common octet sequence types, which are
/// taken to already contain a wire-format message. For these, the message
/// is only checked for a plausible length: it has to contain at least the
/// header and has to fit into the two octet length prefix of stream
/// transports.
pub trait ComposeQuery {
    /// Returns the query message in wire format.
    fn to_query(&self) -> Result<Bytes, EncodeError>;
}

impl ComposeQuery for [u8] {
    fn to_query(&self) -> Result<Bytes, EncodeError> {
        check_message_len(self.len())?;
        Ok(Bytes::copy_from_slice(self))
    }
}

impl<const N: usize> ComposeQuery for [u8; N] {
    fn to_query(&self) -> Result<Bytes, EncodeError> {
        self.as_slice().to_query()
    }
}

impl ComposeQuery for Vec<u8> {
    fn to_query(&self) -> Result<Bytes, EncodeError> {
        self.as_slice().to_query()
    }
}

impl ComposeQuery for Bytes {
    fn to_query(&self) -> Result<Bytes, EncodeError> {
        check_message_len(self.len())?;
        Ok(self.clone())
    }
}

impl ComposeQuery for BytesMut {
    fn to_query(&self) -> Result<Bytes, EncodeError> {
        self.as_ref().to_query()
    }
}

impl<T: ComposeQuery + ?Sized> ComposeQuery for &T {
    fn to_query(&self) -> Result<Bytes, EncodeError> {
        (**self).to_query()
    }
}

/// Checks that a message of `len` octets can be sent over any transport.
fn check_message_len(len: usize) -> Result<(), EncodeError> {
    if len < MIN_MESSAGE_SIZE {
        Err(EncodeError::ShortMessage)
    } else if len > usize::from(u16::MAX) {
        Err(EncodeError::LongMessage)
    } else {
        Ok(())
    }
}

//------------ EncodeError ---------------------------------------------------

/// Producing the wire-format query failed.
#[derive(Clone, Debug)]
pub enum EncodeError {
    /// The message is shorter than a DNS header.
    ShortMessage,

    /// The message does not fit into 65535 octets.
    LongMessage,

    /// The encoder failed.
    Compose(Arc<dyn error::Error + Send + Sync>),
}

impl EncodeError {
    /// Wraps an error of an external message encoder.
    pub fn compose(err: impl error::Error + Send + Sync + 'static) -> Self {
        EncodeError::Compose(Arc::new(err))
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EncodeError::ShortMessage => {
                write!(f, "octet sequence too short to be a valid message")
            }
            EncodeError::LongMessage => {
                write!(f, "message exceeds 65535 octets")
            }
            EncodeError::Compose(err) => {
                write!(f, "composing the message failed: {}", err)
            }
        }
    }
}

impl error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            EncodeError::ShortMessage => None,
            EncodeError::LongMessage => None,
            EncodeError::Compose(err) => Some(err.as_ref()),
        }
    }
}

//============ Testing =======================================================
