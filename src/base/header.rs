//! The header of a DNS message.
//!
//! Each DNS message starts with a twelve octet long header section
//! containing some general information related to the message as well as
//! the number of records in each of the four sections that follow the header.
//! Its content and format are defined in section 4.1.1 of [RFC 1035].
//!
//! The transport only ever looks at a reply, it never changes one. The
//! [`Header`] type therefore is a read-only copy of the twelve octets taken
//! from the beginning of a message.
//!
//! [RFC 1035]: https://tools.ietf.org/html/rfc1035

use super::wire::ParseError;
use core::fmt;

//------------ Header --------------------------------------------------------

/// The header section of a DNS message.
///
/// The data is layed out like this:
///
/// ```text
///                                 1  1  1  1  1  1
///   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      ID                       |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |QR|   Opcode  |AA|TC|RD|RA|Z |AD|CD|   RCODE   |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    QDCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    ANCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    NSCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    ARCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
#[derive(Clone, Copy, Default, Eq, PartialEq)]
pub struct Header {
    /// The header octets in network byte order.
    inner: [u8; Header::LEN],
}

impl Header {
    /// The length of the header section in octets.
    pub const LEN: usize = 12;

    /// Copies the header from the beginning of a message.
    ///
    /// Returns an error if the message is shorter than the header section.
    pub fn for_message_slice(message: &[u8]) -> Result<Self, ParseError> {
        let mut inner = [0u8; Header::LEN];
        inner.copy_from_slice(
            message
                .get(..Header::LEN)
                .ok_or(ParseError::ShortInput)?,
        );
        Ok(Header { inner })
    }

    /// Returns the value of the ID field.
    pub fn id(self) -> u16 {
        self.get_u16(0)
    }

    /// Returns whether the QR bit is set, i.e., whether this is a response.
    pub fn qr(self) -> bool {
        self.get_bit(2, 7)
    }

    /// Returns the value of the Opcode field.
    pub fn opcode(self) -> u8 {
        (self.inner[2] >> 3) & 0x0F
    }

    /// Returns whether the AA bit is set.
    pub fn aa(self) -> bool {
        self.get_bit(2, 2)
    }

    /// Returns whether the TC bit is set.
    ///
    /// The truncation bit is set by a server if the answer did not fit
    /// into a datagram and the client should repeat the query over a
    /// stream transport.
    pub fn tc(self) -> bool {
        self.get_bit(2, 1)
    }

    /// Returns whether the RD bit is set.
    pub fn rd(self) -> bool {
        self.get_bit(2, 0)
    }

    /// Returns the value of the RCODE field.
    pub fn rcode(self) -> u8 {
        self.inner[3] & 0x0F
    }

    /// Returns the number of entries in the question section.
    pub fn qdcount(self) -> u16 {
        self.get_u16(4)
    }

    /// Returns the number of records in the answer section.
    pub fn ancount(self) -> u16 {
        self.get_u16(6)
    }

    /// Returns the number of records in the authority section.
    pub fn nscount(self) -> u16 {
        self.get_u16(8)
    }

    /// Returns the number of records in the additional section.
    pub fn arcount(self) -> u16 {
        self.get_u16(10)
    }

    fn get_u16(self, offset: usize) -> u16 {
        u16::from_be_bytes([self.inner[offset], self.inner[offset + 1]])
    }

    fn get_bit(self, offset: usize, bit: usize) -> bool {
        self.inner[offset] & (1 << bit) != 0
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Header")
            .field("id", &self.id())
            .field("qr", &self.qr())
            .field("opcode", &self.opcode())
            .field("tc", &self.tc())
            .field("rcode", &self.rcode())
            .field("qdcount", &self.qdcount())
            .field("ancount", &self.ancount())
            .field("nscount", &self.nscount())
            .field("arcount", &self.arcount())
            .finish()
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flags_and_counts() {
        let msg = [
            0x12, 0x34, 0b1000_0011, 0x03, 0, 1, 0, 2, 0, 3, 0, 4, 0xff,
        ];
        let header = Header::for_message_slice(&msg).unwrap();
        assert_eq!(header.id(), 0x1234);
        assert!(header.qr());
        assert_eq!(header.opcode(), 0);
        assert!(!header.aa());
        assert!(header.tc());
        assert!(header.rd());
        assert_eq!(header.rcode(), 3);
        assert_eq!(header.qdcount(), 1);
        assert_eq!(header.ancount(), 2);
        assert_eq!(header.nscount(), 3);
        assert_eq!(header.arcount(), 4);
    }

    #[test]
    fn opcode_bits() {
        // Opcode NOTIFY (4) with AA set.
        let msg = [0, 0, 0b0010_0100, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let header = Header::for_message_slice(&msg).unwrap();
        assert_eq!(header.opcode(), 4);
        assert!(header.aa());
        assert!(!header.tc());
    }

    #[test]
    fn short_message() {
        assert_eq!(
            Header::for_message_slice(&[0; 11]),
            Err(ParseError::ShortInput)
        );
    }
}
