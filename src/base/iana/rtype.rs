//! Resource Record (RR) TYPEs

use core::fmt;

//------------ Rtype ---------------------------------------------------------

/// Resource Record Types.
///
/// Each resource records has a 16 bit type value indicating what kind of
/// information is represented by the record. A query includes the type of
/// record information is requested for. A few aditional types, called query
/// types, are defined as well and can only be used in questions.
///
/// The transport only needs to recognise the handful of types that change
/// how a message is delivered. All other values are carried through as is.
///
/// The currently assigned values are maintained in an [IANA registry].
///
/// [IANA registry]: http://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-4
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Rtype(u16);

impl Rtype {
    /// A host address.
    pub const A: Rtype = Rtype(1);

    /// Marks the start of a zone of authority.
    pub const SOA: Rtype = Rtype(6);

    /// An IPv6 host address.
    pub const AAAA: Rtype = Rtype(28);

    /// Incremental transfer.
    pub const IXFR: Rtype = Rtype(251);

    /// A request for a transfer of an entire zone.
    pub const AXFR: Rtype = Rtype(252);

    /// Creates a record type from its integer value.
    pub const fn from_int(value: u16) -> Self {
        Rtype(value)
    }

    /// Returns the integer value of the record type.
    pub const fn to_int(self) -> u16 {
        self.0
    }

    /// Returns the mnemonic for the record type if there is one we know.
    pub fn to_mnemonic(self) -> Option<&'static str> {
        match self {
            Rtype::A => Some("A"),
            Rtype::SOA => Some("SOA"),
            Rtype::AAAA => Some("AAAA"),
            Rtype::IXFR => Some("IXFR"),
            Rtype::AXFR => Some("AXFR"),
            _ => None,
        }
    }
}

impl From<u16> for Rtype {
    fn from(value: u16) -> Self {
        Rtype::from_int(value)
    }
}

impl From<Rtype> for u16 {
    fn from(value: Rtype) -> Self {
        value.to_int()
    }
}

//--- Display and Debug

impl fmt::Display for Rtype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_mnemonic() {
            Some(m) => f.write_str(m),
            None => write!(f, "TYPE{}", self.0),
        }
    }
}

impl fmt::Debug for Rtype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Rtype::{}", self)
    }
}

//============ Testing =======================================================
