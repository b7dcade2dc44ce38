//! Basics.
//!
//! This module provides the little knowledge of DNS data the transport
//! needs. Messages are handled as opaque octet sequences everywhere else in
//! the crate. Only the [header] and, for zone transfers, the record types
//! are ever looked at, using the read-only helpers in [wire].

pub use self::header::Header;
pub use self::iana::Rtype;
pub use self::wire::ParseError;

pub mod header;
pub mod iana;
pub mod wire;
