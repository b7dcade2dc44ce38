//! IANA Definitions for DNS.
//!
//! This module contains enums for parameters defined in IANA registries
//! that are relevant for this crate.

pub use self::rtype::Rtype;

pub mod rtype;
