//! A blocking DNS transport for Rust.
//!
//! This crate sends DNS queries that are already encoded in wire format to
//! name servers and hands back the raw replies. It speaks DNS over UDP and
//! TCP as well as full zone transfers over TCP, and it can work through a
//! list of name servers until one of them answers.
//!
//! The crate does not build or interpret DNS messages beyond what is
//! necessary for transport. It only looks at the header of a reply to learn
//! whether it was truncated and, for zone transfers, at the types of the
//! answer records to learn when the transfer is complete.
//!
//! # Modules
//!
//! * [base] contains the little bit of DNS wire format the transports
//!   need: the message [header][base::Header], [record
//!   types][base::Rtype], and helpers for skipping over the question and
//!   answer sections, and
//! * [net] contains the transports themselves.
//!
//! Most users will want to start with the
//! [`Dispatcher`][net::client::Dispatcher].
//!
//! # Logging
//!
//! The crate reports what it is doing via the [tracing] crate. Failed
//! exchanges are logged at debug level. Individual messages sent and
//! received are logged at trace level.
#![allow(renamed_and_removed_lints)]
#![allow(clippy::unknown_clippy_lints)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod base;
pub mod net;

pub use self::net::client::{Dispatcher, Error, ExchangePolicy, ServerList};
