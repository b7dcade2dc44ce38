//! Sending queries and receiving replies.
//!
//! This module provides blocking DNS transports that send a query message
//! to a name server and receive the reply. All of them use the operating
//! system’s sockets directly and return only once the exchange has finished
//! or failed.
//!
//! There are three transports for a single name server:
//!
//! * [udp] sends the query in a single datagram and waits for a single
//!   reply datagram,
//! * [tcp] opens a connection, sends the query prefixed with its length,
//!   and reads the length-prefixed reply, and
//! * [axfr] starts a zone transfer over TCP and returns the reply messages
//!   one by one via an iterator.
//!
//! The [dispatcher] combines these transports for a list of name servers.
//! It tries the servers one after another until it receives a reply,
//! switching to TCP if a UDP reply was truncated.
//!
//! # Sending a query
//!
//! Queries are handed to the transports as complete messages in wire
//! format. Anything implementing [ComposeQuery][request::ComposeQuery] can
//! be used. This includes octet slices, vectors, and [`bytes::Bytes`].
//!
//! ```no_run
//! use domain_send::net::client::conf::{ExchangePolicy, ServerList};
//! use domain_send::net::client::dispatcher::Dispatcher;
//! use std::net::Ipv4Addr;
//! use std::time::Duration;
//!
//! # fn query() -> Vec<u8> { vec![0; 12] }
//! let servers = ServerList::from_ips(
//!     [Ipv4Addr::new(192, 0, 2, 1).into(), Ipv4Addr::new(192, 0, 2, 2).into()],
//!     53,
//! );
//! let mut policy = ExchangePolicy::new();
//! policy.set_timeout(Duration::from_secs(2));
//!
//! let dispatcher = Dispatcher::new(servers, policy);
//! match dispatcher.send(&query()) {
//!     Ok(reply) => println!("{} octets from {}", reply.len(), reply.addr()),
//!     Err(err) => eprintln!("query failed: {}", err),
//! }
//! ```
//!
//! # Errors
//!
//! All transports report failure through the same [Error][error::Error]
//! type. Its [kind][error::Error::kind] tells in which phase of the
//! exchange things went wrong. If the dispatcher runs out of name servers,
//! the error lists the failure for each of them.
#![warn(missing_docs)]

pub mod axfr;
pub mod conf;
pub mod dispatcher;
pub mod error;
pub mod reply;
pub mod request;
pub mod tcp;
pub mod udp;

pub use self::conf::{ExchangePolicy, Protocol, ServerList};
pub use self::dispatcher::{Answer, Dispatcher};
pub use self::error::{Error, ErrorKind};
pub use self::reply::Reply;
