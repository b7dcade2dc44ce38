//! Sending and receiving DNS messages.
//!
//! Currently, the module only provides the [`client`] sub-module for sending
//! queries to name servers and receiving the replies.

pub mod client;
