//! Sending a query to a list of name servers.
//!
//! The [`Dispatcher`] tries the name servers of a [`ServerList`] one after
//! another until one of them produces a reply. For each server, the query
//! is first sent over UDP unless the policy asks for TCP only. A truncated
//! UDP reply is followed up with a TCP exchange with the same server. A
//! failure with a server moves on to the next one.
//!
//! The first successful reply ends the process. If all servers fail, the
//! result is an [`Error::AllNameserversFailed`] listing what went wrong
//! with each of them.
//!
//! Zone transfers are different: they always use TCP and produce a
//! sequence of messages. [`Dispatcher::transfer`] returns an
//! [`AxfrStream`] for the first server that starts sending the zone.
//! [`Dispatcher::dispatch`] picks the right one of the two by looking at
//! the question of the query.

use super::axfr::{self, AxfrStream};
use super::conf::{ExchangePolicy, Protocol, ServerList};
use super::error::{Error, Failure};
use super::reply::Reply;
use super::request::ComposeQuery;
use super::{tcp, udp};
use crate::base::wire::is_axfr_request;
use std::io::Read;
use std::net::{SocketAddr, TcpStream};
use std::vec::Vec;
use tracing::{debug, trace, warn};

//------------ Exchange ------------------------------------------------------

/// The exchanges a dispatcher can perform with a single name server.
///
/// [`NetExchange`] performs them over actual sockets.
pub trait Exchange {
    /// The connection type zone transfers are read from.
    type Stream: Read;

    /// Exchanges a query and reply over UDP.
    fn udp(
        &self,
        addr: SocketAddr,
        query: &[u8],
        policy: &ExchangePolicy,
    ) -> Result<Reply, Error>;

    /// Exchanges a query and reply over TCP.
    fn tcp(
        &self,
        addr: SocketAddr,
        query: &[u8],
        policy: &ExchangePolicy,
    ) -> Result<Reply, Error>;

    /// Starts a zone transfer.
    fn axfr(
        &self,
        addr: SocketAddr,
        query: &[u8],
        policy: &ExchangePolicy,
    ) -> Result<AxfrStream<Self::Stream>, Error>;
}

//------------ NetExchange ---------------------------------------------------

/// Exchanges over operating system sockets.
#[derive(Clone, Copy, Debug, Default)]
pub struct NetExchange;

impl Exchange for NetExchange {
    type Stream = TcpStream;

    fn udp(
        &self,
        addr: SocketAddr,
        query: &[u8],
        policy: &ExchangePolicy,
    ) -> Result<Reply, Error> {
        udp::exchange(addr, query, policy)
    }

    fn tcp(
        &self,
        addr: SocketAddr,
        query: &[u8],
        policy: &ExchangePolicy,
    ) -> Result<Reply, Error> {
        tcp::exchange(addr, query, policy)
    }

    fn axfr(
        &self,
        addr: SocketAddr,
        query: &[u8],
        policy: &ExchangePolicy,
    ) -> Result<AxfrStream<TcpStream>, Error> {
        axfr::connect(addr, query, policy)
    }
}

//------------ Dispatcher ----------------------------------------------------

/// Delivers queries to the first name server that answers.
///
/// A dispatcher only holds its configuration. It can be shared between
/// threads that each send their own queries.
#[derive(Clone, Debug)]
pub struct Dispatcher<X = NetExchange> {
    /// The name servers in the order they are tried.
    servers: ServerList,

    /// How to talk to each server.
    policy: ExchangePolicy,

    /// Performs the actual exchanges.
    exchange: X,
}

impl Dispatcher {
    /// Creates a dispatcher using operating system sockets.
    pub fn new(servers: ServerList, policy: ExchangePolicy) -> Self {
        Self::with_exchange(servers, policy, NetExchange)
    }
}

impl<X: Exchange> Dispatcher<X> {
    /// Creates a dispatcher using the given exchanges.
    pub fn with_exchange(
        servers: ServerList,
        policy: ExchangePolicy,
        exchange: X,
    ) -> Self {
        Dispatcher {
            servers,
            policy,
            exchange,
        }
    }

    /// Returns the name servers.
    pub fn servers(&self) -> &ServerList {
        &self.servers
    }

    /// Returns the exchange policy.
    pub fn policy(&self) -> &ExchangePolicy {
        &self.policy
    }

    /// Sends a query, returning a single reply or a zone transfer.
    ///
    /// If the first question of the query asks for a zone transfer, the
    /// result is that of [`transfer`][Self::transfer], otherwise that of
    /// [`send`][Self::send].
    pub fn dispatch<Q: ComposeQuery + ?Sized>(
        &self,
        query: &Q,
    ) -> Result<Answer<X::Stream>, Error> {
        let query = query.to_query()?;
        if is_axfr_request(&query) {
            self.transfer_query(&query).map(Answer::Transfer)
        } else {
            self.send_query(&query).map(Answer::Single)
        }
    }

    /// Sends a query and returns the first reply.
    ///
    /// The query is sent as a regular query even if it asks for a zone
    /// transfer.
    pub fn send<Q: ComposeQuery + ?Sized>(
        &self,
        query: &Q,
    ) -> Result<Reply, Error> {
        let query = query.to_query()?;
        self.send_query(&query)
    }

    /// Starts a zone transfer with the first server that accepts it.
    pub fn transfer<Q: ComposeQuery + ?Sized>(
        &self,
        query: &Q,
    ) -> Result<AxfrStream<X::Stream>, Error> {
        let query = query.to_query()?;
        self.transfer_query(&query)
    }

    /// Runs the state machine for a regular query.
    fn send_query(&self, query: &[u8]) -> Result<Reply, Error> {
        let mut servers = self.servers.iter();
        let mut failures = Vec::new();
        let mut state = State::TryNext;
        loop {
            state = match state {
                State::TryNext => match servers.next() {
                    Some(addr) => State::Attempt(*addr),
                    None => {
                        warn!(
                            servers = self.servers.len(),
                            "all name servers failed"
                        );
                        return Err(Error::AllNameserversFailed(failures));
                    }
                },
                State::Attempt(addr) => {
                    match self.attempt(addr, query, &mut failures) {
                        Some(reply) => {
                            if reply.protocol() == Protocol::Udp
                                && reply.is_truncated()
                                && !self.policy.ign_tc()
                            {
                                debug!(%addr, "truncated reply, trying TCP");
                                State::TcpFallback(addr)
                            } else {
                                State::Done(reply)
                            }
                        }
                        None => State::TryNext,
                    }
                }
                State::TcpFallback(addr) => {
                    match self.exchange.tcp(addr, query, &self.policy) {
                        Ok(reply) => State::Done(reply),
                        Err(err) => {
                            debug!(%addr, "TCP fallback failed: {}", err);
                            failures.push(Failure::new(
                                addr,
                                Protocol::Tcp,
                                err,
                            ));
                            State::TryNext
                        }
                    }
                }
                State::Done(reply) => {
                    trace!(
                        addr = %reply.addr(),
                        protocol = reply.protocol().as_str(),
                        "reply received"
                    );
                    return Ok(reply);
                }
            }
        }
    }

    /// Tries the first protocol with a server.
    ///
    /// Over UDP, the exchange is repeated up to the configured number of
    /// attempts as long as no reply is received. Returns `None` and records
    /// the last failure if there still is no reply.
    fn attempt(
        &self,
        addr: SocketAddr,
        query: &[u8],
        failures: &mut Vec<Failure>,
    ) -> Option<Reply> {
        let protocol = self.policy.protocol();
        let mut attempt = 1;
        let res = loop {
            let res = match protocol {
                Protocol::Udp => self.exchange.udp(addr, query, &self.policy),
                Protocol::Tcp => self.exchange.tcp(addr, query, &self.policy),
            };
            match res {
                Err(ref err)
                    if protocol == Protocol::Udp
                        && err.kind() == super::error::ErrorKind::Receive
                        && attempt < self.policy.attempts() =>
                {
                    debug!(%addr, attempt, "no reply, retrying: {}", err);
                    attempt += 1;
                }
                res => break res,
            }
        };
        match res {
            Ok(reply) => Some(reply),
            Err(err) => {
                debug!(
                    %addr,
                    protocol = protocol.as_str(),
                    "exchange failed: {}",
                    err
                );
                failures.push(Failure::new(addr, protocol, err));
                None
            }
        }
    }

    /// Tries the servers in turn until one starts a zone transfer.
    fn transfer_query(
        &self,
        query: &[u8],
    ) -> Result<AxfrStream<X::Stream>, Error> {
        let mut failures = Vec::new();
        for &addr in &self.servers {
            let res = self
                .exchange
                .axfr(addr, query, &self.policy)
                .and_then(|mut stream| stream.prime().map(|_| stream));
            match res {
                Ok(stream) => return Ok(stream),
                Err(err) => {
                    debug!(%addr, "zone transfer failed: {}", err);
                    failures.push(Failure::new(addr, Protocol::Tcp, err));
                }
            }
        }
        warn!(servers = self.servers.len(), "all name servers failed");
        Err(Error::AllNameserversFailed(failures))
    }
}

//------------ State ---------------------------------------------------------

/// The state of a query.
enum State {
    /// Pick the next server to try.
    TryNext,

    /// Try the first protocol with a server.
    Attempt(SocketAddr),

    /// Try TCP with a server that sent a truncated UDP reply.
    TcpFallback(SocketAddr),

    /// A reply has been received.
    Done(Reply),
}

//------------ Answer --------------------------------------------------------

/// The result of dispatching a query.
#[derive(Debug)]
pub enum Answer<S = TcpStream> {
    /// The reply to a regular query.
    Single(Reply),

    /// The messages of a zone transfer.
    Transfer(AxfrStream<S>),
}

impl<S> Answer<S> {
    /// Returns the reply if this is the answer to a regular query.
    pub fn into_single(self) -> Option<Reply> {
        match self {
            Answer::Single(reply) => Some(reply),
            Answer::Transfer(_) => None,
        }
    }

    /// Returns the stream if this is the answer to a zone transfer query.
    pub fn into_transfer(self) -> Option<AxfrStream<S>> {
        match self {
            Answer::Single(_) => None,
            Answer::Transfer(stream) => Some(stream),
        }
    }
}

//============ Testing =======================================================
