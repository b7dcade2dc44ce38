//! Transport configuration.
//!
//! There are two parts to this module: the [`ExchangePolicy`] that
//! determines how a single query is delivered to each name server, and the
//! [`ServerList`] containing the name servers in the order they are tried.
//!
//! Reading these from the system’s configuration is left to the caller.
//! Both are plain values that are never modified while a query is running.

use core::cmp;
use std::net::{IpAddr, SocketAddr};
use std::slice;
use std::time::Duration;
use std::vec::Vec;

//------------ Configuration Constants ---------------------------------------

/// The port name servers are listening on unless told otherwise.
pub const DEFAULT_PORT: u16 = 53;

/// The size of a UDP reply without EDNS.
///
/// This is the limit of RFC 1035, section 2.3.4.
pub const MIN_UDP_PAYLOAD_SIZE: u16 = 512;

/// The length of the smallest possible DNS message, i.e., just a header.
pub const MIN_MESSAGE_SIZE: usize = 12;

/// Configuration limits for the per-attempt timeout.
const TIMEOUT: DefMinMax<Duration> = DefMinMax::new(
    Duration::from_secs(5),
    Duration::from_millis(1),
    Duration::from_secs(60),
);

/// Configuration limits for the number of UDP attempts per server.
const ATTEMPTS: DefMinMax<u8> = DefMinMax::new(1, 1, 10);

/// Configuration limits for the UDP receive buffer.
///
/// The default applies to queries without EDNS.
const UDP_PAYLOAD_SIZE: DefMinMax<u16> =
    DefMinMax::new(MIN_UDP_PAYLOAD_SIZE, MIN_UDP_PAYLOAD_SIZE, u16::MAX);

//------------ Protocol ------------------------------------------------------

/// The transport protocol used for an exchange.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Protocol {
    /// UDP, falling back to TCP for truncated replies.
    #[default]
    Udp,

    /// TCP only.
    Tcp,
}

impl Protocol {
    /// Returns the name of the protocol for diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Udp => "UDP",
            Protocol::Tcp => "TCP",
        }
    }
}

//------------ ExchangePolicy ------------------------------------------------

/// How a query is delivered to a single name server.
///
/// Values that are out of range are capped by the setters. The defaults
/// are a timeout of five seconds, a single UDP attempt, no EDNS, starting
/// with UDP, and retrying truncated answers over TCP.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "PolicyConf"))]
pub struct ExchangePolicy {
    /// Time allowed for a single attempt.
    timeout: Duration,

    /// Number of UDP attempts per name server.
    attempts: u8,

    /// EDNS UDP payload size advertised by the query, if any.
    udp_payload_size: Option<u16>,

    /// The protocol to start with.
    protocol: Protocol,

    /// Accept truncated answers rather than retrying over TCP.
    ign_tc: bool,
}

impl ExchangePolicy {
    /// Creates a new policy with default values.
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns the per-attempt timeout.
    ///
    /// The timeout starts right before the query is sent or, for TCP,
    /// before the connection is being established. Once it expires, the
    /// attempt has failed.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sets the per-attempt timeout.
    ///
    /// If this value is too small or too large, it will be caped.
    pub fn set_timeout(&mut self, value: Duration) {
        self.timeout = TIMEOUT.limit(value)
    }

    /// Returns the number of UDP attempts made with each name server.
    ///
    /// Only failures to receive a reply are retried.
    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    /// Sets the number of UDP attempts per name server.
    ///
    /// If this value is too small or too large, it will be caped.
    pub fn set_attempts(&mut self, value: u8) {
        self.attempts = ATTEMPTS.limit(value)
    }

    /// Returns the EDNS UDP payload size.
    pub fn udp_payload_size(&self) -> Option<u16> {
        self.udp_payload_size
    }

    /// Sets the EDNS UDP payload size.
    ///
    /// This should be the value the query advertises in its OPT record.
    /// Values smaller than 512 are raised to 512. Use `None` for queries
    /// without EDNS.
    pub fn set_udp_payload_size(&mut self, value: Option<u16>) {
        self.udp_payload_size = value.map(|size| UDP_PAYLOAD_SIZE.limit(size))
    }

    /// Returns the size of the receive buffer for UDP replies.
    pub fn udp_recv_size(&self) -> usize {
        usize::from(
            self.udp_payload_size
                .unwrap_or_else(|| UDP_PAYLOAD_SIZE.default()),
        )
    }

    /// Returns the protocol used for the first attempt.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Sets the protocol used for the first attempt.
    pub fn set_protocol(&mut self, value: Protocol) {
        self.protocol = value
    }

    /// Returns whether truncated answers are accepted as is.
    pub fn ign_tc(&self) -> bool {
        self.ign_tc
    }

    /// Sets whether truncated answers are accepted as is.
    pub fn set_ign_tc(&mut self, value: bool) {
        self.ign_tc = value
    }
}

impl Default for ExchangePolicy {
    fn default() -> Self {
        Self {
            timeout: TIMEOUT.default(),
            attempts: ATTEMPTS.default(),
            udp_payload_size: None,
            protocol: Protocol::Udp,
            ign_tc: false,
        }
    }
}

//------------ PolicyConf ----------------------------------------------------

/// The exchange policy as it appears in configuration files.
///
/// Deserialized values are passed through the setters of
/// [`ExchangePolicy`] so that they end up within their limits.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(default)]
struct PolicyConf {
    timeout: Duration,
    attempts: u8,
    udp_payload_size: Option<u16>,
    protocol: Protocol,
    ign_tc: bool,
}

#[cfg(feature = "serde")]
impl Default for PolicyConf {
    fn default() -> Self {
        let policy = ExchangePolicy::default();
        PolicyConf {
            timeout: policy.timeout,
            attempts: policy.attempts,
            udp_payload_size: policy.udp_payload_size,
            protocol: policy.protocol,
            ign_tc: policy.ign_tc,
        }
    }
}

#[cfg(feature = "serde")]
impl From<PolicyConf> for ExchangePolicy {
    fn from(conf: PolicyConf) -> Self {
        let mut res = ExchangePolicy::new();
        res.set_timeout(conf.timeout);
        res.set_attempts(conf.attempts);
        res.set_udp_payload_size(conf.udp_payload_size);
        res.set_protocol(conf.protocol);
        res.set_ign_tc(conf.ign_tc);
        res
    }
}

//------------ ServerList ----------------------------------------------------

/// The name servers to send a query to.
///
/// Servers are tried in the order they were added. Adding a server twice
/// is allowed and results in it being tried twice.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ServerList {
    /// The server addresses.
    servers: Vec<SocketAddr>,
}

impl ServerList {
    /// Creates a new, empty list.
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a list from IP addresses, all using the same port.
    pub fn from_ips(
        addrs: impl IntoIterator<Item = IpAddr>,
        port: u16,
    ) -> Self {
        addrs
            .into_iter()
            .map(|addr| SocketAddr::new(addr, port))
            .collect()
    }

    /// Appends a server.
    pub fn push(&mut self, addr: SocketAddr) {
        self.servers.push(addr)
    }

    /// Appends a server listening on the default port.
    pub fn push_ip(&mut self, addr: IpAddr) {
        self.push(SocketAddr::new(addr, DEFAULT_PORT))
    }

    /// Returns the number of servers in the list.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Returns whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Returns an iterator over the servers in try order.
    pub fn iter(&self) -> slice::Iter<'_, SocketAddr> {
        self.servers.iter()
    }

    /// Returns the servers as a slice.
    pub fn as_slice(&self) -> &[SocketAddr] {
        self.servers.as_slice()
    }
}

impl From<Vec<SocketAddr>> for ServerList {
    fn from(servers: Vec<SocketAddr>) -> Self {
        ServerList { servers }
    }
}

impl FromIterator<SocketAddr> for ServerList {
    fn from_iter<I: IntoIterator<Item = SocketAddr>>(iter: I) -> Self {
        ServerList {
            servers: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ServerList {
    type Item = &'a SocketAddr;
    type IntoIter = slice::Iter<'a, SocketAddr>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//------------ DefMinMax -----------------------------------------------------

/// The default, minimum, and maximum values for a config variable.
#[derive(Clone, Copy)]
struct DefMinMax<T> {
    /// The default value,
    def: T,

    /// The minimum value,
    min: T,

    /// The maximum value,
    max: T,
}

impl<T> DefMinMax<T> {
    /// Creates a new value.
    const fn new(def: T, min: T, max: T) -> Self {
        Self { def, min, max }
    }

    /// Returns the default value.
    fn default(self) -> T {
        self.def
    }

    /// Trims the given value to fit into the minimum/maximum range.
    fn limit(self, value: T) -> T
    where
        T: Ord,
    {
        cmp::max(self.min, cmp::min(self.max, value))
    }
}

//============ Testing =======================================================
