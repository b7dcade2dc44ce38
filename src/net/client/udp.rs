//! A DNS over UDP exchange.
//!
//! An exchange sends a single query datagram to a single name server and
//! waits for a single reply datagram. A new socket is used for every
//! exchange. It is bound to a random local port and connected to the
//! server, so that datagrams from other sources are dropped by the
//! operating system.
//!
//! Whether the reply was truncated is reported via
//! [`Reply::is_truncated`]. Deciding what to do about that is left to the
//! caller.

use super::conf::{ExchangePolicy, Protocol};
use super::error::Error;
use super::reply::Reply;
use bytes::BytesMut;
use rand::Rng;
use socket2::{Domain, Socket, Type};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

//------------ Module Configuration ------------------------------------------

/// How many times do we try a new random port if we get ‘address in use.’
const RETRY_RANDOM_PORT: usize = 10;

/// The lowest local port picked at random.
const MIN_RANDOM_PORT: u16 = 1024;

//------------ exchange ------------------------------------------------------

/// Sends a query to a name server and waits for the reply.
///
/// The whole exchange, from sending the query to receiving the reply, has
/// to finish within the policy’s timeout. The reply is received into a
/// buffer of [`ExchangePolicy::udp_recv_size`] octets. Longer datagrams are
/// cut short by the operating system.
///
/// The socket is closed before the function returns.
pub fn exchange(
    addr: SocketAddr,
    query: &[u8],
    policy: &ExchangePolicy,
) -> Result<Reply, Error> {
    let sock = bind(addr)?;
    sock.connect(addr).map_err(|err| Error::SocketCreate(Arc::new(err)))?;

    let start = Instant::now();
    let deadline = start + policy.timeout();

    let sent = sock.send(query).map_err(Error::send)?;
    if sent != query.len() {
        debug!(%addr, sent, len = query.len(), "short UDP send");
        return Err(Error::ShortSend);
    }
    trace!(%addr, len = sent, "UDP query sent");

    let mut buf = BytesMut::zeroed(policy.udp_recv_size());
    let len = loop {
        let remain = deadline.saturating_duration_since(Instant::now());
        if remain.is_zero() {
            return Err(Error::ReceiveTimeout);
        }
        sock.set_read_timeout(Some(remain))
            .map_err(|err| Error::Receive(Arc::new(err)))?;
        match sock.recv(&mut buf) {
            Ok(len) => break len,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                debug!(%addr, "UDP receive failed: {}", err);
                return Err(Error::receive(err));
            }
        }
    };
    buf.truncate(len);

    let reply =
        Reply::new(buf.freeze(), addr, Protocol::Udp, start.elapsed())?;
    trace!(
        %addr,
        len,
        tc = reply.is_truncated(),
        elapsed = ?reply.elapsed(),
        "UDP reply received"
    );
    Ok(reply)
}

//------------ bind ----------------------------------------------------------

/// Creates a UDP socket suitable for talking to `addr`.
///
/// The socket’s address family follows that of `addr`. It is bound to the
/// unspecified address and a random port. If that port is taken, a few more
/// are tried before leaving the choice to the operating system.
fn bind(addr: SocketAddr) -> Result<UdpSocket, Error> {
    let sock = Socket::new(
        Domain::for_address(addr),
        Type::DGRAM,
        Some(socket2::Protocol::UDP),
    )
    .map_err(|err| Error::SocketCreate(Arc::new(err)))?;

    let mut rng = rand::thread_rng();
    let mut i = 0;
    loop {
        let port = if i < RETRY_RANDOM_PORT {
            rng.gen_range(MIN_RANDOM_PORT..=u16::MAX)
        } else {
            0
        };
        let local = SocketAddr::new(unspecified(addr), port);
        match sock.bind(&local.into()) {
            Ok(()) => return Ok(sock.into()),
            Err(err)
                if err.kind() == io::ErrorKind::AddrInUse
                    && i < RETRY_RANDOM_PORT =>
            {
                i += 1;
            }
            Err(err) => return Err(Error::SocketCreate(Arc::new(err))),
        }
    }
}

/// Returns the unspecified address of the same family as `addr`.
fn unspecified(addr: SocketAddr) -> IpAddr {
    match addr {
        SocketAddr::V4(_) => Ipv4Addr::UNSPECIFIED.into(),
        SocketAddr::V6(_) => Ipv6Addr::UNSPECIFIED.into(),
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn policy(timeout: Duration) -> ExchangePolicy {
        let mut res = ExchangePolicy::new();
        res.set_timeout(timeout);
        res
    }

    #[test]
    fn bind_matches_family() {
        let v4 = bind("127.0.0.1:53".parse().unwrap()).unwrap();
        assert!(v4.local_addr().unwrap().is_ipv4());
        assert_ne!(v4.local_addr().unwrap().port(), 0);
    }

    #[test]
    fn bind_matches_family_v6() {
        // Skip on hosts without IPv6.
        if UdpSocket::bind("[::1]:0").is_err() {
            return;
        }
        let v6 = bind("[::1]:53".parse().unwrap()).unwrap();
        assert!(v6.local_addr().unwrap().is_ipv6());
        assert_ne!(v6.local_addr().unwrap().port(), 0);
    }

    #[test]
    fn exchange_over_ipv6() {
        let server = match UdpSocket::bind("[::1]:0") {
            Ok(server) => server,
            Err(_) => return,
        };
        let addr = server.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let mut buf = [0u8; 512];
            let (len, peer) = server.recv_from(&mut buf).unwrap();
            assert!(peer.is_ipv6());
            server.send_to(&buf[..len], peer).unwrap();
        });
        let reply =
            exchange(addr, &[0u8; 12], &policy(Duration::from_secs(2)))
                .unwrap();
        handle.join().unwrap();
        assert_eq!(reply.addr(), addr);
        assert_eq!(reply.len(), 12);
    }

    #[test]
    fn reply_is_cut_to_received_length() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let mut buf = [0u8; 512];
            let (len, peer) = server.recv_from(&mut buf).unwrap();
            let mut reply = buf[..len].to_vec();
            reply[2] |= 0x80;
            server.send_to(&reply, peer).unwrap();
        });

        let query = [0x12, 0x34, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff];
        let reply =
            exchange(addr, &query, &policy(Duration::from_secs(2))).unwrap();
        handle.join().unwrap();
        assert_eq!(reply.len(), query.len());
        assert_eq!(reply.header().id(), 0x1234);
        assert!(reply.header().qr());
        assert!(!reply.is_truncated());
        assert_eq!(reply.protocol(), Protocol::Udp);
        assert_eq!(reply.addr(), addr);
    }

    #[test]
    fn silent_server_times_out() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();
        let start = Instant::now();
        let err = exchange(
            addr,
            &[0u8; 12],
            &policy(Duration::from_millis(100)),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ReceiveTimeout));
        assert!(start.elapsed() >= Duration::from_millis(100));
        drop(server);
    }

    #[test]
    fn short_datagram_is_malformed() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let mut buf = [0u8; 512];
            let (_, peer) = server.recv_from(&mut buf).unwrap();
            server.send_to(&[], peer).unwrap();
        });
        let err = exchange(addr, &[0u8; 12], &policy(Duration::from_secs(2)))
            .unwrap_err();
        handle.join().unwrap();
        assert!(matches!(err, Error::MalformedReply(_)));
    }
}
